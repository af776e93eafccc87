/*!
ECMAScript regular expression syntax: [`Flags`], the [`Ast`] arena and its parser.

The analysis in [`crate::analysis`] only ever reads an [`Ast`]; it never builds nodes itself.

## Example
```
use regexlint::syntax::{parse_literal, NodeKind};

let ast = parse_literal("/(?<year>\\d{4})-\\k<year>/u").unwrap();
assert!(ast.flags().unicode);
let group = ast.capturing_groups()[0];
assert_eq!(group.raw(), "(?<year>\\d{4})");
assert!(matches!(group.kind(), NodeKind::CapturingGroup { index: 1, .. }));
```
*/
use thiserror::Error;

pub mod ast;
mod flags;
mod parser;

pub use ast::{
    Assertion, Ast, AstId, CharacterSet, GroupRef, LookaroundKind, Node, NodeId, NodeKey,
    NodeKind, NodeRef,
};
pub use flags::Flags;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid regular expression: {message} at offset {offset}")]
pub struct ParseError {
    /// Byte offset in the pattern source (or in the flags, for flag errors).
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Parse a regular expression literal like `/ab+c/gi`.
pub fn parse_literal(literal: &str) -> Result<Ast, ParseError> {
    let body = literal
        .strip_prefix('/')
        .ok_or_else(|| ParseError::new(0, "regular expression literal must start with '/'"))?;
    let end = body
        .rfind('/')
        .ok_or_else(|| ParseError::new(literal.len(), "unterminated regular expression literal"))?;
    let flags = body[end + 1..].parse()?;
    Ast::parse(&body[..end], flags)
}
