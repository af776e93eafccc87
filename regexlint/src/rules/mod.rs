/*!
Lint rules built on [`crate::analysis`].

A [`Linter`] runs a set of [`Rule`]s over one regex literal and collects [`Diagnostic`]s. Spans are
byte ranges in the pattern source, i.e. [`Ast::source()`] without the surrounding `/` and flags.

## Example
```
use regexlint::rules::{Linter, NoDupeDisjunctions, NoEmptyCharacterClass};

let linter = Linter::builder()
    .rules(vec![
        Box::new(NoDupeDisjunctions::builder().report_subsets(true).build()),
        Box::new(NoEmptyCharacterClass),
    ])
    .build();
let diagnostics = linter.lint("/x[]|[a-z]|x/").unwrap();
let rules: Vec<_> = diagnostics.iter().map(|d| d.rule).collect();
assert_eq!(rules, ["no-empty-character-class", "no-dupe-disjunctions"]);
// `x` is a subset of `[a-z]`
assert_eq!(diagnostics[1].span, 10..11);
```
*/
use std::ops::Range;

use bon::Builder;

use crate::{
    analysis::Normalizer,
    syntax::{parse_literal, Ast, Flags, NodeKind, NodeRef, ParseError},
};

mod capture_refs;
mod no_dupe_disjunctions;
mod no_empty_character_class;
mod no_trivially_nested_quantifier;
mod no_unused_capturing_group;
mod no_useless_assertions;
mod no_useless_backreference;

pub use capture_refs::CaptureReferenceTable;
pub use no_dupe_disjunctions::NoDupeDisjunctions;
pub use no_empty_character_class::NoEmptyCharacterClass;
pub use no_trivially_nested_quantifier::NoTriviallyNestedQuantifier;
pub use no_unused_capturing_group::NoUnusedCapturingGroup;
pub use no_useless_assertions::NoUselessAssertions;
pub use no_useless_backreference::NoUselessBackreference;

/// A lint rule.
pub trait Rule {
    /// The rule name, e.g. `no-dupe-disjunctions`.
    fn name(&self) -> &'static str;

    /// Check one pattern and report through [`RuleContext::report()`].
    fn check(&self, cx: &mut RuleContext<'_>);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: &'static str,
    pub message: String,
    pub span: Range<usize>,
    pub fix: Option<Fix>,
}

/// A replacement of `span` in the pattern source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fix {
    pub span: Range<usize>,
    pub replacement: String,
}

impl Fix {
    pub fn new(span: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn remove(span: Range<usize>) -> Self {
        Self::new(span, "")
    }

    pub fn apply(&self, source: &str) -> String {
        let mut fixed = String::with_capacity(source.len() + self.replacement.len());
        fixed.push_str(&source[..self.span.start]);
        fixed.push_str(&self.replacement);
        fixed.push_str(&source[self.span.end..]);
        fixed
    }
}

/// What a rule sees of the pattern being linted.
pub struct RuleContext<'a> {
    ast: &'a Ast,
    normalizer: Normalizer<'a>,
    captures: Option<&'a CaptureReferenceTable>,
    rule: &'static str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RuleContext<'a> {
    fn new(ast: &'a Ast, captures: Option<&'a CaptureReferenceTable>) -> Self {
        Self {
            ast,
            normalizer: Normalizer::new(ast.flags()),
            captures,
            rule: "",
            diagnostics: Vec::new(),
        }
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    pub fn flags(&self) -> Flags {
        self.ast.flags()
    }

    /// Shared by all rules run on this pattern.
    pub fn normalizer(&self) -> &Normalizer<'a> {
        &self.normalizer
    }

    /// How the capturing groups are used outside of the pattern, if known.
    pub fn captures(&self) -> Option<&'a CaptureReferenceTable> {
        self.captures
    }

    pub fn report(&mut self, node: NodeRef<'_>, message: impl Into<String>, fix: Option<Fix>) {
        let message = message.into();
        log::trace!("{}: {node:?}: {message}", self.rule);
        self.diagnostics.push(Diagnostic {
            rule: self.rule,
            message,
            span: node.span(),
            fix,
        });
    }
}

/// A fix removing an alternative of a pattern, group or lookaround together with one adjacent `|`.
pub(crate) fn remove_alternative(alternative: NodeRef<'_>) -> Option<Fix> {
    let parent = alternative.parent()?;
    let siblings: Vec<_> = parent.alternatives().collect();
    let i = siblings.iter().position(|&a| a == alternative)?;
    let span = alternative.span();
    match i {
        0 => siblings
            .get(1)
            .map(|next| Fix::remove(span.start..next.span().start)),
        _ => Some(Fix::remove(siblings[i - 1].span().end..span.end)),
    }
}

/// Whether `node` or one of its descendants is a capturing group.
pub(crate) fn has_capturing_group(node: NodeRef<'_>) -> bool {
    node.descendants()
        .iter()
        .any(|n| matches!(n.kind(), NodeKind::CapturingGroup { .. }))
}

#[derive(Builder)]
pub struct Linter {
    #[builder(default = Linter::default_rules())]
    rules: Vec<Box<dyn Rule>>,
}

impl Linter {
    /// All rules with their default options.
    pub fn all() -> Self {
        Self::builder().build()
    }

    fn default_rules() -> Vec<Box<dyn Rule>> {
        vec![
            Box::new(NoDupeDisjunctions::default()),
            Box::new(NoEmptyCharacterClass),
            Box::new(NoTriviallyNestedQuantifier),
            Box::new(NoUnusedCapturingGroup),
            Box::new(NoUselessAssertions),
            Box::new(NoUselessBackreference),
        ]
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name())
    }

    /// Parse and lint a literal like `/a|b/u`.
    pub fn lint(&self, literal: &str) -> Result<Vec<Diagnostic>, ParseError> {
        let ast = parse_literal(literal)?;
        Ok(self.lint_ast(&ast, None))
    }

    /// Lint a parsed pattern. Diagnostics are ordered by position.
    pub fn lint_ast<'a>(
        &self,
        ast: &'a Ast,
        captures: Option<&'a CaptureReferenceTable>,
    ) -> Vec<Diagnostic> {
        let mut cx = RuleContext::new(ast, captures);
        for rule in &self.rules {
            cx.rule = rule.name();
            let before = cx.diagnostics.len();
            rule.check(&mut cx);
            log::debug!(
                "{ast:?}: {}: {} diagnostics",
                cx.rule,
                cx.diagnostics.len() - before
            );
        }
        let mut diagnostics = cx.diagnostics;
        diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
        diagnostics
    }
}
