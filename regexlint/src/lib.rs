/*!
Static analysis and lint rules for ECMAScript regular expression literals.

## Features
- A [parser](syntax) for ECMAScript regular expressions, including the `v` flag and the Annex B
  extensions, into an immutable node arena.
- [Character sets](charset) with ECMAScript semantics: `\s`, `\w`, `.`, `\p{..}` and case folding
  in both Unicode and non-Unicode mode.
- The [analysis] core:
  - a canonical normalizer that maps groups, quantifiers and classes onto a few comparable shapes;
  - semantic [equivalence](analysis::is_equal_nodes) and [coverage](analysis::is_covered_node) of
    two subexpressions;
  - [directional reachability](analysis::reach), i.e. which characters can appear right before or
    after a node;
  - [nested quantifier arithmetic](analysis::quant).
- A set of [lint rules](rules) built on top of it.

## Usage
```
use regexlint::rules::Linter;

let linter = Linter::all();
let diagnostics = linter.lint("/a|b|a/").unwrap();
assert_eq!(diagnostics.len(), 1);
assert_eq!(diagnostics[0].rule, "no-dupe-disjunctions");
assert_eq!(diagnostics[0].fix.as_ref().unwrap().apply("a|b|a"), "a|b");
```

The analysis can also be used directly:
```
use regexlint::{analysis::{is_covered_node, CoverOptions, Normalizer}, syntax::parse_literal};

let wide = parse_literal("/a{2,4}/").unwrap();
let narrow = parse_literal("/(?:a{2})a?/").unwrap();
let normalizer = Normalizer::new(wide.flags());
assert!(is_covered_node(&normalizer, wide.root(), narrow.root(), CoverOptions::default()));
assert!(!is_covered_node(&normalizer, narrow.root(), wide.root(), CoverOptions::default()));
```
*/
//! ## Crate features
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

pub mod analysis;
pub mod charset;
pub mod rules;
pub mod syntax;

pub use regexlint_unicode as unicode;
