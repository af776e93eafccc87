use crate::syntax::{Assertion, NodeKind, NodeRef};

/// The semantic category of a node, which decides how the analysis treats it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Matches exactly one character from a set: characters, classes, ranges, `\d`, `.`, etc.
    CharacterLike,
    /// A concatenation: [`NodeKind::Alternative`] and [`NodeKind::StringAlternative`].
    Sequence,
    /// A choice between alternatives: patterns, groups and `\q{..}`.
    AlternativeLike,
    Quantified,
    /// Lookahead or lookbehind.
    Lookaround,
    /// `^`, `$`, `\b`, `\B` and backreferences. Only compared structurally.
    Opaque,
}

pub fn classify(node: NodeRef<'_>) -> NodeCategory {
    match node.kind() {
        NodeKind::Character { .. }
        | NodeKind::CharacterClassRange { .. }
        | NodeKind::CharacterSet(_)
        | NodeKind::CharacterClass { .. }
        | NodeKind::ExpressionCharacterClass { .. }
        | NodeKind::ClassIntersection { .. }
        | NodeKind::ClassSubtraction { .. } => NodeCategory::CharacterLike,
        NodeKind::Alternative { .. } | NodeKind::StringAlternative { .. } => NodeCategory::Sequence,
        NodeKind::Pattern { .. }
        | NodeKind::Group { .. }
        | NodeKind::CapturingGroup { .. }
        | NodeKind::ClassStringDisjunction { .. } => NodeCategory::AlternativeLike,
        NodeKind::Quantifier { .. } => NodeCategory::Quantified,
        NodeKind::Assertion(Assertion::Lookaround { .. }) => NodeCategory::Lookaround,
        NodeKind::Assertion(_) | NodeKind::Backreference { .. } => NodeCategory::Opaque,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_literal;

    #[test]
    fn categories() {
        let ast = parse_literal(r"/a[b-c]\d(?:x|y)(z)+(?=w)^\1/").unwrap();
        let categories: Vec<_> = ast.root().alternatives().next().unwrap().elements().map(classify).collect();
        assert_eq!(
            categories,
            vec![
                NodeCategory::CharacterLike,
                NodeCategory::CharacterLike,
                NodeCategory::CharacterLike,
                NodeCategory::AlternativeLike,
                NodeCategory::Quantified,
                NodeCategory::Lookaround,
                NodeCategory::Opaque,
                NodeCategory::Opaque,
            ]
        );
        assert_eq!(classify(ast.root()), NodeCategory::AlternativeLike);
        assert_eq!(classify(ast.walk()[1]), NodeCategory::Sequence);
    }
}
