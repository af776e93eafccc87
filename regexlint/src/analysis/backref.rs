//! Static properties of backreferences.
//!
//! A backreference to a group that has not participated in the match matches the empty string, so
//! some backreferences can be shown to always match the empty string just from where they are.
use super::reach::{match_direction, Direction};
use crate::syntax::{Assertion, NodeKind, NodeRef};

/// The referenced group and the lowest common ancestor of it and the backreference.
fn group_and_ancestor<'a>(backref: NodeRef<'a>) -> Option<(NodeRef<'a>, NodeRef<'a>)> {
    let NodeKind::Backreference { resolved, .. } = backref.kind() else {
        panic!("not a backreference: {backref:?}");
    };
    let group = backref.get((*resolved)?);
    let ancestor = backref.ancestors().find(|a| *a == group || a.is_ancestor_of(group))?;
    Some((group, ancestor))
}

/// The child of `ancestor` that is or contains `node`.
fn child_towards<'a>(ancestor: NodeRef<'a>, node: NodeRef<'a>) -> Option<NodeRef<'a>> {
    std::iter::once(node)
        .chain(node.ancestors())
        .find(|n| n.parent() == Some(ancestor))
}

fn is_negated_lookaround(node: NodeRef<'_>) -> bool {
    matches!(
        node.kind(),
        NodeKind::Assertion(Assertion::Lookaround { negate: true, .. })
    )
}

/// Whether a backreference always matches the empty string.
///
/// That is the case if the backreference
/// - is inside the group it references,
/// - is in another alternative than the group,
/// - is matched before the group (forward references, and backward ones inside lookbehinds),
/// - or references a group inside a negated lookaround it is not part of.
///
/// ## Example
/// ```
/// use regexlint::{analysis::backref::is_empty_backreference, syntax::{parse_literal, NodeKind}};
///
/// let backref = |literal| {
///     let ast = parse_literal(literal).unwrap();
///     ast.walk().into_iter().any(|n| {
///         matches!(n.kind(), NodeKind::Backreference { .. }) && is_empty_backreference(n)
///     })
/// };
/// assert!(!backref(r"/(a)\1/"));
/// assert!(backref(r"/\1(a)/"));
/// assert!(backref(r"/(a\1)/"));
/// assert!(backref(r"/(a)|\1/"));
/// // Lookbehinds are matched right to left
/// assert!(backref(r"/(?<=(a)\1)b/"));
/// assert!(!backref(r"/(?<=\1(a))b/"));
/// assert!(backref(r"/(?!(a))\1/"));
/// ```
pub fn is_empty_backreference(backref: NodeRef<'_>) -> bool {
    let Some((group, ancestor)) = group_and_ancestor(backref) else {
        return true;
    };
    if ancestor == group {
        return true;
    }
    if ancestor.kind().alternatives().is_some() {
        return true;
    }
    if group
        .ancestors()
        .take_while(|a| *a != ancestor)
        .any(is_negated_lookaround)
    {
        return true;
    }

    let NodeKind::Alternative { elements } = ancestor.kind() else {
        return false;
    };
    let position = |node| {
        child_towards(ancestor, node).and_then(|child| elements.iter().position(|&e| e == child.id()))
    };
    match (position(backref), position(group)) {
        (Some(b), Some(g)) => match match_direction(ancestor) {
            Direction::Ltr => b < g,
            Direction::Rtl => b > g,
        },
        _ => false,
    }
}

/// Whether a backreference can only be reached after its group matched, i.e. it never falls back
/// to matching the empty string because its group did not participate.
///
/// ## Example
/// ```
/// use regexlint::{analysis::backref::is_strict_backreference, syntax::{parse_literal, NodeKind}};
///
/// let strict = |literal| {
///     let ast = parse_literal(literal).unwrap();
///     let n = ast.walk().into_iter().find(|n| matches!(n.kind(), NodeKind::Backreference { .. }));
///     is_strict_backreference(n.unwrap())
/// };
/// assert!(strict(r"/(a)\1/"));
/// assert!(strict(r"/(?:(a)b)+\1/"));
/// assert!(!strict(r"/(a)?\1/"));
/// assert!(!strict(r"/(?:(a)|b)\1/"));
/// ```
pub fn is_strict_backreference(backref: NodeRef<'_>) -> bool {
    if is_empty_backreference(backref) {
        return false;
    }
    let Some((group, ancestor)) = group_and_ancestor(backref) else {
        return false;
    };
    !group
        .ancestors()
        .take_while(|a| *a != ancestor)
        .any(|a| match a.kind() {
            NodeKind::Quantifier { min, .. } => *min == 0,
            NodeKind::Group { alternatives } | NodeKind::CapturingGroup { alternatives, .. } => {
                alternatives.len() > 1
            }
            NodeKind::Assertion(Assertion::Lookaround { alternatives, negate, .. }) => {
                *negate || alternatives.len() > 1
            }
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse_literal, Ast};

    fn backrefs(ast: &Ast) -> Vec<NodeRef<'_>> {
        ast.walk()
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Backreference { .. }))
            .collect()
    }

    fn empty(literal: &str) -> Vec<bool> {
        let ast = parse_literal(literal).unwrap();
        backrefs(&ast).into_iter().map(is_empty_backreference).collect()
    }

    fn strict(literal: &str) -> Vec<bool> {
        let ast = parse_literal(literal).unwrap();
        backrefs(&ast).into_iter().map(is_strict_backreference).collect()
    }

    #[test]
    fn nested() {
        assert_eq!(empty(r"/(a\1)/"), vec![true]);
        assert_eq!(empty(r"/(a(?:b|\1))/"), vec![true]);
    }

    #[test]
    fn alternatives() {
        assert_eq!(empty(r"/(a)|b\1/"), vec![true]);
        assert_eq!(empty(r"/(?:(a)|b)\1/"), vec![false]);
        assert_eq!(empty(r"/(?:(a)|(b))\1\2/"), vec![false, false]);
    }

    #[test]
    fn forward() {
        assert_eq!(empty(r"/\1(a)/"), vec![true]);
        assert_eq!(empty(r"/(?:\1(a))+/"), vec![true]);
        assert_eq!(empty(r"/(a)b\1/"), vec![false]);
    }

    #[test]
    fn lookbehind() {
        // Matched right to left
        assert_eq!(empty(r"/(?<=(a)\1)/"), vec![true]);
        assert_eq!(empty(r"/(?<=\1(a))/"), vec![false]);
        assert_eq!(empty(r"/(?<=(a))\1/"), vec![false]);
    }

    #[test]
    fn negated_lookaround() {
        assert_eq!(empty(r"/(?!(a))\1/"), vec![true]);
        assert_eq!(empty(r"/(?!(a)\1)/"), vec![false]);
        assert_eq!(empty(r"/(?=(a))\1/"), vec![false]);
    }

    #[test]
    fn strictness() {
        assert_eq!(strict(r"/(a)\1/"), vec![true]);
        assert_eq!(strict(r"/(a)*\1/"), vec![false]);
        assert_eq!(strict(r"/(?:(a)|b)\1/"), vec![false]);
        assert_eq!(strict(r"/(?:x(a)){2}\1/"), vec![true]);
        assert_eq!(strict(r"/\1(a)/"), vec![false]);
    }
}
