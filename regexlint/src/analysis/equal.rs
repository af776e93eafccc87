use regexlint_unicode::case::CharToCanonical;

use super::classify::{classify, NodeCategory};
use crate::{
    charset::to_char_set,
    syntax::{Assertion, Flags, NodeId, NodeKind, NodeRef},
};

/// A rule-specific override of [`is_equal_nodes()`] for a pair of nodes.
///
/// `Some(verdict)` decides the pair, `None` falls through to the structural comparison.
pub type ShortCircuit<'s> = dyn Fn(NodeRef<'_>, NodeRef<'_>) -> Option<bool> + 's;

/// Whether two nodes always match the same strings, interpreted under `flags`.
///
/// Nodes of different kinds are never equal, except that two character-like nodes are equal when
/// they match the same set of characters. Alternatives of groups are compared as multisets.
///
/// ## Example
/// ```
/// use regexlint::{
///     analysis::is_equal_nodes,
///     syntax::{parse_literal, Flags, NodeKind, NodeRef},
/// };
///
/// let a = parse_literal("/(?:a|[bB]|c)/i").unwrap();
/// let b = parse_literal("/(?:c|b|a)/i").unwrap();
/// assert!(is_equal_nodes(a.root(), b.root(), a.flags(), None));
///
/// // Capturing groups with different names, equal by a relaxation
/// let a = parse_literal("/(?<x>a)/").unwrap();
/// let b = parse_literal("/(?<y>[a])/").unwrap();
/// assert!(!is_equal_nodes(a.root(), b.root(), a.flags(), None));
/// let ignore_names = |x: NodeRef<'_>, y: NodeRef<'_>| match (x.kind(), y.kind()) {
///     (
///         NodeKind::CapturingGroup { alternatives: xs, .. },
///         NodeKind::CapturingGroup { alternatives: ys, .. },
///     ) => Some(
///         xs.len() == ys.len()
///             && xs.iter().zip(ys).all(|(&i, &j)| {
///                 is_equal_nodes(x.get(i), y.get(j), Flags::default(), None)
///             }),
///     ),
///     _ => None,
/// };
/// assert!(is_equal_nodes(a.root(), b.root(), a.flags(), Some(&ignore_names)));
/// ```
pub fn is_equal_nodes(
    a: NodeRef<'_>,
    b: NodeRef<'_>,
    flags: Flags,
    short_circuit: Option<&ShortCircuit<'_>>,
) -> bool {
    // `\1` is a backreference or an octal escape depending on the group count, so equal raw
    // text says nothing once either side may hold one
    let raw_equality = !has_backreference(a) && !has_backreference(b);
    equal_nodes(a, b, flags, short_circuit, raw_equality)
}

fn equal_nodes(
    a: NodeRef<'_>,
    b: NodeRef<'_>,
    flags: Flags,
    short_circuit: Option<&ShortCircuit<'_>>,
    raw_equality: bool,
) -> bool {
    if let Some(verdict) = short_circuit.and_then(|f| f(a, b)) {
        return verdict;
    }

    if classify(a) == NodeCategory::CharacterLike && classify(b) == NodeCategory::CharacterLike {
        return is_equal_char_like(a, b, flags);
    }

    if raw_equality && a.raw() == b.raw() && a.kind().name() == b.kind().name() {
        return true;
    }

    let eq = |x, y| equal_nodes(x, y, flags, short_circuit, raw_equality);
    let eq_seq = |xs: &[NodeId], ys: &[NodeId]| {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(&x, &y)| eq(a.get(x), b.get(y)))
    };
    let eq_set = |xs: &[NodeId], ys: &[NodeId]| {
        is_equal_multiset(
            xs.iter().map(|&x| a.get(x)),
            ys.iter().map(|&y| b.get(y)),
            &eq,
        )
    };

    match (a.kind(), b.kind()) {
        (NodeKind::Alternative { elements: x }, NodeKind::Alternative { elements: y })
        | (NodeKind::StringAlternative { elements: x }, NodeKind::StringAlternative { elements: y }) => {
            eq_seq(x, y)
        }
        (NodeKind::Pattern { alternatives: x }, NodeKind::Pattern { alternatives: y })
        | (NodeKind::Group { alternatives: x }, NodeKind::Group { alternatives: y })
        | (
            NodeKind::ClassStringDisjunction { alternatives: x },
            NodeKind::ClassStringDisjunction { alternatives: y },
        ) => eq_set(x, y),
        (
            NodeKind::CapturingGroup {
                name: name_a,
                alternatives: x,
                ..
            },
            NodeKind::CapturingGroup {
                name: name_b,
                alternatives: y,
                ..
            },
        ) => name_a == name_b && eq_set(x, y),
        (
            NodeKind::Quantifier {
                min: min_a,
                max: max_a,
                greedy: greedy_a,
                element: x,
            },
            NodeKind::Quantifier {
                min: min_b,
                max: max_b,
                greedy: greedy_b,
                element: y,
            },
        ) => min_a == min_b && max_a == max_b && greedy_a == greedy_b && eq(a.get(*x), b.get(*y)),
        (NodeKind::Assertion(x), NodeKind::Assertion(y)) => match (x, y) {
            (Assertion::Start, Assertion::Start) | (Assertion::End, Assertion::End) => true,
            (Assertion::Word { negate: x }, Assertion::Word { negate: y }) => x == y,
            (
                Assertion::Lookaround {
                    kind: kind_a,
                    negate: negate_a,
                    alternatives: x,
                },
                Assertion::Lookaround {
                    kind: kind_b,
                    negate: negate_b,
                    alternatives: y,
                },
            ) => kind_a == kind_b && negate_a == negate_b && eq_set(x, y),
            _ => false,
        },
        (NodeKind::Backreference { resolved: x, .. }, NodeKind::Backreference { resolved: y, .. }) => {
            if a.ast().id() == b.ast().id() {
                x.is_some() && x == y
            } else {
                a.raw() == b.raw()
            }
        }
        _ => false,
    }
}

fn is_equal_char_like(a: NodeRef<'_>, b: NodeRef<'_>, flags: Flags) -> bool {
    match (a.kind(), b.kind()) {
        (NodeKind::Character { value: x }, NodeKind::Character { value: y }) => {
            if x == y {
                return true;
            }
            if flags.ignore_case && !flags.is_unicode_mode() {
                if let (Some(x), Some(y)) = (char::from_u32(*x), char::from_u32(*y)) {
                    return x.eq_canonical(y);
                }
            }
        }
        (NodeKind::CharacterSet(x), NodeKind::CharacterSet(y)) if x == y => return true,
        _ => {}
    }
    match (to_char_set(a, flags), to_char_set(b, flags)) {
        (Some(x), Some(y)) => x == y,
        _ => a.raw() == b.raw() && a.kind().name() == b.kind().name(),
    }
}

/// Every element of `xs` pairs with a distinct equal element of `ys`.
fn is_equal_multiset<'x, 'y>(
    xs: impl ExactSizeIterator<Item = NodeRef<'x>>,
    ys: impl ExactSizeIterator<Item = NodeRef<'y>>,
    eq: &dyn Fn(NodeRef<'x>, NodeRef<'y>) -> bool,
) -> bool {
    if xs.len() != ys.len() {
        return false;
    }
    let mut ys: Vec<Option<NodeRef<'y>>> = ys.map(Some).collect();
    xs.into_iter().all(|x| {
        match ys.iter_mut().find(|y| y.is_some_and(|y| eq(x, y))) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    })
}

fn has_backreference(node: NodeRef<'_>) -> bool {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if matches!(node.kind(), NodeKind::Backreference { .. }) {
            return true;
        }
        stack.extend(node.children());
    }
    false
}
