use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::classify::{classify, NodeCategory};
use crate::{
    charset::{to_char_set, CharSet},
    syntax::{Assertion, Flags, LookaroundKind, NodeKey, NodeKind, NodeRef},
};

/// Quantifiers that would unroll into a longer sequence are not unrolled and stay
/// [`CNode::Other`]. Nested quantifiers multiply, so this bounds the sequence, not the minimum.
const MAX_UNROLL: u64 = 1 << 10;

/// The canonical form of a node.
///
/// `Alternative` and `Disjunction` never have exactly one child: a singleton collapses into its
/// child.
#[derive(Debug)]
pub enum CNode<'a> {
    /// Not reasoned about beyond structural equality.
    Other(NodeRef<'a>),
    CharSet(CharSet),
    /// A concatenation. Never contains another `Alternative`.
    Alternative(Vec<Rc<CNode<'a>>>),
    /// A choice. The order of the alternatives is not significant for equality.
    Disjunction(Vec<Rc<CNode<'a>>>),
    /// The alternatives are normalized on demand by [`Normalizer::lookaround_alternatives()`].
    Lookaround {
        kind: LookaroundKind,
        negate: bool,
        node: NodeRef<'a>,
    },
    /// Zero to `max` more repetitions of `element`. `None` is unbounded.
    Optional { element: Rc<CNode<'a>>, max: Option<u32> },
}

impl<'a> CNode<'a> {
    pub fn is_optional(&self) -> bool {
        matches!(self, CNode::Optional { .. })
    }

    /// The elements of this node as a sequence: the children of an `Alternative`, or the node
    /// itself.
    pub fn sequence(self: &Rc<Self>) -> Vec<Rc<CNode<'a>>> {
        match &**self {
            CNode::Alternative(elements) => elements.clone(),
            _ => vec![self.clone()],
        }
    }

    /// Length of [`Self::sequence()`].
    pub fn sequence_len(&self) -> usize {
        match self {
            CNode::Alternative(elements) => elements.len(),
            _ => 1,
        }
    }

    /// Whether this node may match the empty string, conservatively `true` for `Other`.
    pub fn can_be_empty(&self) -> bool {
        match self {
            CNode::Other(_) | CNode::Lookaround { .. } | CNode::Optional { .. } => true,
            CNode::CharSet(_) => false,
            CNode::Alternative(elements) => elements.iter().all(|e| e.can_be_empty()),
            CNode::Disjunction(alternatives) => alternatives.iter().any(|a| a.can_be_empty()),
        }
    }
}

/// Build `element` repeated `count` times followed by `tail`, flattened and collapsed.
pub(crate) fn repeat<'a>(
    element: &Rc<CNode<'a>>,
    count: u32,
    tail: Option<Rc<CNode<'a>>>,
) -> Rc<CNode<'a>> {
    let mut items = Vec::new();
    for _ in 0..count {
        items.extend(element.sequence());
    }
    items.extend(tail);
    alternative(items)
}

fn alternative(mut items: Vec<Rc<CNode<'_>>>) -> Rc<CNode<'_>> {
    match items.len() {
        1 => items.swap_remove(0),
        _ => Rc::new(CNode::Alternative(items)),
    }
}

/// Canonical forms of nodes, memoized per node.
///
/// Nodes from different [`Ast`](crate::syntax::Ast)s can share one normalizer, which then
/// interprets all of them under its flags.
pub struct Normalizer<'a> {
    flags: Flags,
    cache: RefCell<HashMap<NodeKey, Rc<CNode<'a>>>>,
}

impl<'a> Normalizer<'a> {
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            cache: Default::default(),
        }
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn normalize(&self, node: NodeRef<'a>) -> Rc<CNode<'a>> {
        if let Some(cached) = self.cache.borrow().get(&node.key()) {
            return cached.clone();
        }
        let normalized = self.normalize_uncached(node);
        self.cache
            .borrow_mut()
            .entry(node.key())
            .or_insert(normalized)
            .clone()
    }

    /// The normalized alternatives of a lookaround, or of any node with alternatives.
    pub fn lookaround_alternatives(&self, node: NodeRef<'a>) -> Vec<Rc<CNode<'a>>> {
        node.alternatives().map(|a| self.normalize(a)).collect()
    }

    fn normalize_uncached(&self, node: NodeRef<'a>) -> Rc<CNode<'a>> {
        match classify(node) {
            NodeCategory::CharacterLike => {
                return Rc::new(match to_char_set(node, self.flags) {
                    Some(set) => CNode::CharSet(set),
                    None => CNode::Other(node),
                })
            }
            NodeCategory::Opaque => return Rc::new(CNode::Other(node)),
            _ => {}
        }
        match node.kind() {
            NodeKind::Alternative { .. } => {
                let items = node
                    .elements()
                    .flat_map(|e| self.normalize(e).sequence())
                    .collect();
                alternative(items)
            }
            NodeKind::Quantifier {
                min, max, element, ..
            } => {
                if *max == Some(0) || u64::from(*min) > MAX_UNROLL {
                    return Rc::new(CNode::Other(node));
                }
                let element = self.normalize(node.get(*element));
                if u64::from(*min) * element.sequence_len() as u64 > MAX_UNROLL {
                    log::trace!("{node:?}: too long to unroll");
                    return Rc::new(CNode::Other(node));
                }
                let tail = match *max {
                    Some(max) if max == *min => None,
                    max => Some(Rc::new(CNode::Optional {
                        element: element.clone(),
                        max: max.map(|max| max - *min),
                    })),
                };
                repeat(&element, *min, tail)
            }
            NodeKind::Pattern { .. } | NodeKind::Group { .. } | NodeKind::CapturingGroup { .. } => {
                let mut alternatives = self.lookaround_alternatives(node);
                match alternatives.len() {
                    1 => alternatives.swap_remove(0),
                    _ => Rc::new(CNode::Disjunction(alternatives)),
                }
            }
            NodeKind::Assertion(Assertion::Lookaround { kind, negate, .. }) => {
                Rc::new(CNode::Lookaround {
                    kind: *kind,
                    negate: *negate,
                    node,
                })
            }
            // `\q{..}` with strings and other nodes only found in classes
            _ => Rc::new(CNode::Other(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_literal;

    fn shape(node: &CNode<'_>) -> String {
        match node {
            CNode::Other(n) => format!("Other({})", n.raw()),
            CNode::CharSet(set) => format!("{set:?}"),
            CNode::Alternative(items) => items.iter().map(|i| shape(i)).collect::<Vec<_>>().join(""),
            CNode::Disjunction(alts) => {
                format!("({})", alts.iter().map(|a| shape(a)).collect::<Vec<_>>().join("|"))
            }
            CNode::Lookaround { node, .. } => format!("Look({})", node.raw()),
            CNode::Optional { element, max } => match max {
                Some(max) => format!("{}{{0,{max}}}", shape(element)),
                None => format!("{}*", shape(element)),
            },
        }
    }

    fn normalized(literal: &str) -> String {
        let ast = parse_literal(literal).unwrap();
        let normalizer = Normalizer::new(ast.flags());
        shape(&normalizer.normalize(ast.root()))
    }

    #[test]
    fn collapse() {
        assert_eq!(normalized("/a/"), "[a]");
        assert_eq!(normalized("/(?:(a))/"), "[a]");
        assert_eq!(normalized("/[aA]/i"), normalized("/a/i"));
        assert_eq!(normalized("/a|b/"), "([a]|[b])");
        assert_eq!(normalized("/ab(?:cd)/"), "[a][b][c][d]");
        assert_eq!(normalized("/(?:)/"), "");
    }

    #[test]
    fn quantifiers() {
        assert_eq!(normalized("/a{2,4}/"), "[a][a][a]{0,2}");
        assert_eq!(normalized("/a{3}/"), "[a][a][a]");
        assert_eq!(normalized("/a?/"), "[a]{0,1}");
        assert_eq!(normalized("/a+/"), "[a][a]*");
        assert_eq!(normalized("/(?:ab){2}/"), "[a][b][a][b]");
        assert_eq!(normalized("/a{0}/"), "Other(a{0})");
        assert_eq!(normalized("/(?:a{2})a?a?/"), "[a][a][a]{0,1}[a]{0,1}");
    }

    #[test]
    fn unroll_limit() {
        assert_eq!(normalized("/a{1024}/"), "[a]".repeat(1024));
        assert_eq!(normalized("/a{1025}/"), "Other(a{1025})");
        assert_eq!(normalized("/(?:ab){600}/"), "Other((?:ab){600})");
        assert_eq!(normalized("/(?:ab){512,}/"), format!("{}[a][b]*", "[a][b]".repeat(512)));

        // The middle quantifier would unroll to a million elements
        let ast = parse_literal("/(?:(?:a{1000}){1000}){1000}/").unwrap();
        let normalizer = Normalizer::new(ast.flags());
        let CNode::Alternative(items) = &*normalizer.normalize(ast.root()) else {
            panic!();
        };
        assert_eq!(items.len(), 1000);
        assert!(matches!(&*items[0], CNode::Other(n) if n.raw() == "(?:a{1000}){1000}"));
        assert!(items.iter().all(|i| Rc::ptr_eq(i, &items[0])));
    }

    #[test]
    fn opaque() {
        assert_eq!(normalized(r"/^\b$/"), r"Other(^)Other(\b)Other($)");
        assert_eq!(normalized(r"/(a)\1/"), r"[a]Other(\1)");
        assert_eq!(normalized(r"/(?=a)/"), "Look((?=a))");
        assert_eq!(normalized(r"/\uD800/"), r"Other(\uD800)");
    }

    #[test]
    fn memoized() {
        let ast = parse_literal("/a(?:b|c)/").unwrap();
        let normalizer = Normalizer::new(ast.flags());
        let first = normalizer.normalize(ast.root());
        let second = normalizer.normalize(ast.root());
        assert!(Rc::ptr_eq(&first, &second));

        let group = ast.walk()[3];
        assert!(Rc::ptr_eq(&normalizer.normalize(group), &normalizer.normalize(group)));
    }

    #[test]
    fn can_be_empty() {
        let ast = parse_literal("/a?(?:b|)c/").unwrap();
        let normalizer = Normalizer::new(ast.flags());
        let CNode::Alternative(items) = &*normalizer.normalize(ast.root()) else {
            panic!();
        };
        let empty: Vec<_> = items.iter().map(|i| i.can_be_empty()).collect();
        assert_eq!(empty, vec![true, true, false]);
    }
}
