use std::{cell::Cell, rc::Rc};

use bon::Builder;

use super::{
    equal::is_equal_nodes,
    normalize::{CNode, Normalizer},
};
use crate::syntax::{LookaroundKind, NodeRef};

/// Each comparison step consumes one unit. Running out makes the check answer "not covered".
const STEP_BUDGET: u32 = 10_000;

/// Recursion deeper than this makes the check answer "not covered". Only branching recurses,
/// plain elements are compared in a loop.
const MAX_DEPTH: u32 = 128;

#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoverOptions {
    /// Only require `left` to cover a prefix of every string of `right`, i.e. whatever follows
    /// in `right` after `left` is done may be ignored.
    #[builder(default)]
    pub can_omit_right: bool,
}

/// Whether every string matched by `right` is also matched by `left`.
///
/// The check is conservative: `false` means "not covered" or "could not tell". Opaque nodes
/// (assertions, backreferences) and negated lookarounds are only covered by equal nodes.
///
/// ## Example
/// ```
/// use regexlint::{
///     analysis::{is_covered_node, CoverOptions, Normalizer},
///     syntax::parse_literal,
/// };
///
/// let a = parse_literal("/[a-z]+/").unwrap();
/// let b = parse_literal("/x(?:y|z)/").unwrap();
/// let normalizer = Normalizer::new(a.flags());
/// assert!(is_covered_node(&normalizer, a.root(), b.root(), CoverOptions::default()));
/// assert!(!is_covered_node(&normalizer, b.root(), a.root(), CoverOptions::default()));
///
/// let prefix = CoverOptions::builder().can_omit_right(true).build();
/// let x = parse_literal("/x/").unwrap();
/// assert!(is_covered_node(&normalizer, x.root(), b.root(), prefix));
/// ```
pub fn is_covered_node<'a>(
    normalizer: &Normalizer<'a>,
    left: NodeRef<'a>,
    right: NodeRef<'a>,
    options: CoverOptions,
) -> bool {
    if is_equal_nodes(left, right, normalizer.flags(), None) {
        return true;
    }
    let cover = Cover {
        normalizer,
        fuel: Cell::new(STEP_BUDGET),
        depth: Cell::new(0),
    };
    let covered = cover.node(
        &normalizer.normalize(left),
        &normalizer.normalize(right),
        options.can_omit_right,
    );
    log::trace!(
        "{left:?} covers {right:?}: {covered} ({} steps)",
        STEP_BUDGET - cover.fuel.get()
    );
    covered
}

type Node<'a> = Rc<CNode<'a>>;

/// A sequence stored in reverse, so the head is the last item.
type Seq<'a> = Vec<Node<'a>>;

fn stack<'a>(node: &Node<'a>) -> Seq<'a> {
    let mut seq = node.sequence();
    seq.reverse();
    seq
}

/// Replace a head `Alternative` by its elements.
fn splice_head(seq: &mut Seq<'_>) {
    while let Some(head) = seq.last().cloned() {
        let CNode::Alternative(elements) = &*head else {
            break;
        };
        seq.pop();
        seq.extend(elements.iter().rev().cloned());
    }
}

fn push_optional<'a>(seq: &mut Seq<'a>, element: &Node<'a>, max: Option<u32>) {
    if max != Some(0) {
        seq.push(Rc::new(CNode::Optional {
            element: element.clone(),
            max,
        }));
    }
}

fn ge(a: Option<u32>, b: Option<u32>) -> bool {
    match (a, b) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(a), Some(b)) => a >= b,
    }
}

/// `a - b`, where `a` is at least `b`.
fn sub(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a - b),
        (Some(_), None) => unreachable!("finite minus infinite"),
        (None, _) => None,
    }
}

fn optional<'a>(node: &Node<'a>) -> Option<(Node<'a>, Option<u32>)> {
    match &**node {
        CNode::Optional { element, max } => Some((element.clone(), *max)),
        _ => None,
    }
}

struct Cover<'n, 'a> {
    normalizer: &'n Normalizer<'a>,
    fuel: Cell<u32>,
    depth: Cell<u32>,
}

struct DepthGuard<'c>(&'c Cell<u32>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl<'n, 'a> Cover<'n, 'a> {
    /// Nesting of [`Self::node()`] and [`Self::seq()`], limited to [`MAX_DEPTH`].
    fn enter(&self) -> Option<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            log::trace!("cover: depth limit reached");
            return None;
        }
        self.depth.set(depth + 1);
        Some(DepthGuard(&self.depth))
    }

    fn tick(&self) -> bool {
        match self.fuel.get() {
            0 => false,
            1 => {
                log::trace!("cover: step budget exhausted");
                self.fuel.set(0);
                false
            }
            fuel => {
                self.fuel.set(fuel - 1);
                true
            }
        }
    }

    fn node(&self, l: &Node<'a>, r: &Node<'a>, omit: bool) -> bool {
        let Some(_depth) = self.enter() else {
            return false;
        };
        if !self.tick() {
            return false;
        }
        match (&**l, &**r) {
            (_, CNode::Disjunction(alternatives)) => {
                alternatives.iter().all(|r| self.node(l, r, omit))
            }
            (CNode::Disjunction(alternatives), _) => {
                alternatives.iter().any(|l| self.node(l, r, omit))
            }
            (CNode::Alternative(_) | CNode::Optional { .. }, _)
            | (_, CNode::Alternative(_) | CNode::Optional { .. }) => {
                self.seq(stack(l), stack(r), omit)
            }
            (CNode::CharSet(a), CNode::CharSet(b)) => b.is_subset_of(a),
            (CNode::Other(a), CNode::Other(b)) => {
                is_equal_nodes(*a, *b, self.normalizer.flags(), None)
            }
            (
                CNode::Lookaround {
                    kind: lk,
                    negate: false,
                    node: ln,
                },
                CNode::Lookaround {
                    kind: rk,
                    negate: false,
                    node: rn,
                },
            ) if lk == rk => {
                let left = self.normalizer.lookaround_alternatives(*ln);
                let right = self.normalizer.lookaround_alternatives(*rn);
                // Whatever a lookahead sees after its content does not matter
                let omit = *lk == LookaroundKind::Lookahead;
                right
                    .iter()
                    .all(|r| left.iter().any(|l| self.node(l, r, omit)))
            }
            (CNode::Lookaround { node: a, .. }, CNode::Lookaround { node: b, .. }) => {
                is_equal_nodes(*a, *b, self.normalizer.flags(), None)
            }
            _ => false,
        }
    }

    fn seq(&self, mut l: Seq<'a>, mut r: Seq<'a>, omit: bool) -> bool {
        let Some(_depth) = self.enter() else {
            return false;
        };
        loop {
            if !self.tick() {
                return false;
            }
            if omit {
                // Trailing optionals of the left side can always match nothing
                let keep = l.iter().take_while(|n| n.is_optional()).count();
                l.drain(..keep);
            }
            splice_head(&mut l);
            splice_head(&mut r);

            let r_head = r.last().cloned();
            if let Some(CNode::Disjunction(alternatives)) = r_head.as_deref() {
                r.pop();
                return alternatives.iter().all(|a| {
                    let mut r = r.clone();
                    r.push(a.clone());
                    self.seq(l.clone(), r, omit)
                });
            }
            let l_head = l.last().cloned();
            if let Some(CNode::Disjunction(alternatives)) = l_head.as_deref() {
                l.pop();
                return alternatives.iter().any(|a| {
                    let mut l = l.clone();
                    l.push(a.clone());
                    self.seq(l, r.clone(), omit)
                });
            }

            let (Some(l_head), Some(r_head)) = (l_head, r_head) else {
                return if r.is_empty() {
                    l.iter().all(|n| n.is_optional())
                } else {
                    omit
                };
            };

            match (optional(&l_head), optional(&r_head)) {
                (Some((el, ml)), Some((er, mr))) => {
                    if self.node(&el, &er, false) {
                        let (mut l, mut r) = (l.clone(), r.clone());
                        l.pop();
                        r.pop();
                        if ge(ml, mr) {
                            push_optional(&mut l, &el, sub(ml, mr));
                        } else {
                            push_optional(&mut r, &er, sub(mr, ml));
                        }
                        if self.seq(l, r, omit) {
                            return true;
                        }
                    }
                    return self.unroll_right(l, r, &er, mr, omit);
                }
                (_, Some((er, mr))) => return self.unroll_right(l, r, &er, mr, omit),
                (Some((el, ml)), None) => {
                    l.pop();
                    if self.seq(l.clone(), r.clone(), omit) {
                        return true;
                    }
                    if el.can_be_empty() {
                        return false;
                    }
                    // Take one more repetition
                    push_optional(&mut l, &el, ml.map(|ml| ml - 1));
                    l.push(el);
                }
                (None, None) => {
                    l.pop();
                    r.pop();
                    if !self.node(&l_head, &r_head, false) {
                        return false;
                    }
                }
            }
        }
    }

    /// The right head `er{0,mr}` must be covered both when skipped and when taken once more.
    fn unroll_right(
        &self,
        l: Seq<'a>,
        mut r: Seq<'a>,
        er: &Node<'a>,
        mr: Option<u32>,
        omit: bool,
    ) -> bool {
        r.pop();
        if !self.seq(l.clone(), r.clone(), omit) {
            return false;
        }
        if er.can_be_empty() {
            return false;
        }
        push_optional(&mut r, er, mr.map(|mr| mr - 1));
        r.push(er.clone());
        self.seq(l, r, omit)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::{
        charset::to_char_set,
        syntax::{parse_literal, Ast},
    };

    fn parse_all(literals: &[&str]) -> Vec<Ast> {
        literals.iter().map(|l| parse_literal(l).unwrap()).collect()
    }

    fn covers(left: &str, right: &str) -> bool {
        let (l, r) = (parse_literal(left).unwrap(), parse_literal(right).unwrap());
        let normalizer = Normalizer::new(l.flags());
        is_covered_node(&normalizer, l.root(), r.root(), CoverOptions::default())
    }

    #[test]
    fn optional_backtracking() {
        assert!(covers("/a{2,4}/", "/(?:a{2})a?a?/"));
        assert!(covers("/(?:a{2})a?a?/", "/a{2,4}/"));
        assert!(!covers("/a{2,3}/", "/a{2,4}/"));
        assert!(covers("/a+/", "/a{2,3}/"));
        assert!(!covers("/a{2,3}/", "/a+/"));
        assert!(covers("/[ab]*c/", "/a?b?c/"));
        assert!(!covers("/a?b?c/", "/[ab]*c/"));
    }

    #[test]
    fn disjunctions() {
        assert!(covers("/a|b|c/", "/c|a/"));
        assert!(!covers("/c|a/", "/a|b|c/"));
        assert!(covers("/[a-c]/", "/a|b/"));
        assert!(covers("/(?:a|b)c/", "/ac/"));
        assert!(covers("/a(?:b|c)d/", "/abd|acd/"));
    }

    #[test]
    fn opaque() {
        assert!(covers(r"/^a/", r"/^a/"));
        assert!(covers(r"/^[ab]/", r"/^a/"));
        assert!(!covers(r"/a/", r"/^a/"));
        assert!(!covers(r"/^a/", r"/a/"));
        assert!(covers(r"/(?!a)x/", r"/(?!a)x/"));
        assert!(!covers(r"/(?![ab])x/", r"/(?!a)x/"));
    }

    #[test]
    fn lookaround() {
        assert!(covers("/(?=a)/", "/(?=ab)/"));
        assert!(!covers("/(?=ab)/", "/(?=a)/"));
        assert!(covers("/(?=[ab])/", "/(?=a|b)/"));
        assert!(!covers("/(?<=a)/", "/(?<=ba)/"));
        assert!(!covers("/(?=a)/", "/(?<=a)/"));
    }

    #[test]
    fn omit_right() {
        let l = parse_literal("/ab?/").unwrap();
        let r = parse_literal("/abc/").unwrap();
        let normalizer = Normalizer::new(l.flags());
        let options = CoverOptions::builder().can_omit_right(true).build();
        assert!(is_covered_node(&normalizer, l.root(), r.root(), options));
        assert!(!is_covered_node(&normalizer, l.root(), r.root(), CoverOptions::default()));
    }

    #[test]
    fn equal_implies_covered() {
        let asts = parse_all(&[
            "/a|b/",
            "/b|a/",
            "/(?:ab|c)d/",
            "/(?:c|ab)d/",
            r"/(a)\1/",
            r"/(?=a|b)x/",
            r"/(?!a)x/",
            "/[a-c]/",
            "/[abc]/",
            "/a{2,}/",
        ]);
        let normalizer = Normalizer::new(asts[0].flags());
        for (a, b) in asts.iter().cartesian_product(&asts) {
            if is_equal_nodes(a.root(), b.root(), a.flags(), None) {
                let options = CoverOptions::default();
                assert!(is_covered_node(&normalizer, a.root(), b.root(), options), "{a:?} {b:?}");
                assert!(is_covered_node(&normalizer, b.root(), a.root(), options), "{a:?} {b:?}");
            }
        }
    }

    #[test]
    fn char_subset() {
        let asts = parse_all(&["/a/", "/[ab]/", "/[a-z]/", r"/\w/", r"/\d/", "/[^a]/", "/./", "/[0-5]/"]);
        let normalizer = Normalizer::new(asts[0].flags());
        for (x, y) in asts.iter().cartesian_product(&asts) {
            let x_set = to_char_set(x.walk()[2], x.flags()).unwrap();
            let y_set = to_char_set(y.walk()[2], y.flags()).unwrap();
            assert_eq!(
                is_covered_node(&normalizer, x.root(), y.root(), CoverOptions::default()),
                y_set.is_subset_of(&x_set),
                "{x:?} {y:?}"
            );
        }
    }

    #[test]
    fn transitive() {
        let asts = parse_all(&[
            "/a/", "/[ab]/", "/a?/", "/a*/", "/a+/", "/a{2}/", "/a{1,2}/", "/[ab]*/", "/[ab]{2,}/",
        ]);
        let covered = |a: &Ast, b: &Ast| {
            let normalizer = Normalizer::new(a.flags());
            is_covered_node(&normalizer, a.root(), b.root(), CoverOptions::default())
        };
        for (a, b, c) in asts.iter().tuple_combinations() {
            for (a, b, c) in [(a, b, c), (a, c, b), (b, a, c), (b, c, a), (c, a, b), (c, b, a)] {
                if covered(a, b) && covered(b, c) {
                    assert!(covered(a, c), "{a:?} {b:?} {c:?}");
                }
            }
        }
        assert!(covered(&asts[7], &asts[6]));
    }

    #[test]
    fn small_stack() {
        // Backtracking over nested stars must not grow the native stack with the step budget
        let covered = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(|| {
                (
                    covers("/(?:[bc]?|a)*/", "/(?:[bc]*b)+b/"),
                    covers("/[abc]*/", "/(?:[bc]*b)+b/"),
                    covers("/(?:[bc]*b)+b/", "/[abc]*/"),
                )
            })
            .unwrap()
            .join()
            .unwrap();
        assert!(!covered.2);
    }

    #[test]
    fn long_sequences() {
        // Plain elements do not count towards the depth limit
        let long = format!("/{}/", "ab".repeat(500));
        assert!(covers(&long, &long.replace('b', "[b]")));
        assert!(covers(&format!("/{}[a-z]/", "ab".repeat(500)), &format!("/{}x/", "ab".repeat(500))));
        assert!(!covers(&format!("/{}x/", "ab".repeat(500)), &format!("/{}y/", "ab".repeat(500))));
    }

    #[test]
    fn budget() {
        let left = format!("/{}b/", "a?".repeat(40));
        let right = format!("/{}c/", "a?".repeat(40));
        assert!(!covers(&left, &right));
    }
}
