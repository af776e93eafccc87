/*!
Directional reachability: which characters a node consumes first, and which characters can
appear right before or after a node.

Directions are string directions. [`Direction::Ltr`] looks at what comes after a position,
[`Direction::Rtl`] at what comes before it. A lookbehind is matched right to left.

## Example
```
use regexlint::{
    analysis::reach::{first_char_after, Direction},
    charset::word_char_set,
    syntax::{parse_literal, NodeKind},
};

let ast = parse_literal(r"/ \b /").unwrap();
let b = ast.walk().into_iter().find(|n| matches!(n.kind(), NodeKind::Assertion(_))).unwrap();
let word = word_char_set(ast.flags());
for direction in [Direction::Ltr, Direction::Rtl] {
    let around = first_char_after(b, direction, ast.flags());
    assert!(around.exact && !around.edge);
    assert!(around.char.is_disjoint_with(&word));
}
```
*/
use std::iter;

use itertools::Either;

use super::{
    backref::{is_empty_backreference, is_strict_backreference},
    classify::{classify, NodeCategory},
};
use crate::{
    charset::{to_char_set, CharSet},
    syntax::{Assertion, Flags, LookaroundKind, NodeKind, NodeRef},
};
use regexlint_unicode::class::LINE_TERMINATOR;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right, i.e. towards the end of the input.
    Ltr,
    /// Right to left, i.e. towards the start of the input.
    Rtl,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Ltr => Direction::Rtl,
            Direction::Rtl => Direction::Ltr,
        }
    }
}

impl From<LookaroundKind> for Direction {
    fn from(kind: LookaroundKind) -> Self {
        match kind {
            LookaroundKind::Lookahead => Direction::Ltr,
            LookaroundKind::Lookbehind => Direction::Rtl,
        }
    }
}

/// The direction a node is matched in: right to left inside lookbehinds.
pub fn match_direction(node: NodeRef<'_>) -> Direction {
    iter::once(node)
        .chain(node.ancestors())
        .find_map(|n| match n.kind() {
            NodeKind::Assertion(Assertion::Lookaround { kind, .. }) => Some(Direction::from(*kind)),
            _ => None,
        })
        .unwrap_or(Direction::Ltr)
}

/// The character following a position, as seen by an assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirstLookChar {
    /// The characters that may follow.
    pub char: CharSet,
    /// Whether `char` is exact. Otherwise it is a superset.
    pub exact: bool,
    /// Whether the edge of the input may follow.
    pub edge: bool,
}

impl FirstLookChar {
    /// Anything may follow.
    pub fn all() -> Self {
        Self {
            char: CharSet::all(),
            exact: true,
            edge: true,
        }
    }

    /// Only the edge of the input may follow.
    pub fn edge() -> Self {
        Self {
            char: CharSet::empty(),
            exact: true,
            edge: true,
        }
    }

    /// A constraint that cannot be described, e.g. of an assertion looking the other way.
    fn unknown() -> Self {
        Self {
            char: CharSet::all(),
            exact: false,
            edge: true,
        }
    }

    pub fn is_edge(&self) -> bool {
        self.edge && self.char.is_empty()
    }
}

/// The characters a node consumes first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FirstConsumedChar {
    /// The node always consumes a character, one of `char`.
    NonEmpty { char: CharSet, exact: bool },
    /// The node may also match the empty string, after which `look` has to hold.
    Empty {
        char: CharSet,
        exact: bool,
        look: FirstLookChar,
    },
}

impl FirstConsumedChar {
    /// Matches only the empty string.
    pub fn empty(look: FirstLookChar) -> Self {
        FirstConsumedChar::Empty {
            char: CharSet::empty(),
            exact: true,
            look,
        }
    }

    pub fn char(&self) -> &CharSet {
        match self {
            FirstConsumedChar::NonEmpty { char, .. } | FirstConsumedChar::Empty { char, .. } => char,
        }
    }

    pub fn exact(&self) -> bool {
        match self {
            FirstConsumedChar::NonEmpty { exact, .. } | FirstConsumedChar::Empty { exact, .. } => {
                *exact
            }
        }
    }

    pub fn can_be_empty(&self) -> bool {
        matches!(self, FirstConsumedChar::Empty { .. })
    }

    /// Concatenation. Stops at the first item that is not empty, so `items` can be lazy.
    pub fn concat(items: impl IntoIterator<Item = FirstConsumedChar>) -> FirstConsumedChar {
        let mut char = CharSet::empty();
        let mut exact = true;
        let mut look = FirstLookChar::all();
        for item in items {
            match item {
                FirstConsumedChar::NonEmpty {
                    char: item_char,
                    exact: item_exact,
                } => {
                    return FirstConsumedChar::NonEmpty {
                        char: char.union(&item_char.intersect(&look.char)),
                        exact: exact && item_exact && look.exact,
                    };
                }
                FirstConsumedChar::Empty {
                    char: item_char,
                    exact: item_exact,
                    look: item_look,
                } => {
                    char = char.union(&item_char.intersect(&look.char));
                    exact = exact && item_exact && look.exact;
                    look = FirstLookChar {
                        char: look.char.intersect(&item_look.char),
                        exact: look.exact && item_look.exact,
                        edge: look.edge && item_look.edge,
                    };
                }
            }
        }
        FirstConsumedChar::Empty { char, exact, look }
    }

    /// Alternation.
    pub fn union(items: impl IntoIterator<Item = FirstConsumedChar>) -> FirstConsumedChar {
        let mut char = CharSet::empty();
        let mut exact = true;
        let mut empty_look: Option<FirstLookChar> = None;
        for item in items {
            char = char.union(item.char());
            exact &= item.exact();
            if let FirstConsumedChar::Empty { look, .. } = item {
                empty_look = Some(match empty_look {
                    None => look,
                    Some(prev) => FirstLookChar {
                        char: prev.char.union(&look.char),
                        exact: prev.exact && look.exact,
                        edge: prev.edge || look.edge,
                    },
                });
            }
        }
        match empty_look {
            Some(look) => FirstConsumedChar::Empty { char, exact, look },
            None => FirstConsumedChar::NonEmpty { char, exact },
        }
    }

    /// The character that follows a position where this is consumed next.
    pub fn to_look(&self) -> FirstLookChar {
        match self {
            FirstConsumedChar::NonEmpty { char, exact } => FirstLookChar {
                char: char.clone(),
                exact: *exact,
                edge: false,
            },
            FirstConsumedChar::Empty { char, exact, look } => FirstLookChar {
                char: char.union(&look.char),
                exact: *exact && look.exact,
                edge: look.edge,
            },
        }
    }
}

/// The characters `node` consumes first when matched in `direction`.
pub fn first_consumed_char(node: NodeRef<'_>, direction: Direction, flags: Flags) -> FirstConsumedChar {
    if classify(node) == NodeCategory::CharacterLike {
        return match to_char_set(node, flags) {
            Some(char) => FirstConsumedChar::NonEmpty { char, exact: true },
            // Class with strings, lone surrogate
            None => FirstConsumedChar::Empty {
                char: CharSet::all(),
                exact: false,
                look: FirstLookChar::unknown(),
            },
        };
    }
    match node.kind() {
        NodeKind::Alternative { .. } | NodeKind::StringAlternative { .. } => {
            let elements = node.children();
            let elements = match direction {
                Direction::Ltr => Either::Left(elements),
                Direction::Rtl => Either::Right(elements.rev()),
            };
            FirstConsumedChar::concat(elements.map(|e| first_consumed_char(e, direction, flags)))
        }
        NodeKind::Pattern { .. }
        | NodeKind::Group { .. }
        | NodeKind::CapturingGroup { .. }
        | NodeKind::ClassStringDisjunction { .. } => {
            FirstConsumedChar::union(node.children().map(|a| first_consumed_char(a, direction, flags)))
        }
        NodeKind::Quantifier { min, max, element, .. } => {
            if *max == Some(0) {
                return FirstConsumedChar::empty(FirstLookChar::all());
            }
            let first = first_consumed_char(node.get(*element), direction, flags);
            if *min == 0 {
                FirstConsumedChar::union([first, FirstConsumedChar::empty(FirstLookChar::all())])
            } else {
                first
            }
        }
        NodeKind::Assertion(assertion) => {
            FirstConsumedChar::empty(assertion_look(node, assertion, direction, flags))
        }
        NodeKind::Backreference { resolved, .. } => {
            let group = match resolved {
                Some(group) if !is_empty_backreference(node) => node.get(*group),
                _ => return FirstConsumedChar::empty(FirstLookChar::all()),
            };
            let first = match first_consumed_char(group, direction, flags) {
                FirstConsumedChar::NonEmpty { char, exact } => FirstConsumedChar::NonEmpty {
                    exact: exact && char.len() <= 1,
                    char,
                },
                // The empty path of the group says nothing about what follows the reference
                FirstConsumedChar::Empty { char, exact, .. } => FirstConsumedChar::Empty {
                    exact: exact && char.len() <= 1,
                    char,
                    look: FirstLookChar::unknown(),
                },
            };
            if is_strict_backreference(node) {
                first
            } else {
                FirstConsumedChar::union([first, FirstConsumedChar::empty(FirstLookChar::all())])
            }
        }
        _ => unreachable!("character-like node {node:?}"),
    }
}

fn assertion_look(
    node: NodeRef<'_>,
    assertion: &Assertion,
    direction: Direction,
    flags: Flags,
) -> FirstLookChar {
    let line_edge = || FirstLookChar {
        char: if flags.multiline {
            CharSet::from_ranges(LINE_TERMINATOR)
        } else {
            CharSet::empty()
        },
        exact: true,
        edge: true,
    };
    match assertion {
        Assertion::Start if direction == Direction::Rtl => line_edge(),
        Assertion::End if direction == Direction::Ltr => line_edge(),
        Assertion::Start | Assertion::End | Assertion::Word { .. } => FirstLookChar::unknown(),
        Assertion::Lookaround { kind, negate, .. } => {
            if Direction::from(*kind) != direction {
                return FirstLookChar::unknown();
            }
            if !*negate {
                return FirstConsumedChar::union(
                    node.alternatives().map(|a| first_consumed_char(a, direction, flags)),
                )
                .to_look();
            }
            match single_char(node, flags) {
                Some(char) => FirstLookChar {
                    char: char.negate(),
                    exact: true,
                    edge: true,
                },
                None => FirstLookChar::unknown(),
            }
        }
    }
}

/// The set of a lookaround that is a single character-like node, e.g. `(?=[ab])`.
pub(crate) fn single_char(lookaround: NodeRef<'_>, flags: Flags) -> Option<CharSet> {
    let mut alternatives = lookaround.alternatives();
    let (Some(alternative), None) = (alternatives.next(), alternatives.next()) else {
        return None;
    };
    let mut elements = alternative.elements();
    let (Some(element), None) = (elements.next(), elements.next()) else {
        return None;
    };
    if classify(element) != NodeCategory::CharacterLike {
        return None;
    }
    to_char_set(element, flags)
}

/// What `node` is followed by in `direction`, up to the edge of the input.
pub fn first_consumed_char_after(
    node: NodeRef<'_>,
    direction: Direction,
    flags: Flags,
) -> FirstConsumedChar {
    let Some(parent) = node.parent() else {
        return FirstConsumedChar::empty(FirstLookChar::edge());
    };
    match parent.kind() {
        NodeKind::Alternative { elements } | NodeKind::StringAlternative { elements } => {
            let Some(index) = elements.iter().position(|&e| e == node.id()) else {
                unreachable!("{node:?} is not an element of its parent");
            };
            let siblings = match direction {
                Direction::Ltr => Either::Left(elements[index + 1..].iter()),
                Direction::Rtl => Either::Right(elements[..index].iter().rev()),
            };
            FirstConsumedChar::concat(
                siblings
                    .map(|&e| first_consumed_char(parent.get(e), direction, flags))
                    .chain(iter::once_with(|| first_consumed_char_after(parent, direction, flags))),
            )
        }
        NodeKind::Quantifier { max, .. } => {
            let after = first_consumed_char_after(parent, direction, flags);
            if max.map_or(true, |max| max > 1) {
                let again = FirstConsumedChar::concat([
                    first_consumed_char(node, direction, flags),
                    after.clone(),
                ]);
                FirstConsumedChar::union([after, again])
            } else {
                after
            }
        }
        NodeKind::Assertion(Assertion::Lookaround { kind, .. }) => {
            if Direction::from(*kind) == direction {
                // The end of the lookaround, anything may follow
                FirstConsumedChar::Empty {
                    char: CharSet::all(),
                    exact: false,
                    look: FirstLookChar::unknown(),
                }
            } else {
                first_consumed_char_after(parent, direction, flags)
            }
        }
        NodeKind::Pattern { .. } => FirstConsumedChar::empty(FirstLookChar::edge()),
        NodeKind::Group { .. } | NodeKind::CapturingGroup { .. } => {
            first_consumed_char_after(parent, direction, flags)
        }
        // Inside a class
        _ => FirstConsumedChar::Empty {
            char: CharSet::all(),
            exact: false,
            look: FirstLookChar::unknown(),
        },
    }
}

/// The character right after `node` in `direction`.
pub fn first_char_after(node: NodeRef<'_>, direction: Direction, flags: Flags) -> FirstLookChar {
    first_consumed_char_after(node, direction, flags).to_look()
}
