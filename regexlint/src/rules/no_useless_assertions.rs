use super::{Fix, Rule, RuleContext};
use crate::{
    analysis::reach::{first_char_after, single_char, Direction, FirstLookChar},
    charset::{word_char_set, CharSet},
    syntax::{Assertion, Flags, NodeKind, NodeRef},
    unicode::class::LINE_TERMINATOR,
};

/// Disallow assertions that always accept or always reject because of the characters around them,
/// e.g. the `\b` in `a\b-` or the `^` in `a^b`.
///
/// The surroundings of the whole pattern are unknown, so an assertion that can see the edge of the
/// pattern is never reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoUselessAssertions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Accept,
    Reject,
}

/// Which way a character set relates to `set`, if it is known.
fn relation(look: &FirstLookChar, set: &CharSet) -> Option<bool> {
    if look.edge || look.char.is_empty() {
        None
    } else if look.char.is_subset_of(set) {
        Some(true)
    } else if look.char.is_disjoint_with(set) {
        Some(false)
    } else {
        None
    }
}

fn verdict(node: NodeRef<'_>, assertion: &Assertion, flags: Flags) -> Option<Verdict> {
    match assertion {
        Assertion::Start | Assertion::End => {
            let direction = match assertion {
                Assertion::Start => Direction::Rtl,
                _ => Direction::Ltr,
            };
            let look = first_char_after(node, direction, flags);
            if look.edge || look.char.is_empty() {
                return None;
            }
            if !flags.multiline {
                return Some(Verdict::Reject);
            }
            relation(&look, &CharSet::from_ranges(LINE_TERMINATOR)).map(|is_line_terminator| {
                if is_line_terminator {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                }
            })
        }
        Assertion::Word { negate } => {
            let word = word_char_set(flags);
            let before = relation(&first_char_after(node, Direction::Rtl, flags), &word)?;
            let after = relation(&first_char_after(node, Direction::Ltr, flags), &word)?;
            let boundary = before != after;
            Some(if boundary != *negate {
                Verdict::Accept
            } else {
                Verdict::Reject
            })
        }
        Assertion::Lookaround { kind, negate, .. } => {
            let set = single_char(node, flags)?;
            let look = first_char_after(node, Direction::from(*kind), flags);
            let matches = relation(&look, &set)?;
            Some(if matches != *negate {
                Verdict::Accept
            } else {
                Verdict::Reject
            })
        }
    }
}

impl Rule for NoUselessAssertions {
    fn name(&self) -> &'static str {
        "no-useless-assertions"
    }

    fn check(&self, cx: &mut RuleContext<'_>) {
        let flags = cx.flags();
        for node in cx.ast().walk() {
            let NodeKind::Assertion(assertion) = node.kind() else {
                continue;
            };
            let Some(verdict) = verdict(node, assertion, flags) else {
                continue;
            };
            let message = match verdict {
                Verdict::Accept => format!(
                    "'{}' will always accept because of the characters around it.",
                    node.raw()
                ),
                Verdict::Reject => format!(
                    "'{}' will always reject because of the characters around it.",
                    node.raw()
                ),
            };
            // An empty pattern would turn the literal into a comment
            let removable = node
                .parent()
                .is_some_and(|p| matches!(p.kind(), NodeKind::Alternative { .. }))
                && node.span().len() < cx.ast().source().len();
            let fix = (verdict == Verdict::Accept && removable).then(|| Fix::remove(node.span()));
            cx.report(node, message, fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::lint;

    type Found = (String, Verdict, Option<String>);

    fn e(raw: &str, verdict: Verdict, fix: Option<&str>) -> Found {
        (raw.to_owned(), verdict, fix.map(str::to_owned))
    }

    fn found(literal: &str) -> Vec<Found> {
        lint(NoUselessAssertions, literal)
            .into_iter()
            .map(|(raw, message, fix)| {
                let verdict = if message.contains("accept") {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                };
                (raw, verdict, fix)
            })
            .collect()
    }

    #[test]
    fn word_boundaries() {
        assert_eq!(found(r"/ \b /"), [e(r"\b", Verdict::Reject, None)]);
        assert_eq!(found(r"/a\b /"), [e(r"\b", Verdict::Accept, Some("a "))]);
        assert_eq!(found(r"/a\Bb/"), [e(r"\B", Verdict::Accept, Some("ab"))]);
        assert_eq!(found(r"/a\B-/"), [e(r"\B", Verdict::Reject, None)]);
        // The edges of the pattern are unknown
        assert!(found(r"/\ba/").is_empty());
        assert!(found(r"/a\b/").is_empty());
        // Could be either
        assert!(found(r"/a\b[a-]/").is_empty());
    }

    #[test]
    fn anchors() {
        assert_eq!(found("/a^b/"), [e("^", Verdict::Reject, None)]);
        assert_eq!(found("/a$b/"), [e("$", Verdict::Reject, None)]);
        assert_eq!(found("/a^b/m"), [e("^", Verdict::Reject, None)]);
        assert_eq!(found("/\\n^b/m"), [e("^", Verdict::Accept, Some("\\nb"))]);
        assert_eq!(found("/a$\\n/m"), [e("$", Verdict::Accept, Some("a\\n"))]);
        assert!(found("/^a$/").is_empty());
        assert!(found("/(?:a|^)b/").is_empty());
    }

    #[test]
    fn lookarounds() {
        assert_eq!(found("/(?=a)a/"), [e("(?=a)", Verdict::Accept, Some("a"))]);
        assert_eq!(found("/(?=a)b/"), [e("(?=a)", Verdict::Reject, None)]);
        assert_eq!(found("/(?!a)b/"), [e("(?!a)", Verdict::Accept, Some("b"))]);
        assert_eq!(found("/a(?<![ab])/"), [e("(?<![ab])", Verdict::Reject, None)]);
        assert!(found("/(?=a)[ab]/").is_empty());
        assert!(found("/(?=ab)a/").is_empty());
        assert!(found("/a(?=b)/").is_empty());
    }

    #[test]
    fn inside_lookaround() {
        // The end of a lookahead is not the end of the input
        assert!(found(r"/(?=a\b)/").is_empty());
        assert_eq!(found(r"/(?=a\b-)/"), [e(r"\b", Verdict::Accept, Some("(?=a-)"))]);
    }
}
