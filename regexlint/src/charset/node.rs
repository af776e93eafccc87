use regex_syntax::hir::{Class, HirKind};
use regexlint_unicode::class::{DIGIT, LINE_TERMINATOR, WHITE_SPACE, WORD, WORD_UNICODE_IGNORE_CASE_EXTRA};

use super::CharSet;
use crate::syntax::{CharacterSet, Flags, NodeKind, NodeRef};

/// What `\w` matches under `flags`.
pub fn word_char_set(flags: Flags) -> CharSet {
    let word = CharSet::from_ranges(WORD);
    if flags.ignore_case && flags.is_unicode_mode() {
        word.union(&CharSet::from_ranges(WORD_UNICODE_IGNORE_CASE_EXTRA))
    } else {
        word
    }
}

/// The set of characters a character-like node matches under `flags`, with case folding applied.
///
/// Returns `None` for nodes that can match something other than exactly one code point (strings,
/// lone surrogates), for unknown properties, and for nodes that are not character-like.
pub fn to_char_set(node: NodeRef<'_>, flags: Flags) -> Option<CharSet> {
    match node.kind() {
        NodeKind::Character { value } => Some(CharSet::from_code_point(*value)?.fold(flags)),
        NodeKind::CharacterClassRange { min, max } => {
            let (NodeKind::Character { value: min }, NodeKind::Character { value: max }) =
                (node.get(*min).kind(), node.get(*max).kind())
            else {
                return None;
            };
            let min = char::from_u32(*min)?;
            let max = char::from_u32(*max)?;
            Some(CharSet::from_range(min, max).fold(flags))
        }
        NodeKind::CharacterSet(set) => character_set(set, flags),
        NodeKind::CharacterClass { negate, elements, .. } => {
            let sets = elements
                .iter()
                .map(|&e| to_char_set(node.get(e), flags))
                .collect::<Option<Vec<_>>>()?;
            let set = CharSet::union_all(&sets);
            Some(if *negate { set.negate() } else { set })
        }
        NodeKind::ExpressionCharacterClass { negate, expression } => {
            let set = to_char_set(node.get(*expression), flags)?;
            Some(if *negate { set.negate() } else { set })
        }
        NodeKind::ClassIntersection { left, right } => Some(
            to_char_set(node.get(*left), flags)?.intersect(&to_char_set(node.get(*right), flags)?),
        ),
        NodeKind::ClassSubtraction { left, right } => Some(
            to_char_set(node.get(*left), flags)?.subtract(&to_char_set(node.get(*right), flags)?),
        ),
        NodeKind::ClassStringDisjunction { alternatives } => {
            let sets = alternatives
                .iter()
                .map(|&a| to_char_set(node.get(a), flags))
                .collect::<Option<Vec<_>>>()?;
            Some(CharSet::union_all(&sets))
        }
        NodeKind::StringAlternative { elements } => match elements.as_slice() {
            [c] => to_char_set(node.get(*c), flags),
            _ => None,
        },
        NodeKind::Pattern { .. }
        | NodeKind::Alternative { .. }
        | NodeKind::Group { .. }
        | NodeKind::CapturingGroup { .. }
        | NodeKind::Quantifier { .. }
        | NodeKind::Assertion(_)
        | NodeKind::Backreference { .. } => None,
    }
}

fn character_set(set: &CharacterSet, flags: Flags) -> Option<CharSet> {
    let (set, negate) = match set {
        CharacterSet::Any => {
            return Some(if flags.dot_all {
                CharSet::all()
            } else {
                CharSet::from_ranges(LINE_TERMINATOR).negate()
            })
        }
        CharacterSet::Digit { negate } => (CharSet::from_ranges(DIGIT), *negate),
        CharacterSet::Space { negate } => (CharSet::from_ranges(WHITE_SPACE), *negate),
        CharacterSet::Word { negate } => (word_char_set(flags), *negate),
        CharacterSet::Property {
            key,
            value,
            negate,
            strings,
        } => {
            if *strings {
                return None;
            }
            let set = property(key.as_deref(), value)?;
            // With `v`, the complement is taken after folding
            return Some(match (*negate, flags.unicode_sets) {
                (false, _) => set.fold(flags),
                (true, true) => set.fold(flags).negate(),
                (true, false) => set.negate().fold(flags),
            });
        }
    };
    Some(if negate { set.negate() } else { set })
}

/// Resolve `\p{key=value}` through `regex-syntax`'s Unicode tables.
fn property(key: Option<&str>, value: &str) -> Option<CharSet> {
    let pattern = match key {
        Some(key) => format!(r"\p{{{key}={value}}}"),
        None => format!(r"\p{{{value}}}"),
    };
    let hir = regex_syntax::ParserBuilder::new()
        .unicode(true)
        .build()
        .parse(&pattern)
        .ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => Some(CharSet::from_class(class.clone())),
        HirKind::Class(Class::Bytes(class)) if class.ranges().is_empty() => Some(CharSet::empty()),
        // A class of one char is simplified into a literal
        HirKind::Literal(literal) => {
            let s = std::str::from_utf8(&literal.0).ok()?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(CharSet::from_char(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_literal;

    /// The set of the first element of the pattern.
    fn set(literal: &str) -> Option<CharSet> {
        let ast = parse_literal(literal).unwrap();
        let node = ast.walk()[2];
        to_char_set(node, ast.flags())
    }

    #[test]
    fn character() {
        assert_eq!(set("/a/"), Some(CharSet::from_char('a')));
        assert_eq!(set("/a/i"), Some(CharSet::from_char('a').union(&CharSet::from_char('A'))));
        assert_eq!(set("/\\uD800/"), None);
        assert_eq!(set("/\\u{1F600}/u"), Some(CharSet::from_char('\u{1F600}')));
    }

    #[test]
    fn classes() {
        assert_eq!(set("/[a-c]/"), set("/[abc]/"));
        assert_eq!(set("/[^\\d]/"), set("/\\D/"));
        assert_eq!(set("/[\\s\\S]/"), Some(CharSet::all()));
        assert_eq!(set("/[^]/"), Some(CharSet::all()));
        assert_eq!(set("/[]/"), Some(CharSet::empty()));
        // Annex B `[\d-z]` is `\d`, `-` and `z`
        assert_eq!(set("/[\\d-z]/"), set("/[0-9z-]/"));
    }

    #[test]
    fn dot() {
        let dot = set("/./").unwrap();
        assert!(!dot.contains('\n'));
        assert!(!dot.contains('\u{2028}'));
        assert!(dot.contains('a'));
        assert_eq!(set("/./s"), Some(CharSet::all()));
    }

    #[test]
    fn word() {
        let w = set("/\\w/").unwrap();
        assert_eq!(w.len(), 63);
        assert_eq!(set("/\\w/i"), Some(w.clone()));
        let wiu = set("/\\w/iu").unwrap();
        assert!(wiu.contains('\u{17F}'));
        assert!(wiu.contains('\u{212A}'));
        assert!(!set("/\\W/iu").unwrap().contains('\u{212A}'));
    }

    #[test]
    fn space() {
        let s = set("/\\s/").unwrap();
        assert!(s.contains('\u{FEFF}'));
        assert!(s.contains('\n'));
        assert!(!s.contains('a'));
    }

    #[test]
    fn properties() {
        let greek = set("/\\p{Script=Greek}/u").unwrap();
        assert!(greek.contains('α'));
        assert!(!greek.contains('a'));
        assert_eq!(set("/\\p{sc=Greek}/u"), Some(greek));

        let lu = set("/\\p{Lu}/u").unwrap();
        assert!(lu.contains('A') && !lu.contains('a'));
        let lu = set("/\\p{Lu}/iu").unwrap();
        assert!(lu.contains('a'));

        // Complement before folding with `u`, after folding with `v`
        assert!(set("/\\P{Lu}/iu").unwrap().contains('A'));
        assert!(!set("/\\P{Lu}/iv").unwrap().contains('A'));

        assert_eq!(set("/\\p{RGI_Emoji}/v"), None);
        assert_eq!(set("/\\p{Not_A_Property}/u"), None);
    }

    #[test]
    fn unicode_sets() {
        assert_eq!(set("/[\\w&&[a-f]]/v"), set("/[a-f]/v"));
        assert_eq!(set("/[[a-z]--[b-z]]/v"), set("/a/v"));
        assert_eq!(set("/[\\q{a|b}]/v"), set("/[ab]/v"));
        assert_eq!(set("/[\\q{ab}]/v"), None);
        assert_eq!(set("/[^\\q{a}]/v").map(|s| s.contains('a')), Some(false));
    }
}
