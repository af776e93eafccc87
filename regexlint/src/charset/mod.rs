/*!
Sets of code points, on top of [`regex_syntax::hir::ClassUnicode`].

A [`CharSet`] never contains surrogate code points; nodes that denote lone surrogates are not
representable and [`to_char_set()`] returns `None` for them.

## Example
```
use regexlint::{charset::{to_char_set, CharSet}, syntax::parse_literal};

let ast = parse_literal("/[a-z]/i").unwrap();
let class = ast.walk()[2];
let set = to_char_set(class, ast.flags()).unwrap();
assert!(set.contains('Q'));
assert!(CharSet::from_range('a', 'c').is_subset_of(&set));
```
*/
use std::fmt;

use regex_syntax::hir::{ClassUnicode, ClassUnicodeRange};
use regexlint_unicode::case::ASCII_BOUNDARY_FOLD;

use crate::syntax::Flags;

mod node;

pub use node::{to_char_set, word_char_set};

#[derive(Clone)]
pub struct CharSet(ClassUnicode);

impl CharSet {
    pub fn empty() -> Self {
        Self(ClassUnicode::empty())
    }

    /// Every Unicode scalar value.
    pub fn all() -> Self {
        Self::from_range('\0', char::MAX)
    }

    pub fn from_char(c: char) -> Self {
        Self::from_range(c, c)
    }

    pub fn from_range(start: char, end: char) -> Self {
        Self(ClassUnicode::new([ClassUnicodeRange::new(start, end)]))
    }

    /// From a table of inclusive ranges like [`regexlint_unicode::class::WHITE_SPACE`].
    pub fn from_ranges(table: &[(char, char)]) -> Self {
        Self(ClassUnicode::new(
            table.iter().map(|&(start, end)| ClassUnicodeRange::new(start, end)),
        ))
    }

    /// `None` for surrogates and values above `U+10FFFF`.
    pub fn from_code_point(cp: u32) -> Option<Self> {
        char::from_u32(cp).map(Self::from_char)
    }

    pub fn from_class(class: ClassUnicode) -> Self {
        Self(class)
    }

    pub fn as_class(&self) -> &ClassUnicode {
        &self.0
    }

    pub fn into_class(self) -> ClassUnicode {
        self.0
    }

    /// Inclusive ranges, sorted and non-adjacent.
    pub fn ranges(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.0.ranges().iter().map(|r| (r.start(), r.end()))
    }

    pub fn union(&self, other: &CharSet) -> CharSet {
        let mut class = self.0.clone();
        class.union(&other.0);
        Self(class)
    }

    pub fn union_all<'s>(sets: impl IntoIterator<Item = &'s CharSet>) -> CharSet {
        let mut class = ClassUnicode::empty();
        for set in sets {
            class.union(&set.0);
        }
        Self(class)
    }

    pub fn intersect(&self, other: &CharSet) -> CharSet {
        let mut class = self.0.clone();
        class.intersect(&other.0);
        Self(class)
    }

    pub fn subtract(&self, other: &CharSet) -> CharSet {
        let mut class = self.0.clone();
        class.difference(&other.0);
        Self(class)
    }

    pub fn negate(&self) -> CharSet {
        let mut class = self.0.clone();
        class.negate();
        Self(class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.ranges().is_empty()
    }

    pub fn is_all(&self) -> bool {
        self.negate().is_empty()
    }

    pub fn is_subset_of(&self, other: &CharSet) -> bool {
        self.subtract(other).is_empty()
    }

    pub fn is_disjoint_with(&self, other: &CharSet) -> bool {
        self.intersect(other).is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.0
            .ranges()
            .binary_search_by(|r| {
                if r.end() < c {
                    std::cmp::Ordering::Less
                } else if r.start() > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Number of code points.
    pub fn len(&self) -> u64 {
        self.ranges()
            .map(|(start, end)| {
                let n = end as u64 - start as u64 + 1;
                // Ranges never contain surrogates but may span them
                if start <= '\u{D7FF}' && end >= '\u{E000}' {
                    n - 0x800
                } else {
                    n
                }
            })
            .sum()
    }

    /// The only code point of this set, if it has exactly one.
    pub fn single(&self) -> Option<char> {
        match self.0.ranges() {
            [r] if r.start() == r.end() => Some(r.start()),
            _ => None,
        }
    }

    /// Close the set under case-insensitive matching, if `flags` has `i`.
    ///
    /// In Unicode mode this is simple case folding. Without `u`/`v`, no character is folded across
    /// the ASCII boundary, so `s` does not pick up `ſ` (U+017F) and `k` does not pick up `K`
    /// (U+212A).
    pub fn fold(&self, flags: Flags) -> CharSet {
        if !flags.ignore_case {
            return self.clone();
        }
        if flags.is_unicode_mode() || !ASCII_BOUNDARY_FOLD.into_iter().any(|c| self.contains(c)) {
            let mut class = self.0.clone();
            class.case_fold_simple();
            return Self(class);
        }

        let ascii = CharSet::from_range('\0', '\x7F');
        let mut low = self.intersect(&ascii).0;
        low.case_fold_simple();
        let mut high = self.subtract(&ascii).0;
        high.case_fold_simple();
        CharSet(low)
            .intersect(&ascii)
            .union(&CharSet(high).subtract(&ascii))
    }
}

impl Default for CharSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for CharSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.ranges() == other.0.ranges()
    }
}

impl Eq for CharSet {}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (start, end) in self.ranges() {
            if start == end {
                write!(f, "{}", start.escape_debug())?;
            } else {
                write!(f, "{}-{}", start.escape_debug(), end.escape_debug())?;
            }
        }
        f.write_str("]")
    }
}
