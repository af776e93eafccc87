/*!
## Canonicalize
Case-insensitive matching in ECMAScript regular expressions compares characters after mapping them
through `Canonicalize` ([ECMA-262 22.2.2.7.3](https://tc39.es/ecma262/#sec-runtime-semantics-canonicalize-ch)).

- With the `u` or `v` flag: simple case folding. This crate does not duplicate the folding table,
  callers are expected to use the one from `regex-syntax`.
- Without them: the single-char uppercase mapping, except that a non-ASCII character is never
  mapped into ASCII (so `ſ` and `K` (Kelvin sign) are not equal to `s` and `k`).
  [`to_canonical()`](CharToCanonical::to_canonical) implements this mode.
*/
use crate::Sealed;

pub trait CharToCanonical: Sealed {
    /// `Canonicalize(rer, ch)` for a pattern without the `u` and `v` flags.
    fn to_canonical(self) -> char;

    /// Whether two chars are equal under non-Unicode case-insensitive matching.
    fn eq_canonical(self, other: char) -> bool;
}

impl CharToCanonical for char {
    fn to_canonical(self) -> char {
        let mut upper = self.to_uppercase();
        let (Some(cu), None) = (upper.next(), upper.next()) else {
            // Multi-char uppercase, e.g. `ß` -> "SS"
            return self;
        };
        if !self.is_ascii() && cu.is_ascii() {
            return self;
        }
        cu
    }

    fn eq_canonical(self, other: char) -> bool {
        self == other || self.to_canonical() == other.to_canonical()
    }
}

/// Chars that take part in a simple case folding equivalence crossing the ASCII boundary, i.e.
/// those Unicode and non-Unicode case folding disagree on.
pub const ASCII_BOUNDARY_FOLD: [char; 6] = ['K', 'S', 'k', 's', '\u{17F}', '\u{212A}'];
