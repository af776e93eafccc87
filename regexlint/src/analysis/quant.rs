//! Combining nested quantifiers, e.g. `(?:a{2,3}){2}` into `a{4,6}`.
use std::fmt;

/// Repetition bounds of a quantifier. `max` of `None` is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub min: u32,
    pub max: Option<u32>,
}

impl Bounds {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        assert!(
            max.map_or(true, |max| min <= max),
            "invalid quantifier bounds {min}..{max:?}"
        );
        Self { min, max }
    }

    pub fn is_fixed(&self) -> bool {
        self.max == Some(self.min)
    }
}

impl fmt::Display for Bounds {
    /// The shortest quantifier syntax for the bounds, e.g. `*`, `?` or `{2,3}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => f.write_str("*"),
            (1, None) => f.write_str("+"),
            (0, Some(1)) => f.write_str("?"),
            (min, None) => write!(f, "{{{min},}}"),
            (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
            (min, Some(max)) => write!(f, "{{{min},{max}}}"),
        }
    }
}

/// Combine `inner` nested in `outer`, i.e. `(?:x{inner}){outer}`, into a single quantifier that
/// matches exactly the same repetition counts.
///
/// Returns `None` if the counts of the combination have gaps, e.g. `(?:a{2}){0,2}` matches 0, 2
/// or 4 `a`s, or if the result does not fit `u32`.
///
/// ## Example
/// ```
/// use regexlint::analysis::quant::{combine, Bounds};
///
/// let combined = combine(Bounds::new(2, Some(3)), Bounds::new(2, Some(2))).unwrap();
/// assert_eq!(combined, Bounds::new(4, Some(6)));
/// assert_eq!(combined.to_string(), "{4,6}");
///
/// assert_eq!(combine(Bounds::new(1, None), Bounds::new(0, Some(1))).unwrap().to_string(), "*");
/// assert_eq!(combine(Bounds::new(2, Some(2)), Bounds::new(0, Some(2))), None);
/// ```
pub fn combine(inner: Bounds, outer: Bounds) -> Option<Bounds> {
    let (a, b) = (u64::from(inner.min), inner.max.map(u64::from));
    let (c, d) = (u64::from(outer.min), outer.max.map(u64::from));

    // The ranges [a*k, b*k] for k in c..=d must overlap or touch
    let combinable = d == Some(c)
        || match b {
            None => c > 0 || a <= 1,
            Some(b) => b * c + 1 >= a * (c + 1),
        };
    if !combinable {
        return None;
    }

    let min = u32::try_from(a * c).ok()?;
    let max = match (b, d) {
        (Some(0), _) | (_, Some(0)) => Some(0),
        (Some(b), Some(d)) => Some(u32::try_from(b * d).ok()?),
        _ => None,
    };
    Some(Bounds::new(min, max))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    /// Repetition counts up to `limit`.
    fn counts(bounds: Bounds, limit: u32) -> BTreeSet<u32> {
        (bounds.min..=bounds.max.unwrap_or(limit).min(limit)).collect()
    }

    fn nested_counts(inner: Bounds, outer: Bounds, limit: u32) -> BTreeSet<u32> {
        let mut sums = BTreeSet::from([0]);
        let mut result = BTreeSet::new();
        for k in 0..=outer.max.unwrap_or(limit).min(limit) {
            if k >= outer.min {
                result.extend(sums.iter().copied());
            }
            sums = sums
                .iter()
                .flat_map(|s| counts(inner, limit).into_iter().map(move |n| s + n))
                .filter(|&n| n <= limit)
                .collect();
        }
        result
    }

    #[test]
    fn brute_force() {
        for a in 0..=5 {
            for b in a..=5 {
                for c in 0..=5 {
                    for d in c..=5 {
                        let inner = Bounds::new(a, Some(b));
                        let outer = Bounds::new(c, Some(d));
                        let expected = nested_counts(inner, outer, 25);
                        match combine(inner, outer) {
                            Some(combined) => {
                                assert_eq!(counts(combined, 25), expected, "{inner} {outer}")
                            }
                            None => assert_ne!(
                                counts(Bounds::new(a * c, Some(b * d)), 25),
                                expected,
                                "{inner} {outer}"
                            ),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unbounded() {
        let star = Bounds::new(0, None);
        let plus = Bounds::new(1, None);
        let opt = Bounds::new(0, Some(1));
        assert_eq!(combine(plus, star), Some(star));
        assert_eq!(combine(star, plus), Some(star));
        assert_eq!(combine(opt, plus), Some(star));
        assert_eq!(combine(plus, plus), Some(plus));
        assert_eq!(combine(Bounds::new(2, None), Bounds::new(3, None)), Some(Bounds::new(6, None)));
        // 0, 2, 3, 4...
        assert_eq!(combine(Bounds::new(2, None), star), None);
        assert_eq!(combine(Bounds::new(0, Some(0)), star), Some(Bounds::new(0, Some(0))));
    }

    #[test]
    fn display() {
        let s = |min, max| Bounds::new(min, max).to_string();
        assert_eq!(s(0, None), "*");
        assert_eq!(s(1, None), "+");
        assert_eq!(s(0, Some(1)), "?");
        assert_eq!(s(3, None), "{3,}");
        assert_eq!(s(2, Some(2)), "{2}");
        assert_eq!(s(1, Some(4)), "{1,4}");
        assert!(Bounds::new(2, Some(2)).is_fixed());
    }

    #[test]
    fn overflow() {
        let big = Bounds::new(u32::MAX, Some(u32::MAX));
        assert_eq!(combine(big, Bounds::new(2, Some(2))), None);
    }

    #[test]
    #[should_panic]
    fn invalid() {
        Bounds::new(3, Some(2));
    }
}
