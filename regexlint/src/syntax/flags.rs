use bon::Builder;

use super::ParseError;

/// Flags of a regular expression literal, e.g. `gi` in `/foo/gi`.
///
/// ## Example
/// ```
/// use regexlint::syntax::Flags;
///
/// let flags: Flags = "iu".parse().unwrap();
/// assert!(flags.ignore_case && flags.unicode);
/// assert_eq!(flags, Flags::builder().ignore_case(true).unicode(true).build());
/// assert_eq!(flags.to_string(), "iu");
/// ```
#[derive(Builder, Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Flags {
    /// `d`
    #[builder(default)]
    pub has_indices: bool,
    /// `g`
    #[builder(default)]
    pub global: bool,
    /// `i`
    #[builder(default)]
    pub ignore_case: bool,
    /// `m`
    #[builder(default)]
    pub multiline: bool,
    /// `s`
    #[builder(default)]
    pub dot_all: bool,
    /// `u`
    #[builder(default)]
    pub unicode: bool,
    /// `v`
    #[builder(default)]
    pub unicode_sets: bool,
    /// `y`
    #[builder(default)]
    pub sticky: bool,
}

impl Flags {
    /// Either `u` or `v`. Both enable Unicode-aware parsing and case folding.
    pub fn is_unicode_mode(&self) -> bool {
        self.unicode || self.unicode_sets
    }

    fn slot(&mut self, c: char) -> Option<&mut bool> {
        Some(match c {
            'd' => &mut self.has_indices,
            'g' => &mut self.global,
            'i' => &mut self.ignore_case,
            'm' => &mut self.multiline,
            's' => &mut self.dot_all,
            'u' => &mut self.unicode,
            'v' => &mut self.unicode_sets,
            'y' => &mut self.sticky,
            _ => return None,
        })
    }
}

impl std::str::FromStr for Flags {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Flags::default();
        for (i, c) in s.char_indices() {
            match flags.slot(c) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(ParseError::new(i, format!("duplicated flag '{c}'"))),
                None => return Err(ParseError::new(i, format!("invalid flag '{c}'"))),
            }
        }
        if flags.unicode && flags.unicode_sets {
            return Err(ParseError::new(0, "flags 'u' and 'v' cannot be used together"));
        }
        Ok(flags)
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut flags = *self;
        for c in "dgimsuvy".chars() {
            if flags.slot(c).is_some_and(|set| *set) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}
