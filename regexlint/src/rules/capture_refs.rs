use std::collections::BTreeSet;

use logos::Logos;

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum ReplacementToken {
    /// `$$`
    #[token("$$")]
    Dollar,

    /// `$&`, `` $` `` and `$'`: the match and its surroundings, no group.
    #[token("$&")]
    #[token("$`")]
    #[token("$'")]
    Match,

    /// `$1`, `$12`
    #[regex(r"\$[0-9][0-9]?")]
    Index,

    /// `$<name>`
    #[regex(r"\$<[^>]*>")]
    Name,

    /// Plain text, including a `$` that starts no pattern.
    #[token("$")]
    #[regex(r"[^$]+")]
    Text,
}

/// How the capturing groups of a pattern are used by the code around it, e.g. `match[1]`,
/// `groups.name` or `str.replace(re, "$1")`.
///
/// Built by the host, which sees the surrounding source. Read by `no-unused-capturing-group`.
///
/// ## Example
/// ```
/// use regexlint::rules::CaptureReferenceTable;
///
/// let mut table = CaptureReferenceTable::new();
/// table.replacement("$<year>-$2 costs $$5");
/// assert!(table.is_used(2, None));
/// assert!(table.is_used(1, Some("year")));
/// assert!(!table.is_used(5, None));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureReferenceTable {
    indexes: BTreeSet<u32>,
    names: BTreeSet<String>,
    all: bool,
}

impl CaptureReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `match[index]`
    pub fn index(&mut self, index: u32) -> &mut Self {
        self.indexes.insert(index);
        self
    }

    /// `match.groups.name`
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.names.insert(name.to_owned());
        self
    }

    /// `str.split(re)`, which returns all groups.
    pub fn split(&mut self) -> &mut Self {
        self.all = true;
        self
    }

    /// The match escapes where the host cannot follow it.
    pub fn unknown(&mut self) -> &mut Self {
        self.all = true;
        self
    }

    /// A replacement string of `str.replace(re, replacement)`.
    ///
    /// Which group `$12` refers to depends on the number of groups, so it marks both 12 and 1.
    pub fn replacement(&mut self, replacement: &str) -> &mut Self {
        let mut lex = ReplacementToken::lexer(replacement);
        while let Some(token) = lex.next() {
            let Ok(token) = token else {
                continue;
            };
            let slice = lex.slice();
            match token {
                ReplacementToken::Index => {
                    let digits = &slice[1..];
                    self.indexes.extend(
                        [digits, &digits[..1]]
                            .into_iter()
                            .filter_map(|d| d.parse::<u32>().ok())
                            .filter(|&i| i != 0),
                    );
                }
                ReplacementToken::Name => {
                    self.names.insert(slice[2..slice.len() - 1].to_owned());
                }
                ReplacementToken::Dollar | ReplacementToken::Match | ReplacementToken::Text => {}
            }
        }
        self
    }

    /// Whether every group counts as used.
    pub fn is_all_used(&self) -> bool {
        self.all
    }

    pub fn is_used(&self, index: u32, name: Option<&str>) -> bool {
        self.all
            || self.indexes.contains(&index)
            || name.is_some_and(|name| self.names.contains(name))
    }
}
