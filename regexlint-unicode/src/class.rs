//! Character tables from ECMA-262, as inclusive code point ranges sorted by start.

/// `LineTerminator`: `\n`, `\r`, U+2028 and U+2029.
pub const LINE_TERMINATOR: &[(char, char)] = &[
    ('\n', '\n'),
    ('\r', '\r'),
    ('\u{2028}', '\u{2029}'),
];

/// `WhiteSpace` and `LineTerminator`, i.e. what `\s` matches.
pub const WHITE_SPACE: &[(char, char)] = &[
    ('\t', '\r'),
    (' ', ' '),
    ('\u{A0}', '\u{A0}'),
    ('\u{1680}', '\u{1680}'),
    ('\u{2000}', '\u{200A}'),
    ('\u{2028}', '\u{2029}'),
    ('\u{202F}', '\u{202F}'),
    ('\u{205F}', '\u{205F}'),
    ('\u{3000}', '\u{3000}'),
    ('\u{FEFF}', '\u{FEFF}'),
];

/// `\d`
pub const DIGIT: &[(char, char)] = &[('0', '9')];

/// `\w` without case-insensitive Unicode matching.
pub const WORD: &[(char, char)] = &[('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')];

/// Extra chars `\w` matches with the `i` flag and `u`/`v` flag: U+017F and U+212A fold into `s`
/// and `k`.
pub const WORD_UNICODE_IGNORE_CASE_EXTRA: &[(char, char)] =
    &[('\u{17F}', '\u{17F}'), ('\u{212A}', '\u{212A}')];
