//! A recursive descent parser for ECMAScript regular expressions, including the Annex B
//! extensions allowed without the `u`/`v` flags.
use std::collections::HashMap;

use super::{
    ast::{Assertion, AstId, CharacterSet, GroupRef, LookaroundKind, Node, NodeId, NodeKind},
    Ast, Flags, ParseError,
};

/// Maximum nesting of groups, lookarounds and `v`-mode classes, as `regex_syntax`'s default
/// `nest_limit`.
const NEST_LIMIT: u32 = 250;

/// Properties of strings, only valid with the `v` flag.
const STRING_PROPERTIES: &[&str] = &[
    "Basic_Emoji",
    "Emoji_Keycap_Sequence",
    "RGI_Emoji",
    "RGI_Emoji_Flag_Sequence",
    "RGI_Emoji_Modifier_Sequence",
    "RGI_Emoji_Tag_Sequence",
    "RGI_Emoji_ZWJ_Sequence",
];

impl Ast {
    /// Parse a pattern source with the given flags.
    ///
    /// ## Example
    /// ```
    /// use regexlint::syntax::{Ast, Flags};
    ///
    /// let ast = Ast::parse("a|b", Flags::default()).unwrap();
    /// assert_eq!(ast.root().alternatives().len(), 2);
    /// assert!(Ast::parse("a)", Flags::default()).is_err());
    /// ```
    pub fn parse(source: &str, flags: Flags) -> Result<Ast, ParseError> {
        let mut parser = Parser::new(source, flags);
        let root = parser.parse_pattern()?;
        parser.resolve_backreferences()?;
        Ok(Ast {
            id: AstId::next(),
            source: source.to_owned(),
            flags,
            nodes: parser.nodes,
            root,
        })
    }
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    flags: Flags,
    nodes: Vec<Node>,
    /// Total number of capturing groups, counted before parsing.
    group_count: u32,
    has_named_groups: bool,
    next_group_index: u32,
    group_names: HashMap<String, NodeId>,
    depth: u32,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str, flags: Flags) -> Self {
        let (group_count, has_named_groups) = count_groups(src, flags.unicode_sets);
        Self {
            src,
            pos: 0,
            flags,
            nodes: Vec::new(),
            group_count,
            has_named_groups,
            next_group_index: 0,
            group_names: HashMap::new(),
            depth: 0,
        }
    }

    fn unicode_mode(&self) -> bool {
        self.flags.is_unicode_mode()
    }

    fn err<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::new(self.pos, message))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.src[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>, start: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent,
            span: start..start,
        });
        id
    }

    fn finish(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let node = &mut self.nodes[id.index()];
        node.kind = kind;
        node.span.end = self.pos;
        id
    }

    fn leaf(&mut self, kind: NodeKind, parent: NodeId, start: usize) -> NodeId {
        let id = self.alloc(kind, Some(parent), start);
        self.nodes[id.index()].span.end = self.pos;
        id
    }

    fn reparent(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
    }

    fn char_value(&self, id: NodeId) -> Option<u32> {
        match self.nodes[id.index()].kind {
            NodeKind::Character { value } => Some(value),
            _ => None,
        }
    }

    fn parse_pattern(&mut self) -> Result<NodeId, ParseError> {
        let root = self.alloc(NodeKind::Pattern { alternatives: Vec::new() }, None, 0);
        let alternatives = self.parse_disjunction(root)?;
        match self.peek() {
            None => {}
            Some(')') => return self.err("unmatched ')'"),
            Some(_) => return self.err("unexpected character"),
        }
        Ok(self.finish(root, NodeKind::Pattern { alternatives }))
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= NEST_LIMIT {
            return self.err("nesting too deep");
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_disjunction(&mut self, parent: NodeId) -> Result<Vec<NodeId>, ParseError> {
        self.nested(|p| {
            let mut alternatives = vec![p.parse_alternative(parent)?];
            while p.eat('|') {
                alternatives.push(p.parse_alternative(parent)?);
            }
            Ok(alternatives)
        })
    }

    fn parse_alternative(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let id = self.alloc(NodeKind::Alternative { elements: Vec::new() }, Some(parent), self.pos);
        let mut elements = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            elements.push(self.parse_term(id)?);
        }
        Ok(self.finish(id, NodeKind::Alternative { elements }))
    }

    fn parse_term(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.pos;
        let assertion = if self.eat('^') {
            Some(Assertion::Start)
        } else if self.eat('$') {
            Some(Assertion::End)
        } else if self.eat_str("\\b") {
            Some(Assertion::Word { negate: false })
        } else if self.eat_str("\\B") {
            Some(Assertion::Word { negate: true })
        } else {
            None
        };
        if let Some(assertion) = assertion {
            let id = self.leaf(NodeKind::Assertion(assertion), parent, start);
            if self.at_quantifier() {
                return self.err("nothing to repeat");
            }
            return Ok(id);
        }

        let lookaround = if self.eat_str("(?=") {
            Some((LookaroundKind::Lookahead, false))
        } else if self.eat_str("(?!") {
            Some((LookaroundKind::Lookahead, true))
        } else if self.eat_str("(?<=") {
            Some((LookaroundKind::Lookbehind, false))
        } else if self.eat_str("(?<!") {
            Some((LookaroundKind::Lookbehind, true))
        } else {
            None
        };
        if let Some((kind, negate)) = lookaround {
            let id = self.alloc(
                NodeKind::Assertion(Assertion::Lookaround {
                    kind,
                    negate,
                    alternatives: Vec::new(),
                }),
                Some(parent),
                start,
            );
            let alternatives = self.parse_disjunction(id)?;
            if !self.eat(')') {
                return self.err("unterminated group");
            }
            let id = self.finish(
                id,
                NodeKind::Assertion(Assertion::Lookaround {
                    kind,
                    negate,
                    alternatives,
                }),
            );
            // Annex B: lookaheads are quantifiable without the `u`/`v` flag
            if kind == LookaroundKind::Lookahead && !self.unicode_mode() {
                return self.parse_quantifier(id, parent, start);
            }
            if self.at_quantifier() {
                return self.err("nothing to repeat");
            }
            return Ok(id);
        }

        match self.peek() {
            Some('*' | '+' | '?') => return self.err("nothing to repeat"),
            Some('{') => {
                if self.unicode_mode() {
                    return self.err("lone quantifier brackets");
                }
                if self.at_quantifier() {
                    return self.err("nothing to repeat");
                }
            }
            _ => {}
        }
        let atom = self.parse_atom(parent)?;
        self.parse_quantifier(atom, parent, start)
    }

    /// Whether a quantifier starts at the current position.
    fn at_quantifier(&mut self) -> bool {
        match self.peek() {
            Some('*' | '+' | '?') => true,
            Some('{') => {
                let pos = self.pos;
                let braces = self.parse_braces();
                self.pos = pos;
                braces.is_some()
            }
            _ => false,
        }
    }

    /// `{n}`, `{n,}` or `{n,m}`. Restores nothing on failure, see [`Self::at_quantifier`].
    fn parse_braces(&mut self) -> Option<(u32, Option<u32>)> {
        let start = self.pos;
        if !self.eat('{') {
            return None;
        }
        let result = (|| {
            let min = self.parse_decimal()?;
            let max = if self.eat(',') {
                if self.peek() == Some('}') {
                    None
                } else {
                    Some(self.parse_decimal()?)
                }
            } else {
                Some(min)
            };
            self.eat('}').then_some((min, max))
        })();
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    /// Saturates at `u32::MAX`.
    fn parse_decimal(&mut self) -> Option<u32> {
        let digits = self.src[self.pos..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        let value = self.src[self.pos..self.pos + digits]
            .bytes()
            .fold(0u32, |n, b| n.saturating_mul(10).saturating_add((b - b'0') as u32));
        self.pos += digits;
        Some(value)
    }

    fn parse_quantifier(
        &mut self,
        atom: NodeId,
        parent: NodeId,
        start: usize,
    ) -> Result<NodeId, ParseError> {
        let (min, max) = match self.peek() {
            Some('*') => {
                self.bump();
                (0, None)
            }
            Some('+') => {
                self.bump();
                (1, None)
            }
            Some('?') => {
                self.bump();
                (0, Some(1))
            }
            Some('{') => match self.parse_braces() {
                Some(braces) => braces,
                None if self.unicode_mode() => return self.err("incomplete quantifier"),
                None => return Ok(atom),
            },
            _ => return Ok(atom),
        };
        if max.is_some_and(|max| max < min) {
            return self.err("numbers out of order in {} quantifier");
        }
        let greedy = !self.eat('?');
        let id = self.leaf(
            NodeKind::Quantifier {
                min,
                max,
                greedy,
                element: atom,
            },
            parent,
            start,
        );
        self.reparent(atom, id);
        Ok(id)
    }

    fn parse_atom(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.err("unexpected end of pattern");
        };
        match c {
            '.' => {
                self.bump();
                Ok(self.leaf(NodeKind::CharacterSet(CharacterSet::Any), parent, start))
            }
            '(' => self.parse_group(parent),
            '[' => {
                self.bump();
                if self.flags.unicode_sets {
                    self.parse_class_v(parent, start)
                } else {
                    self.parse_class(parent, start)
                }
            }
            '\\' => {
                self.bump();
                self.parse_atom_escape(parent, start)
            }
            ']' | '}' if self.unicode_mode() => self.err("lone quantifier brackets"),
            _ => {
                self.bump();
                Ok(self.leaf(NodeKind::Character { value: c as u32 }, parent, start))
            }
        }
    }

    fn parse_group(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.pos;
        self.bump();
        let id = self.alloc(NodeKind::Group { alternatives: Vec::new() }, Some(parent), start);
        let kind = if self.eat_str("?:") {
            let alternatives = self.parse_disjunction(id)?;
            NodeKind::Group { alternatives }
        } else if self.eat_str("?<") {
            let name = self.parse_group_name()?;
            if self.group_names.insert(name.clone(), id).is_some() {
                return Err(ParseError::new(start, "duplicate capture group name"));
            }
            self.next_group_index += 1;
            let index = self.next_group_index;
            let alternatives = self.parse_disjunction(id)?;
            NodeKind::CapturingGroup {
                index,
                name: Some(name),
                alternatives,
            }
        } else if self.peek() == Some('?') {
            return self.err("invalid group");
        } else {
            self.next_group_index += 1;
            let index = self.next_group_index;
            let alternatives = self.parse_disjunction(id)?;
            NodeKind::CapturingGroup {
                index,
                name: None,
                alternatives,
            }
        };
        if !self.eat(')') {
            return self.err("unterminated group");
        }
        Ok(self.finish(id, kind))
    }

    /// After `(?<` or `\k<`, consumes the closing `>`.
    fn parse_group_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            let valid = if name.is_empty() {
                c.is_alphabetic() || c == '_' || c == '$'
            } else {
                c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200C}' || c == '\u{200D}'
            };
            if !valid {
                break;
            }
            name.push(c);
            self.bump();
        }
        if name.is_empty() || !self.eat('>') {
            return self.err("invalid capture group name");
        }
        Ok(name)
    }

    fn parse_atom_escape(&mut self, parent: NodeId, start: usize) -> Result<NodeId, ParseError> {
        let Some(c) = self.peek() else {
            return self.err("\\ at end of pattern");
        };
        if let Some(set) = self.parse_set_escape()? {
            return Ok(self.leaf(NodeKind::CharacterSet(set), parent, start));
        }
        match c {
            'k' if self.unicode_mode() || self.has_named_groups => {
                self.bump();
                if !self.eat('<') {
                    return self.err("invalid named reference");
                }
                let name = self.parse_group_name()?;
                Ok(self.leaf(
                    NodeKind::Backreference {
                        reference: GroupRef::Name(name),
                        resolved: None,
                    },
                    parent,
                    start,
                ))
            }
            '1'..='9' => {
                let escape_start = self.pos;
                let n = self.parse_decimal().unwrap_or(0);
                if n <= self.group_count {
                    return Ok(self.leaf(
                        NodeKind::Backreference {
                            reference: GroupRef::Index(n),
                            resolved: None,
                        },
                        parent,
                        start,
                    ));
                }
                if self.unicode_mode() {
                    return Err(ParseError::new(escape_start, "invalid escape"));
                }
                self.pos = escape_start;
                let value = self.parse_legacy_octal_or_identity();
                Ok(self.leaf(NodeKind::Character { value }, parent, start))
            }
            _ => {
                let value = self.parse_character_escape(false)?;
                Ok(self.leaf(NodeKind::Character { value }, parent, start))
            }
        }
    }

    /// `\d`, `\s`, `\w`, their negations, and `\p{..}`/`\P{..}` with the `u`/`v` flag.
    fn parse_set_escape(&mut self) -> Result<Option<CharacterSet>, ParseError> {
        let set = match self.peek() {
            Some('d') => CharacterSet::Digit { negate: false },
            Some('D') => CharacterSet::Digit { negate: true },
            Some('s') => CharacterSet::Space { negate: false },
            Some('S') => CharacterSet::Space { negate: true },
            Some('w') => CharacterSet::Word { negate: false },
            Some('W') => CharacterSet::Word { negate: true },
            Some(c @ ('p' | 'P')) if self.unicode_mode() => {
                self.bump();
                return self.parse_property(c == 'P').map(Some);
            }
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(set))
    }

    /// After `\p` or `\P`.
    fn parse_property(&mut self, negate: bool) -> Result<CharacterSet, ParseError> {
        if !self.eat('{') {
            return self.err("invalid property name");
        }
        let end = match self.src[self.pos..].find('}') {
            Some(end) => self.pos + end,
            None => return self.err("invalid property name"),
        };
        let body = &self.src[self.pos..end];
        let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let (key, value) = match body.split_once('=') {
            Some((key, value)) if valid(key) && valid(value) => (Some(key.to_owned()), value.to_owned()),
            None if valid(body) => (None, body.to_owned()),
            _ => return self.err("invalid property name"),
        };
        let strings = key.is_none() && STRING_PROPERTIES.contains(&value.as_str());
        if strings && (negate || !self.flags.unicode_sets) {
            return self.err("invalid property name");
        }
        self.pos = end + 1;
        Ok(CharacterSet::Property {
            key,
            value,
            negate,
            strings,
        })
    }

    /// After `\`, for escapes that denote a single character.
    fn parse_character_escape(&mut self, in_class: bool) -> Result<u32, ParseError> {
        let escape_start = self.pos;
        let Some(c) = self.bump() else {
            return self.err("\\ at end of pattern");
        };
        let value = match c {
            't' => 0x09,
            'n' => 0x0A,
            'v' => 0x0B,
            'f' => 0x0C,
            'r' => 0x0D,
            'c' => match self.peek() {
                Some(l) if l.is_ascii_alphabetic() => {
                    self.bump();
                    l as u32 % 32
                }
                Some(l) if in_class && !self.unicode_mode() && (l.is_ascii_digit() || l == '_') => {
                    self.bump();
                    l as u32 % 32
                }
                _ if self.unicode_mode() => return self.err("invalid unicode escape"),
                _ => {
                    // Annex B: `\c` is a literal backslash followed by `c`
                    self.pos = escape_start;
                    return Ok('\\' as u32);
                }
            },
            'x' => match self.parse_hex_digits(2) {
                Some(value) => value,
                None if self.unicode_mode() => return self.err("invalid escape"),
                None => 'x' as u32,
            },
            'u' => match self.parse_unicode_escape()? {
                Some(value) => value,
                None => 'u' as u32,
            },
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => 0,
            '0'..='9' if self.unicode_mode() => {
                return Err(ParseError::new(escape_start, "invalid escape"))
            }
            '0'..='9' => {
                // Only reachable in classes or for `\0`-prefixed legacy octals
                self.pos = escape_start;
                self.parse_legacy_octal_or_identity()
            }
            'b' if in_class => 0x08,
            '-' if in_class && self.unicode_mode() => '-' as u32,
            c if self.unicode_mode() => {
                let allowed = "^$\\.*+?()[]{}|/".contains(c)
                    || (self.flags.unicode_sets
                        && in_class
                        && "&-!#%,:;<=>@`~".contains(c));
                if !allowed {
                    return Err(ParseError::new(escape_start, "invalid escape"));
                }
                c as u32
            }
            'k' if self.has_named_groups => return Err(ParseError::new(escape_start, "invalid named reference")),
            c => c as u32,
        };
        Ok(value)
    }

    /// After `\u`. `None` for an Annex B identity escape.
    fn parse_unicode_escape(&mut self) -> Result<Option<u32>, ParseError> {
        if self.unicode_mode() && self.peek() == Some('{') {
            let start = self.pos;
            self.bump();
            let digits = self.src[self.pos..]
                .bytes()
                .take_while(u8::is_ascii_hexdigit)
                .count();
            let value = u32::from_str_radix(&self.src[self.pos..self.pos + digits], 16).ok();
            self.pos += digits;
            return match value {
                Some(value) if value <= 0x10FFFF && self.eat('}') => Ok(Some(value)),
                _ => Err(ParseError::new(start, "invalid unicode escape")),
            };
        }
        let Some(lead) = self.parse_hex_digits(4) else {
            if self.unicode_mode() {
                return self.err("invalid unicode escape");
            }
            return Ok(None);
        };
        if self.unicode_mode() && (0xD800..=0xDBFF).contains(&lead) {
            let pos = self.pos;
            if self.eat_str("\\u") {
                if let Some(trail @ 0xDC00..=0xDFFF) = self.parse_hex_digits(4) {
                    return Ok(Some(0x10000 + ((lead - 0xD800) << 10) + (trail - 0xDC00)));
                }
            }
            self.pos = pos;
        }
        Ok(Some(lead))
    }

    fn parse_hex_digits(&mut self, n: usize) -> Option<u32> {
        let digits = self.src.get(self.pos..self.pos + n)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        self.pos += n;
        u32::from_str_radix(digits, 16).ok()
    }

    /// Annex B: `\1`-`\377` octal escapes, or `\8`/`\9` as the digit itself.
    fn parse_legacy_octal_or_identity(&mut self) -> u32 {
        let mut value = 0u32;
        let mut digits = 0;
        while let Some(d @ '0'..='7') = self.peek() {
            let next = value * 8 + (d as u32 - '0' as u32);
            if digits == 3 || next > 0o377 {
                break;
            }
            value = next;
            digits += 1;
            self.bump();
        }
        if digits == 0 {
            // `\8` or `\9`
            return self.bump().map_or(0, |c| c as u32);
        }
        value
    }

    /// A class without the `v` flag, after `[`.
    fn parse_class(&mut self, parent: NodeId, start: usize) -> Result<NodeId, ParseError> {
        let id = self.alloc(
            NodeKind::CharacterClass {
                negate: false,
                unicode_sets: false,
                elements: Vec::new(),
            },
            Some(parent),
            start,
        );
        let negate = self.eat('^');
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::new(start, "unterminated character class")),
                Some(']') => {
                    self.bump();
                    break;
                }
                _ => {}
            }
            let atom_start = self.pos;
            let min = self.parse_class_atom(id)?;
            if self.peek() == Some('-') && !matches!(self.peek_nth(1), None | Some(']')) {
                let dash_start = self.pos;
                self.bump();
                let max = self.parse_class_atom(id)?;
                match (self.char_value(min), self.char_value(max)) {
                    (Some(a), Some(b)) => {
                        if a > b {
                            return Err(ParseError::new(atom_start, "range out of order in character class"));
                        }
                        let range = self.leaf(NodeKind::CharacterClassRange { min, max }, id, atom_start);
                        self.reparent(min, range);
                        self.reparent(max, range);
                        elements.push(range);
                    }
                    _ if self.unicode_mode() => {
                        return Err(ParseError::new(atom_start, "invalid character class"));
                    }
                    _ => {
                        // Annex B: a range with a class escape is a union with a literal `-`
                        let dash = self.alloc(NodeKind::Character { value: '-' as u32 }, Some(id), dash_start);
                        self.nodes[dash.index()].span.end = dash_start + 1;
                        elements.extend([min, dash, max]);
                    }
                }
            } else {
                elements.push(min);
            }
        }
        Ok(self.finish(
            id,
            NodeKind::CharacterClass {
                negate,
                unicode_sets: false,
                elements,
            },
        ))
    }

    fn parse_class_atom(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return self.err("unterminated character class");
        };
        if c != '\\' {
            return Ok(self.leaf(NodeKind::Character { value: c as u32 }, parent, start));
        }
        if let Some(set) = self.parse_set_escape()? {
            return Ok(self.leaf(NodeKind::CharacterSet(set), parent, start));
        }
        let value = self.parse_character_escape(true)?;
        Ok(self.leaf(NodeKind::Character { value }, parent, start))
    }

    /// A class with the `v` flag, after `[`.
    fn parse_class_v(&mut self, parent: NodeId, start: usize) -> Result<NodeId, ParseError> {
        self.nested(|p| p.parse_class_v_body(parent, start))
    }

    fn parse_class_v_body(&mut self, parent: NodeId, start: usize) -> Result<NodeId, ParseError> {
        let id = self.alloc(
            NodeKind::CharacterClass {
                negate: false,
                unicode_sets: true,
                elements: Vec::new(),
            },
            Some(parent),
            start,
        );
        let negate = self.eat('^');
        if self.eat(']') {
            return Ok(self.finish(
                id,
                NodeKind::CharacterClass {
                    negate,
                    unicode_sets: true,
                    elements: Vec::new(),
                },
            ));
        }

        let first_start = self.pos;
        let first = self.parse_class_set_range_or_operand(id)?;
        let operator = if self.src[self.pos..].starts_with("&&") {
            Some("&&")
        } else if self.src[self.pos..].starts_with("--") {
            Some("--")
        } else {
            None
        };

        let kind = if let Some(operator) = operator {
            if matches!(self.nodes[first.index()].kind, NodeKind::CharacterClassRange { .. }) {
                return Err(ParseError::new(first_start, "invalid set operation in character class"));
            }
            let mut left = first;
            while self.eat_str(operator) {
                let right = self.parse_class_set_operand(id)?;
                let kind = if operator == "&&" {
                    NodeKind::ClassIntersection { left, right }
                } else {
                    NodeKind::ClassSubtraction { left, right }
                };
                let expression = self.leaf(kind, id, first_start);
                self.reparent(left, expression);
                self.reparent(right, expression);
                left = expression;
            }
            if !self.eat(']') {
                return self.err("invalid set operation in character class");
            }
            NodeKind::ExpressionCharacterClass {
                negate,
                expression: left,
            }
        } else {
            let mut elements = vec![first];
            loop {
                match self.peek() {
                    None => return Err(ParseError::new(start, "unterminated character class")),
                    Some(']') => {
                        self.bump();
                        break;
                    }
                    _ if self.src[self.pos..].starts_with("&&") || self.src[self.pos..].starts_with("--") => {
                        return self.err("invalid set operation in character class");
                    }
                    _ => elements.push(self.parse_class_set_range_or_operand(id)?),
                }
            }
            NodeKind::CharacterClass {
                negate,
                unicode_sets: true,
                elements,
            }
        };
        Ok(self.finish(id, kind))
    }

    fn parse_class_set_range_or_operand(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.pos;
        let min = self.parse_class_set_operand(parent)?;
        if self.peek() == Some('-') && self.peek_nth(1) != Some('-') {
            self.bump();
            let max = self.parse_class_set_operand(parent)?;
            let (Some(a), Some(b)) = (self.char_value(min), self.char_value(max)) else {
                return Err(ParseError::new(start, "invalid character class"));
            };
            if a > b {
                return Err(ParseError::new(start, "range out of order in character class"));
            }
            let range = self.leaf(NodeKind::CharacterClassRange { min, max }, parent, start);
            self.reparent(min, range);
            self.reparent(max, range);
            return Ok(range);
        }
        Ok(min)
    }

    fn parse_class_set_operand(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.err("unterminated character class");
        };
        match c {
            '[' => {
                self.bump();
                self.parse_class_v(parent, start)
            }
            '\\' => {
                self.bump();
                if self.eat_str("q{") {
                    return self.parse_class_string_disjunction(parent, start);
                }
                if let Some(set) = self.parse_set_escape()? {
                    return Ok(self.leaf(NodeKind::CharacterSet(set), parent, start));
                }
                let value = self.parse_character_escape(true)?;
                Ok(self.leaf(NodeKind::Character { value }, parent, start))
            }
            '(' | ')' | '{' | '}' | '/' | '|' | '-' | ']' => self.err("invalid character in character class"),
            _ => {
                self.bump();
                Ok(self.leaf(NodeKind::Character { value: c as u32 }, parent, start))
            }
        }
    }

    /// After `\q{`.
    fn parse_class_string_disjunction(&mut self, parent: NodeId, start: usize) -> Result<NodeId, ParseError> {
        let id = self.alloc(
            NodeKind::ClassStringDisjunction { alternatives: Vec::new() },
            Some(parent),
            start,
        );
        let mut alternatives = Vec::new();
        loop {
            let alternative = self.alloc(
                NodeKind::StringAlternative { elements: Vec::new() },
                Some(id),
                self.pos,
            );
            let mut elements = Vec::new();
            loop {
                let char_start = self.pos;
                let value = match self.peek() {
                    None => return Err(ParseError::new(start, "unterminated class string disjunction")),
                    Some('|' | '}') => break,
                    Some('\\') => {
                        self.bump();
                        self.parse_character_escape(true)?
                    }
                    Some(c) => {
                        self.bump();
                        c as u32
                    }
                };
                elements.push(self.leaf(NodeKind::Character { value }, alternative, char_start));
            }
            alternatives.push(self.finish(alternative, NodeKind::StringAlternative { elements }));
            if self.eat('}') {
                break;
            }
            self.bump();
        }
        Ok(self.finish(id, NodeKind::ClassStringDisjunction { alternatives }))
    }

    fn resolve_backreferences(&mut self) -> Result<(), ParseError> {
        let mut groups = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if let NodeKind::CapturingGroup { index, .. } = node.kind {
                groups.insert(index, NodeId(i as u32));
            }
        }
        for node in &mut self.nodes {
            if let NodeKind::Backreference { reference, resolved } = &mut node.kind {
                *resolved = match &*reference {
                    GroupRef::Index(index) => groups.get(index).copied(),
                    GroupRef::Name(name) => match self.group_names.get(name.as_str()) {
                        Some(&group) => Some(group),
                        None => return Err(ParseError::new(node.span.start, "invalid named capture referenced")),
                    },
                };
            }
        }
        Ok(())
    }
}

/// Count capturing groups and whether any is named, skipping escapes and classes.
fn count_groups(src: &str, unicode_sets: bool) -> (u32, bool) {
    let mut count = 0;
    let mut named = false;
    let mut class_depth = 0u32;
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if class_depth == 0 || unicode_sets => class_depth += 1,
            ']' if class_depth > 0 => class_depth -= 1,
            '(' if class_depth == 0 => {
                if chars.peek() != Some(&'?') {
                    count += 1;
                    continue;
                }
                let rest: String = chars.clone().take(3).collect();
                if rest.starts_with("?<") && !rest.starts_with("?<=") && !rest.starts_with("?<!") {
                    count += 1;
                    named = true;
                }
            }
            _ => {}
        }
    }
    (count, named)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_literal;

    fn parse(literal: &str) -> Ast {
        parse_literal(literal).unwrap()
    }

    fn kinds(ast: &Ast) -> Vec<&'static str> {
        ast.walk().iter().map(|n| n.kind().name()).collect()
    }

    #[test]
    fn alternatives() {
        let ast = parse("/a|bc|/");
        let root = ast.root();
        let alts: Vec<_> = root.alternatives().map(|a| a.raw()).collect();
        assert_eq!(alts, vec!["a", "bc", ""]);
        for alt in root.alternatives() {
            assert_eq!(alt.parent(), Some(root));
        }
    }

    #[test]
    fn quantifiers() {
        let ast = parse("/a*b+?c{2,}d{3}e{1,4}?/");
        let quants: Vec<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Quantifier { min, max, greedy, element } => {
                    assert_eq!(n.get(*element).parent(), Some(n));
                    Some((n.raw(), *min, *max, *greedy))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            quants,
            vec![
                ("a*", 0, None, true),
                ("b+?", 1, None, false),
                ("c{2,}", 2, None, true),
                ("d{3}", 3, Some(3), true),
                ("e{1,4}?", 1, Some(4), false),
            ]
        );
    }

    #[test]
    fn annex_b_braces() {
        let ast = parse("/a{,2}/");
        assert_eq!(kinds(&ast), vec!["Pattern", "Alternative", "Character", "Character", "Character", "Character", "Character"]);
        assert!(parse_literal("/a{,2}/u").is_err());
        assert!(parse_literal("/a{2,1}/").is_err());
        assert!(parse_literal("/{2}/").is_err());
        assert!(parse_literal("/*/").is_err());
    }

    #[test]
    fn groups() {
        let ast = parse("/(a)(?:b)(?<n>c)/");
        assert_eq!(
            kinds(&ast),
            vec![
                "Pattern", "Alternative",
                "CapturingGroup", "Alternative", "Character",
                "Group", "Alternative", "Character",
                "CapturingGroup", "Alternative", "Character",
            ]
        );
        let groups = ast.capturing_groups();
        assert_eq!(groups.len(), 2);
        assert!(matches!(groups[1].kind(), NodeKind::CapturingGroup { index: 2, name: Some(n), .. } if n == "n"));
        assert!(parse_literal("/(?<n>a)(?<n>b)/").is_err());
        assert!(parse_literal("/(a/").is_err());
        assert!(parse_literal("/a)/").is_err());
        assert!(parse_literal("/(?i:a)/").is_err());
    }

    #[test]
    fn assertions() {
        let ast = parse("/^\\b(?=a)(?!b)(?<=c)(?<!d)\\B$/");
        let assertions: Vec<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Assertion(a) => Some(a.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(assertions.len(), 8);
        assert_eq!(assertions[0], Assertion::Start);
        assert_eq!(assertions[1], Assertion::Word { negate: false });
        assert!(matches!(assertions[3], Assertion::Lookaround { kind: LookaroundKind::Lookahead, negate: true, .. }));
        assert!(matches!(assertions[5], Assertion::Lookaround { kind: LookaroundKind::Lookbehind, negate: true, .. }));
        assert_eq!(assertions[7], Assertion::End);

        assert!(parse_literal("/^*/").is_err());
        // Annex B quantifiable lookahead
        assert!(parse_literal("/(?=a)*/").is_ok());
        assert!(parse_literal("/(?=a)*/u").is_err());
        assert!(parse_literal("/(?<=a)?/").is_err());
    }

    #[test]
    fn escapes() {
        let ast = parse("/\\n\\x41\\u0042\\cJ\\0\\//");
        let values: Vec<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Character { value } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![0x0A, 0x41, 0x42, 0x0A, 0, '/' as u32]);

        let ast = parse("/\\u{1F600}\\uD83D\\uDE00/u");
        let values: Vec<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Character { value } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![0x1F600, 0x1F600]);

        // Identity escapes are only valid without `u`
        assert!(parse_literal("/\\a/").is_ok());
        assert!(parse_literal("/\\a/u").is_err());
        assert!(parse_literal("/\\/").is_err());
    }

    #[test]
    fn backreferences() {
        let ast = parse("/(a)\\1(?<x>b)\\k<x>/");
        let refs: Vec<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Backreference { resolved, .. } => Some(n.get(resolved.unwrap()).raw()),
                _ => None,
            })
            .collect();
        assert_eq!(refs, vec!["(a)", "(?<x>b)"]);

        // Forward reference
        let ast = parse("/\\1(a)/");
        assert!(matches!(ast.walk()[2].kind(), NodeKind::Backreference { resolved: Some(_), .. }));

        // Annex B: not a backreference without enough groups
        let ast = parse("/\\1a/");
        assert!(matches!(ast.walk()[2].kind(), NodeKind::Character { value: 1 }));
        let ast = parse("/\\8/");
        assert!(matches!(ast.walk()[2].kind(), NodeKind::Character { value } if *value == '8' as u32));
        assert!(parse_literal("/\\1/u").is_err());
        assert!(parse_literal("/(?<a>x)\\k<b>/").is_err());
        // `\k` is an identity escape without named groups
        assert!(parse_literal("/\\k/").is_ok());
    }

    #[test]
    fn classes() {
        let ast = parse("/[^a-z\\d-]/");
        let class = ast.walk()[2];
        let NodeKind::CharacterClass { negate, elements, .. } = class.kind() else {
            panic!("{class:?}");
        };
        assert!(*negate);
        let elements: Vec<_> = elements.iter().map(|&e| class.get(e).kind().name()).collect();
        assert_eq!(elements, vec!["CharacterClassRange", "CharacterSet", "Character"]);

        // Annex B
        assert!(parse_literal("/[\\d-z]/").is_ok());
        assert!(parse_literal("/[\\d-z]/u").is_err());
        assert!(parse_literal("/[z-a]/").is_err());
        assert!(parse_literal("/[a/").is_err());
        assert!(parse_literal("/[\\b]/").is_ok());
        assert!(parse_literal("/]/").is_ok());
        assert!(parse_literal("/]/u").is_err());
    }

    #[test]
    fn unicode_sets() {
        let ast = parse("/[\\w&&[a-z]][^[0-9]--5][\\q{abc|d}x]/v");
        let names = kinds(&ast);
        assert!(names.contains(&"ExpressionCharacterClass"));
        assert!(names.contains(&"ClassIntersection"));
        assert!(names.contains(&"ClassSubtraction"));
        assert!(names.contains(&"ClassStringDisjunction"));
        assert_eq!(names.iter().filter(|&&n| n == "StringAlternative").count(), 2);

        assert!(parse_literal("/[a&&b--c]/v").is_err());
        assert!(parse_literal("/[(]/v").is_err());
        assert!(parse_literal("/[a-z&&b]/v").is_err());
        assert!(parse_literal("/\\p{RGI_Emoji}/v").is_ok());
        assert!(parse_literal("/\\p{RGI_Emoji}/u").is_err());
    }

    #[test]
    fn properties() {
        let ast = parse("/\\p{Script=Greek}\\P{L}/u");
        let sets: Vec<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::CharacterSet(set) => Some(set.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            sets[0],
            CharacterSet::Property {
                key: Some("Script".into()),
                value: "Greek".into(),
                negate: false,
                strings: false
            }
        );
        assert!(matches!(&sets[1], CharacterSet::Property { key: None, negate: true, .. }));
        // `\p` is an identity escape without `u`
        assert!(matches!(parse("/\\p{L}/").walk()[2].kind(), NodeKind::Character { value } if *value == 'p' as u32));
    }

    #[test]
    fn nesting() {
        let nested = |open: &str, close: &str, n| {
            format!("/{}a{}/v", open.repeat(n), close.repeat(n))
        };
        assert!(parse_literal(&nested("(?:", ")", 249)).is_ok());
        assert!(parse_literal(&nested("(?=", ")", 249)).is_ok());
        assert!(parse_literal(&nested("[", "]", 249)).is_ok());

        let err = parse_literal(&nested("(?:", ")", 250)).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
        assert_eq!(err.offset, 250 * 3);
        assert!(parse_literal(&nested("(", ")", 100_000)).is_err());
        assert!(parse_literal(&nested("[", "]", 100_000)).is_err());
    }

    #[test]
    fn spans() {
        let ast = parse("/a(?:bc)+/");
        let raws: Vec<_> = ast.walk().iter().map(|n| n.raw()).collect();
        assert_eq!(raws, vec!["a(?:bc)+", "a(?:bc)+", "a", "(?:bc)+", "(?:bc)", "bc", "b", "c"]);
    }
}
