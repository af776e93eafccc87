//! An arena of immutable regex AST nodes.
//!
//! Nodes are addressed by [`NodeId`] and own nothing but ids of their children; the parent link is
//! a plain id as well. [`NodeRef`] pairs an id with its [`Ast`] for convenient navigation.
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    sync::atomic::{AtomicU32, Ordering},
};

use super::Flags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique per parsed [`Ast`] in this process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AstId(u32);

impl AstId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        AstId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a node across all ASTs. Used as the key of side tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub ast: AstId,
    pub node: NodeId,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Byte range in [`Ast::source`].
    pub span: Range<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Pattern {
        alternatives: Vec<NodeId>,
    },
    Alternative {
        elements: Vec<NodeId>,
    },
    /// `(?:...)`
    Group {
        alternatives: Vec<NodeId>,
    },
    CapturingGroup {
        /// 1-based, in order of the opening parentheses.
        index: u32,
        name: Option<String>,
        alternatives: Vec<NodeId>,
    },
    Quantifier {
        min: u32,
        /// `None` is unbounded.
        max: Option<u32>,
        greedy: bool,
        element: NodeId,
    },
    Assertion(Assertion),
    Backreference {
        reference: GroupRef,
        /// The referenced capturing group, if it exists.
        resolved: Option<NodeId>,
    },
    /// A single code point. May be a lone surrogate, hence `u32`.
    Character {
        value: u32,
    },
    CharacterClassRange {
        min: NodeId,
        max: NodeId,
    },
    CharacterSet(CharacterSet),
    CharacterClass {
        negate: bool,
        /// Parsed with the `v` flag.
        unicode_sets: bool,
        elements: Vec<NodeId>,
    },
    /// `[a&&b]`, `[^a--b]`
    ExpressionCharacterClass {
        negate: bool,
        expression: NodeId,
    },
    ClassIntersection {
        left: NodeId,
        right: NodeId,
    },
    ClassSubtraction {
        left: NodeId,
        right: NodeId,
    },
    /// `\q{abc|d}`
    ClassStringDisjunction {
        alternatives: Vec<NodeId>,
    },
    StringAlternative {
        elements: Vec<NodeId>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assertion {
    /// `^`
    Start,
    /// `$`
    End,
    /// `\b`, `\B`
    Word { negate: bool },
    Lookaround {
        kind: LookaroundKind,
        negate: bool,
        alternatives: Vec<NodeId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookaroundKind {
    Lookahead,
    Lookbehind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharacterSet {
    /// `.`
    Any,
    /// `\d`, `\D`
    Digit { negate: bool },
    /// `\s`, `\S`
    Space { negate: bool },
    /// `\w`, `\W`
    Word { negate: bool },
    /// `\p{..}`, `\P{..}`
    Property {
        key: Option<String>,
        value: String,
        negate: bool,
        /// A property of strings, e.g. `\p{RGI_Emoji}`.
        strings: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupRef {
    Index(u32),
    Name(String),
}

impl NodeKind {
    /// Kind name, for messages and debugging.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Pattern { .. } => "Pattern",
            NodeKind::Alternative { .. } => "Alternative",
            NodeKind::Group { .. } => "Group",
            NodeKind::CapturingGroup { .. } => "CapturingGroup",
            NodeKind::Quantifier { .. } => "Quantifier",
            NodeKind::Assertion(_) => "Assertion",
            NodeKind::Backreference { .. } => "Backreference",
            NodeKind::Character { .. } => "Character",
            NodeKind::CharacterClassRange { .. } => "CharacterClassRange",
            NodeKind::CharacterSet(_) => "CharacterSet",
            NodeKind::CharacterClass { .. } => "CharacterClass",
            NodeKind::ExpressionCharacterClass { .. } => "ExpressionCharacterClass",
            NodeKind::ClassIntersection { .. } => "ClassIntersection",
            NodeKind::ClassSubtraction { .. } => "ClassSubtraction",
            NodeKind::ClassStringDisjunction { .. } => "ClassStringDisjunction",
            NodeKind::StringAlternative { .. } => "StringAlternative",
        }
    }

    /// Alternatives of a pattern, group or lookaround.
    pub fn alternatives(&self) -> Option<&[NodeId]> {
        match self {
            NodeKind::Pattern { alternatives }
            | NodeKind::Group { alternatives }
            | NodeKind::CapturingGroup { alternatives, .. }
            | NodeKind::Assertion(Assertion::Lookaround { alternatives, .. }) => Some(alternatives),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Pattern { alternatives }
            | NodeKind::Group { alternatives }
            | NodeKind::CapturingGroup { alternatives, .. }
            | NodeKind::Assertion(Assertion::Lookaround { alternatives, .. })
            | NodeKind::ClassStringDisjunction { alternatives } => alternatives.clone(),
            NodeKind::Alternative { elements }
            | NodeKind::CharacterClass { elements, .. }
            | NodeKind::StringAlternative { elements } => elements.clone(),
            NodeKind::Quantifier { element, .. } => vec![*element],
            NodeKind::ExpressionCharacterClass { expression, .. } => vec![*expression],
            NodeKind::CharacterClassRange { min: left, max: right }
            | NodeKind::ClassIntersection { left, right }
            | NodeKind::ClassSubtraction { left, right } => vec![*left, *right],
            NodeKind::Assertion(_)
            | NodeKind::Backreference { .. }
            | NodeKind::Character { .. }
            | NodeKind::CharacterSet(_) => Vec::new(),
        }
    }
}

/// A parsed regular expression: the pattern source, its flags and the node arena.
pub struct Ast {
    pub(crate) id: AstId,
    pub(crate) source: String,
    pub(crate) flags: Flags,
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Ast {
    pub fn id(&self) -> AstId {
        self.id
    }

    /// The pattern source, without the surrounding `/` and flags.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The [`NodeKind::Pattern`] node.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        debug_assert!(id.index() < self.nodes.len());
        NodeRef { ast: self, id }
    }

    /// All nodes in pre-order, i.e. document order with parents before children.
    pub fn walk(&self) -> Vec<NodeRef<'_>> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children().rev());
        }
        nodes
    }

    /// Capturing groups ordered by index.
    pub fn capturing_groups(&self) -> Vec<NodeRef<'_>> {
        let mut groups: Vec<_> = self
            .walk()
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::CapturingGroup { .. }))
            .collect();
        groups.sort_by_key(|n| match n.kind() {
            NodeKind::CapturingGroup { index, .. } => *index,
            _ => unreachable!(),
        });
        groups
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// A node together with the [`Ast`] it lives in.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn ast(self) -> &'a Ast {
        self.ast
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn key(self) -> NodeKey {
        NodeKey {
            ast: self.ast.id,
            node: self.id,
        }
    }

    fn node(self) -> &'a Node {
        &self.ast.nodes[self.id.index()]
    }

    pub fn kind(self) -> &'a NodeKind {
        &self.node().kind
    }

    pub fn span(self) -> Range<usize> {
        self.node().span.clone()
    }

    /// The source text of this node.
    pub fn raw(self) -> &'a str {
        &self.ast.source[self.node().span.clone()]
    }

    pub fn flags(self) -> Flags {
        self.ast.flags
    }

    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.get(id))
    }

    /// Another node of the same AST.
    pub fn get(self, id: NodeId) -> NodeRef<'a> {
        self.ast.node(id)
    }

    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> {
        let ast = self.ast;
        self.kind().children().into_iter().map(move |id| ast.node(id))
    }

    /// Alternatives of a pattern, group or lookaround; empty for other nodes.
    pub fn alternatives(self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator {
        let ast = self.ast;
        self.kind()
            .alternatives()
            .unwrap_or_default()
            .iter()
            .map(move |&id| ast.node(id))
    }

    /// Elements of an alternative; empty for other nodes.
    pub fn elements(self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator {
        let ast = self.ast;
        let elements: &'a [NodeId] = match self.kind() {
            NodeKind::Alternative { elements } => elements,
            _ => &[],
        };
        elements.iter().map(move |&id| ast.node(id))
    }

    /// Strict ancestors, from the parent up to the pattern.
    pub fn ancestors(self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(self, other: NodeRef<'_>) -> bool {
        self.ast.id == other.ast.id && other.ancestors().any(|a| a.id == self.id)
    }

    /// The descendants of this node, including itself, in pre-order.
    pub fn descendants(self) -> Vec<NodeRef<'a>> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children().rev());
        }
        nodes
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind().name(), self.raw())
    }
}
