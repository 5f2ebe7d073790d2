// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract syntax tree.
//!
//! **DDD Context:** Source Analysis
//!
//! Nodes live in a per-file arena ([`SyntaxTree`]) and refer to each other by
//! [`NodeId`]. Children are ordered; every node except the compilation unit
//! has a parent link, which gives O(1) ancestor queries without shared
//! ownership.
//!
//! The tree shape is fixed once the parser returns. Later passes may still
//! write to a node's metadata bag ([`Node::set_meta`]).

mod late_bound;
pub mod visitor;

use std::cell::RefCell;
use std::collections::BTreeMap;

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::source_analysis::Span;

pub use late_bound::{LateBoundKeyword, LateBoundReference};
pub use visitor::{walk_children, AstVisitor};

/// Identifies a parsed file within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Identifies a node. Unique within a run because every parsed file gets its
/// own [`FileId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    file: FileId,
    index: u32,
}

impl NodeId {
    #[must_use]
    pub const fn new(file: FileId, index: u32) -> Self {
        Self { file, index }
    }

    #[must_use]
    pub const fn file(self) -> FileId {
        self.file
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }
}

/// Method, property and class visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// Declaration modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
}

impl Modifiers {
    /// Declared visibility, public when omitted.
    #[must_use]
    pub fn visibility(self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Public)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

/// What a trait adaptation rule does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdaptationAction {
    /// `T::m insteadof U, V`
    Precedence { excluded: Vec<EcoString> },
    /// `T::m as [visibility] [alias]`
    Alias {
        visibility: Option<Visibility>,
        alias: Option<EcoString>,
    },
}

/// The closed set of node kinds.
///
/// Names of classes, interfaces, traits and functions in declaration and
/// reference nodes are fully qualified (`Foo\Bar`, no leading backslash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Declarations
    CompilationUnit,
    Namespace {
        name: EcoString,
    },
    UseImport {
        name: EcoString,
        alias: EcoString,
    },
    Class {
        name: EcoString,
        modifiers: Modifiers,
        parent: Option<EcoString>,
        interfaces: Vec<EcoString>,
    },
    Interface {
        name: EcoString,
        parents: Vec<EcoString>,
    },
    Trait {
        name: EcoString,
    },
    Function {
        name: EcoString,
        by_ref: bool,
    },
    Method {
        name: EcoString,
        modifiers: Modifiers,
        by_ref: bool,
    },
    PropertyDeclaration {
        modifiers: Modifiers,
    },
    Property {
        name: EcoString,
    },
    ConstantDeclaration,
    ConstantDeclarator {
        name: EcoString,
    },
    FormalParameters,
    FormalParameter {
        name: EcoString,
        type_hint: Option<EcoString>,
        by_ref: bool,
        variadic: bool,
    },
    TraitUse {
        traits: Vec<EcoString>,
    },
    TraitAdaptation {
        trait_name: Option<EcoString>,
        method: EcoString,
        action: AdaptationAction,
    },

    // Statements
    Scope,
    ExpressionStatement,
    Echo,
    If,
    ElseIf,
    Else,
    While,
    DoWhile,
    For,
    ForInit,
    ForCondition,
    ForUpdate,
    Foreach {
        by_ref: bool,
    },
    Switch,
    SwitchLabel {
        is_default: bool,
    },
    Break,
    Continue,
    Return,
    Try,
    Catch {
        types: Vec<EcoString>,
        variable: EcoString,
    },
    Finally,
    Throw,
    Global,
    StaticVariables,
    Unset,

    // Expressions
    Assignment {
        op: EcoString,
    },
    Conditional,
    LogicalOr,
    LogicalAnd,
    LogicalXor,
    BooleanOr,
    BooleanAnd,
    Binary {
        op: EcoString,
    },
    Unary {
        op: EcoString,
    },
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    Cast {
        to: EcoString,
    },
    Instanceof,
    Allocation,
    Clone,
    Parenthesized,
    Variable {
        name: EcoString,
    },
    VariableVariable,
    Literal {
        kind: LiteralKind,
        image: EcoString,
    },
    Identifier {
        name: EcoString,
    },
    Constant {
        name: EcoString,
    },
    ClassReference {
        name: EcoString,
    },
    LateBound(LateBoundReference),
    MemberPrimaryPrefix {
        is_static: bool,
    },
    PropertyPostfix {
        name: EcoString,
    },
    MethodPostfix {
        name: EcoString,
    },
    ConstantPostfix {
        name: EcoString,
    },
    FunctionPostfix,
    Arguments,
    ArrayIndex,
    StringIndex,
    Array {
        short: bool,
    },
    ArrayElement {
        by_ref: bool,
    },
    Closure {
        is_static: bool,
        by_ref: bool,
    },
    ClosureUses,
    Isset,
    Empty,
    Exit,
    Print,
    Include {
        kind: IncludeKind,
    },
}

impl NodeKind {
    /// A stable name for the kind, without payload.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CompilationUnit => "CompilationUnit",
            Self::Namespace { .. } => "Namespace",
            Self::UseImport { .. } => "UseImport",
            Self::Class { .. } => "Class",
            Self::Interface { .. } => "Interface",
            Self::Trait { .. } => "Trait",
            Self::Function { .. } => "Function",
            Self::Method { .. } => "Method",
            Self::PropertyDeclaration { .. } => "PropertyDeclaration",
            Self::Property { .. } => "Property",
            Self::ConstantDeclaration => "ConstantDeclaration",
            Self::ConstantDeclarator { .. } => "ConstantDeclarator",
            Self::FormalParameters => "FormalParameters",
            Self::FormalParameter { .. } => "FormalParameter",
            Self::TraitUse { .. } => "TraitUse",
            Self::TraitAdaptation { .. } => "TraitAdaptation",
            Self::Scope => "Scope",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::Echo => "Echo",
            Self::If => "If",
            Self::ElseIf => "ElseIf",
            Self::Else => "Else",
            Self::While => "While",
            Self::DoWhile => "DoWhile",
            Self::For => "For",
            Self::ForInit => "ForInit",
            Self::ForCondition => "ForCondition",
            Self::ForUpdate => "ForUpdate",
            Self::Foreach { .. } => "Foreach",
            Self::Switch => "Switch",
            Self::SwitchLabel { .. } => "SwitchLabel",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::Return => "Return",
            Self::Try => "Try",
            Self::Catch { .. } => "Catch",
            Self::Finally => "Finally",
            Self::Throw => "Throw",
            Self::Global => "Global",
            Self::StaticVariables => "StaticVariables",
            Self::Unset => "Unset",
            Self::Assignment { .. } => "Assignment",
            Self::Conditional => "Conditional",
            Self::LogicalOr => "LogicalOr",
            Self::LogicalAnd => "LogicalAnd",
            Self::LogicalXor => "LogicalXor",
            Self::BooleanOr => "BooleanOr",
            Self::BooleanAnd => "BooleanAnd",
            Self::Binary { .. } => "Binary",
            Self::Unary { .. } => "Unary",
            Self::PreIncrement => "PreIncrement",
            Self::PreDecrement => "PreDecrement",
            Self::PostIncrement => "PostIncrement",
            Self::PostDecrement => "PostDecrement",
            Self::Cast { .. } => "Cast",
            Self::Instanceof => "Instanceof",
            Self::Allocation => "Allocation",
            Self::Clone => "Clone",
            Self::Parenthesized => "Parenthesized",
            Self::Variable { .. } => "Variable",
            Self::VariableVariable => "VariableVariable",
            Self::Literal { .. } => "Literal",
            Self::Identifier { .. } => "Identifier",
            Self::Constant { .. } => "Constant",
            Self::ClassReference { .. } => "ClassReference",
            Self::LateBound(_) => "LateBound",
            Self::MemberPrimaryPrefix { .. } => "MemberPrimaryPrefix",
            Self::PropertyPostfix { .. } => "PropertyPostfix",
            Self::MethodPostfix { .. } => "MethodPostfix",
            Self::ConstantPostfix { .. } => "ConstantPostfix",
            Self::FunctionPostfix => "FunctionPostfix",
            Self::Arguments => "Arguments",
            Self::ArrayIndex => "ArrayIndex",
            Self::StringIndex => "StringIndex",
            Self::Array { .. } => "Array",
            Self::ArrayElement { .. } => "ArrayElement",
            Self::Closure { .. } => "Closure",
            Self::ClosureUses => "ClosureUses",
            Self::Isset => "Isset",
            Self::Empty => "Empty",
            Self::Exit => "Exit",
            Self::Print => "Print",
            Self::Include { .. } => "Include",
        }
    }

    /// Class, interface or trait.
    #[must_use]
    pub const fn is_type_declaration(&self) -> bool {
        matches!(
            self,
            Self::Class { .. } | Self::Interface { .. } | Self::Trait { .. }
        )
    }
}

/// Value stored in a node's metadata bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(EcoString),
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    doc_comment: Option<EcoString>,
    #[serde(default)]
    metadata: RefCell<BTreeMap<EcoString, MetaValue>>,
}

impl Node {
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn doc_comment(&self) -> Option<&EcoString> {
        self.doc_comment.as_ref()
    }

    #[must_use]
    pub fn meta(&self, key: &str) -> Option<MetaValue> {
        self.metadata.borrow().get(key).cloned()
    }

    /// Writes to the metadata bag. The tree shape stays untouched.
    pub fn set_meta(&self, key: impl Into<EcoString>, value: MetaValue) {
        self.metadata.borrow_mut().insert(key.into(), value);
    }
}

/// All nodes of one parsed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    file: FileId,
    nodes: Vec<Node>,
    root: u32,
}

impl SyntaxTree {
    #[must_use]
    pub fn file(&self) -> FileId {
        self.file
    }

    /// The compilation unit.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::new(self.file, self.root)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks a node up, returning `None` for ids of another file.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.file != self.file {
            return None;
        }
        self.nodes.get(id.index as usize)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        debug_assert_eq!(id.file, self.file, "node id from another file");
        &self.nodes[id.index as usize]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Walks parent links up to the root, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// The nearest ancestor whose kind matches.
    pub fn find_ancestor(
        &self,
        id: NodeId,
        predicate: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(id).find(|&ancestor| predicate(self.kind(ancestor)))
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// All nodes with their ids, in creation order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "node counts are bounded by source size, which is under 4GB"
    )]
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(self.file, index as u32), node))
    }
}

/// Arena builder used by the parser. Children are created before their
/// parent, so `push` adopts them.
#[derive(Debug)]
pub struct TreeBuilder {
    file: FileId,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            nodes: Vec::new(),
        }
    }

    #[must_use]
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Adds a node and sets the parent link of each child.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "node counts are bounded by source size, which is under 4GB"
    )]
    pub fn push(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId::new(self.file, self.nodes.len() as u32);
        for child in &children {
            self.nodes[child.index as usize].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            children,
            doc_comment: None,
            metadata: RefCell::default(),
        });
        id
    }

    pub fn set_doc_comment(&mut self, id: NodeId, doc: Option<EcoString>) {
        self.nodes[id.index as usize].doc_comment = doc;
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index as usize].kind
    }

    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index as usize].span
    }

    /// Finishes the tree with `root` as its compilation unit.
    #[must_use]
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            file: self.file,
            nodes: self.nodes,
            root: root.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::LineColumn;

    fn span(start: u32, end: u32) -> Span {
        Span::new(
            start..end,
            LineColumn::new(1, start + 1),
            LineColumn::new(1, end),
        )
    }

    fn small_tree() -> (SyntaxTree, NodeId, NodeId) {
        let mut builder = TreeBuilder::new(FileId(3));
        let var = builder.push(NodeKind::Variable { name: "$a".into() }, span(6, 8), vec![]);
        let stmt = builder.push(NodeKind::ExpressionStatement, span(6, 9), vec![var]);
        let root = builder.push(NodeKind::CompilationUnit, span(0, 9), vec![stmt]);
        (builder.finish(root), var, stmt)
    }

    #[test]
    fn builder_links_parents() {
        let (tree, var, stmt) = small_tree();
        assert_eq!(tree.parent(var), Some(stmt));
        assert_eq!(tree.parent(stmt), Some(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.ancestors(var).collect::<Vec<_>>(), vec![stmt, tree.root()]);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (tree, var, stmt) = small_tree();
        assert_eq!(tree.descendants(tree.root()), vec![stmt, var]);
    }

    #[test]
    fn get_rejects_foreign_ids() {
        let (tree, _, _) = small_tree();
        assert!(tree.get(NodeId::new(FileId(9), 0)).is_none());
        assert!(tree.get(NodeId::new(FileId(3), 0)).is_some());
    }

    #[test]
    fn metadata_bag_is_writable_through_shared_reference() {
        let (tree, var, _) = small_tree();
        let node = tree.node(var);
        assert_eq!(node.meta("type_id"), None);
        node.set_meta("type_id", MetaValue::Int(4));
        assert_eq!(node.meta("type_id"), Some(MetaValue::Int(4)));
    }

    #[test]
    fn find_ancestor_by_kind() {
        let (tree, var, stmt) = small_tree();
        assert_eq!(
            tree.find_ancestor(var, |kind| matches!(kind, NodeKind::ExpressionStatement)),
            Some(stmt)
        );
        assert_eq!(
            tree.find_ancestor(var, |kind| matches!(kind, NodeKind::Switch)),
            None
        );
    }

    #[test]
    fn default_visibility_is_public() {
        assert_eq!(Modifiers::default().visibility(), Visibility::Public);
    }
}
