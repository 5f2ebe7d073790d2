// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Double-dispatch traversal over syntax trees.
//!
//! [`SyntaxTree::accept`] picks the `visit_*` method for a node's kind. Every
//! method defaults to [`AstVisitor::visit_node`], which walks the children.
//! An override that wants to keep descending calls [`walk_children`]; one
//! that does not simply returns, skipping the subtree.

use super::{NodeId, NodeKind, SyntaxTree};

#[allow(unused_variables)]
pub trait AstVisitor {
    /// Fallback for every kind without a dedicated method.
    fn visit_node(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }

    fn visit_class(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_interface(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_trait(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_function(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_closure(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_if(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_else_if(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_while(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_do_while(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_for(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_foreach(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_switch(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_switch_label(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_catch(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_conditional(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_boolean_and(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_boolean_or(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_logical_and(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_logical_or(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_logical_xor(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_allocation(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_late_bound(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_method_postfix(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_function_postfix(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_variable(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }

    fn visit_literal(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.visit_node(tree, id);
    }
}

/// Visits each child of `id` in order.
pub fn walk_children<V: AstVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, id: NodeId) {
    for &child in tree.children(id) {
        tree.accept(child, visitor);
    }
}

impl SyntaxTree {
    /// Dispatches `id` to the matching `visit_*` method.
    pub fn accept<V: AstVisitor + ?Sized>(&self, id: NodeId, visitor: &mut V) {
        match self.kind(id) {
            NodeKind::Class { .. } => visitor.visit_class(self, id),
            NodeKind::Interface { .. } => visitor.visit_interface(self, id),
            NodeKind::Trait { .. } => visitor.visit_trait(self, id),
            NodeKind::Function { .. } => visitor.visit_function(self, id),
            NodeKind::Method { .. } => visitor.visit_method(self, id),
            NodeKind::Closure { .. } => visitor.visit_closure(self, id),
            NodeKind::If => visitor.visit_if(self, id),
            NodeKind::ElseIf => visitor.visit_else_if(self, id),
            NodeKind::While => visitor.visit_while(self, id),
            NodeKind::DoWhile => visitor.visit_do_while(self, id),
            NodeKind::For => visitor.visit_for(self, id),
            NodeKind::Foreach { .. } => visitor.visit_foreach(self, id),
            NodeKind::Switch => visitor.visit_switch(self, id),
            NodeKind::SwitchLabel { .. } => visitor.visit_switch_label(self, id),
            NodeKind::Catch { .. } => visitor.visit_catch(self, id),
            NodeKind::Conditional => visitor.visit_conditional(self, id),
            NodeKind::BooleanAnd => visitor.visit_boolean_and(self, id),
            NodeKind::BooleanOr => visitor.visit_boolean_or(self, id),
            NodeKind::LogicalAnd => visitor.visit_logical_and(self, id),
            NodeKind::LogicalOr => visitor.visit_logical_or(self, id),
            NodeKind::LogicalXor => visitor.visit_logical_xor(self, id),
            NodeKind::Assignment { .. } => visitor.visit_assignment(self, id),
            NodeKind::Allocation => visitor.visit_allocation(self, id),
            NodeKind::LateBound(_) => visitor.visit_late_bound(self, id),
            NodeKind::MethodPostfix { .. } => visitor.visit_method_postfix(self, id),
            NodeKind::FunctionPostfix => visitor.visit_function_postfix(self, id),
            NodeKind::Variable { .. } => visitor.visit_variable(self, id),
            NodeKind::Literal { .. } => visitor.visit_literal(self, id),
            _ => visitor.visit_node(self, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::parse_ok;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<&'static str>,
    }

    impl AstVisitor for Recorder {
        fn visit_node(&mut self, tree: &SyntaxTree, id: NodeId) {
            self.seen.push(tree.kind(id).label());
            walk_children(self, tree, id);
        }

        // Skips method bodies entirely.
        fn visit_method(&mut self, _tree: &SyntaxTree, _id: NodeId) {
            self.seen.push("Method");
        }
    }

    #[test]
    fn traversal_is_pre_order_and_skippable() {
        let tree = parse_ok("<?php class A { function m() { $x = 1; } } $y;");
        let mut recorder = Recorder::default();
        tree.accept(tree.root(), &mut recorder);
        assert_eq!(
            recorder.seen,
            vec![
                "CompilationUnit",
                "Class",
                "Method",
                "ExpressionStatement",
                "Variable",
            ]
        );
    }

    #[test]
    fn dedicated_methods_are_dispatched() {
        struct Counter(usize);
        impl AstVisitor for Counter {
            fn visit_switch_label(&mut self, tree: &SyntaxTree, id: NodeId) {
                self.0 += 1;
                walk_children(self, tree, id);
            }
        }

        let tree = parse_ok("<?php switch ($a) { case 1: case 2: break; default: }");
        let mut counter = Counter(0);
        tree.accept(tree.root(), &mut counter);
        assert_eq!(counter.0, 3);
    }
}
