// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! Binary operators go through a Pratt loop driven by
//! [`binary_binding_power`]. Unary operators, casts and `new` sit above it,
//! then postfix chains (`->`, `::`, `[]`, calls), then primaries.

use ecow::EcoString;

use crate::ast::{
    IncludeKind, LateBoundKeyword, LateBoundReference, LiteralKind, NodeId, NodeKind,
};
use crate::source_analysis::{Keyword, ParseError, ParseErrorKind, ScopeViolation, Span, TokenKind};

use super::{
    binary_binding_power, is_assignment_operator, ParseResult, Parser, ASSIGNMENT_RHS_BP,
    NOT_OPERAND_BP, TERNARY_BP, UNARY_OPERAND_BP,
};

impl Parser {
    pub(super) fn parse_expression(&mut self) -> ParseResult<NodeId> {
        self.parse_expression_bp(0)
    }

    fn parse_expression_bp(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        self.enter_nesting()?;
        let result = self.parse_binary(min_bp);
        self.leave_nesting();
        result
    }

    fn parse_binary(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            if self.check(&TokenKind::Question) {
                if TERNARY_BP.left < min_bp {
                    break;
                }
                left = self.parse_ternary(left)?;
                continue;
            }

            let op: EcoString = match self.current_kind() {
                TokenKind::Operator => self.current_token().text().clone(),
                TokenKind::Keyword(keyword) if keyword.is_operator() => {
                    self.current_token().text().to_ascii_lowercase().into()
                }
                _ => break,
            };
            let Some(bp) = binary_binding_power(&op) else {
                break;
            };
            if bp.left < min_bp {
                break;
            }
            self.advance();

            let right = if op == "instanceof" {
                self.parse_instanceof_target(bp.right)?
            } else {
                self.parse_expression_bp(bp.right)?
            };
            let kind = match op.as_str() {
                "or" => NodeKind::LogicalOr,
                "and" => NodeKind::LogicalAnd,
                "xor" => NodeKind::LogicalXor,
                "||" => NodeKind::BooleanOr,
                "&&" => NodeKind::BooleanAnd,
                "instanceof" => NodeKind::Instanceof,
                _ => NodeKind::Binary { op },
            };
            let span = self.span_from(self.node_span(left));
            left = self.push(kind, span, vec![left, right]);
        }
        Ok(left)
    }

    /// `cond ? then : else` and the short form `cond ?: else`.
    fn parse_ternary(&mut self, condition: NodeId) -> ParseResult<NodeId> {
        self.advance();
        let mut children = vec![condition];
        if !self.eat(&TokenKind::Colon) {
            children.push(self.parse_expression()?);
            self.expect(&TokenKind::Colon, "':'")?;
        }
        children.push(self.parse_expression_bp(TERNARY_BP.right)?);
        let span = self.span_from(self.node_span(condition));
        Ok(self.push(NodeKind::Conditional, span, children))
    }

    /// The class operand of `instanceof`.
    fn parse_instanceof_target(&mut self, bp: u8) -> ParseResult<NodeId> {
        match self.current_kind() {
            TokenKind::Identifier | TokenKind::Backslash => {
                let (written, span) = self.parse_name()?;
                let name = self.names.resolve_class(&written);
                Ok(self.push(NodeKind::ClassReference { name }, span, vec![]))
            }
            TokenKind::Keyword(keyword) if keyword.is_late_bound() => self.parse_late_bound(),
            _ => self.parse_expression_bp(bp),
        }
    }

    // ========================================================================
    // Unary
    // ========================================================================

    fn parse_unary(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::Operator => {
                let op = self.current_token().text().clone();
                let (kind, bp) = match op.as_str() {
                    "!" => (NodeKind::Unary { op }, NOT_OPERAND_BP),
                    "-" | "+" | "~" | "@" => (NodeKind::Unary { op }, UNARY_OPERAND_BP),
                    "++" => (NodeKind::PreIncrement, UNARY_OPERAND_BP),
                    "--" => (NodeKind::PreDecrement, UNARY_OPERAND_BP),
                    _ => return Err(self.unexpected(&["expression"])),
                };
                self.advance();
                let operand = self.parse_expression_bp(bp)?;
                let span = self.span_from(start);
                Ok(self.push(kind, span, vec![operand]))
            }
            TokenKind::Cast => {
                let text = self.advance().text().clone();
                let to: EcoString = text
                    .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
                    .to_ascii_lowercase()
                    .into();
                let operand = self.parse_expression_bp(UNARY_OPERAND_BP)?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Cast { to }, span, vec![operand]))
            }
            TokenKind::Keyword(Keyword::New) => {
                let allocation = self.parse_new()?;
                self.parse_postfix_chain(allocation)
            }
            TokenKind::Keyword(Keyword::Clone) => {
                self.advance();
                let operand = self.parse_expression_bp(UNARY_OPERAND_BP)?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Clone, span, vec![operand]))
            }
            TokenKind::Keyword(Keyword::Print) => {
                self.advance();
                let operand = self.parse_expression_bp(ASSIGNMENT_RHS_BP)?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Print, span, vec![operand]))
            }
            TokenKind::Keyword(
                keyword @ (Keyword::Include
                | Keyword::IncludeOnce
                | Keyword::Require
                | Keyword::RequireOnce),
            ) => {
                let kind = match keyword {
                    Keyword::Include => IncludeKind::Include,
                    Keyword::IncludeOnce => IncludeKind::IncludeOnce,
                    Keyword::Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                self.advance();
                let operand = self.parse_expression_bp(ASSIGNMENT_RHS_BP)?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Include { kind }, span, vec![operand]))
            }
            _ => self.parse_postfix(),
        }
    }

    /// `new Name(args)`, `new self`, `new $class`, `new (expr)`.
    fn parse_new(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let target = match self.current_kind() {
            TokenKind::Identifier | TokenKind::Backslash | TokenKind::Keyword(Keyword::Namespace) => {
                let (written, span) = self.parse_name()?;
                let name = self.names.resolve_class(&written);
                self.push(NodeKind::ClassReference { name }, span, vec![])
            }
            TokenKind::Keyword(keyword) if keyword.is_late_bound() => self.parse_late_bound()?,
            TokenKind::Variable | TokenKind::Dollar => self.parse_dynamic_class_name()?,
            TokenKind::LeftParen => self.parse_parenthesized()?,
            _ => return Err(self.unexpected(&["class name"])),
        };
        let mut children = vec![target];
        if self.check(&TokenKind::LeftParen) {
            children.push(self.parse_arguments()?);
        }
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Allocation, span, children))
    }

    /// A class name held in a variable, property or array element. Calls
    /// are excluded so that `new $a->b()` passes arguments to the
    /// constructor.
    fn parse_dynamic_class_name(&mut self) -> ParseResult<NodeId> {
        let mut base = self.parse_variable()?;
        loop {
            base = match self.current_kind() {
                TokenKind::LeftBracket => self.parse_array_index(base)?,
                TokenKind::Arrow => {
                    self.advance();
                    let (name, _) = self.parse_member_name_or_variable()?;
                    let postfix_span = self.last_consumed_span();
                    let postfix = self.push(NodeKind::PropertyPostfix { name }, postfix_span, vec![]);
                    let span = self.span_from(self.node_span(base));
                    self.push(
                        NodeKind::MemberPrimaryPrefix { is_static: false },
                        span,
                        vec![base, postfix],
                    )
                }
                TokenKind::DoubleColon if self.peek_kind(1) == &TokenKind::Variable => {
                    self.advance();
                    let token = self.advance();
                    let postfix = self.push(
                        NodeKind::PropertyPostfix {
                            name: token.text().clone(),
                        },
                        token.span(),
                        vec![],
                    );
                    let span = self.span_from(self.node_span(base));
                    self.push(
                        NodeKind::MemberPrimaryPrefix { is_static: true },
                        span,
                        vec![base, postfix],
                    )
                }
                _ => return Ok(base),
            };
        }
    }

    // ========================================================================
    // Postfix
    // ========================================================================

    fn parse_postfix(&mut self) -> ParseResult<NodeId> {
        let primary = self.parse_primary()?;
        let chain = self.parse_postfix_chain(primary)?;
        if self.current_kind() == &TokenKind::Operator
            && is_assignment_operator(self.current_token().text())
            && is_assignable(self.tree.kind(chain))
        {
            return self.parse_assignment(chain);
        }
        Ok(chain)
    }

    fn parse_postfix_chain(&mut self, mut base: NodeId) -> ParseResult<NodeId> {
        loop {
            base = match self.current_kind() {
                TokenKind::LeftBracket => self.parse_array_index(base)?,
                TokenKind::LeftBrace
                    if self.current_token().leading_trivia().is_empty()
                        && is_indexable(self.tree.kind(base)) =>
                {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RightBrace, "'}'")?;
                    let span = self.span_from(self.node_span(base));
                    self.push(NodeKind::StringIndex, span, vec![base, index])
                }
                TokenKind::Arrow => self.parse_member_access(base, false)?,
                TokenKind::DoubleColon => self.parse_member_access(base, true)?,
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    let span = self.span_from(self.node_span(base));
                    self.push(NodeKind::FunctionPostfix, span, vec![base, arguments])
                }
                TokenKind::Operator if self.check_operator("++") || self.check_operator("--") => {
                    let kind = if self.advance().text() == "++" {
                        NodeKind::PostIncrement
                    } else {
                        NodeKind::PostDecrement
                    };
                    let span = self.span_from(self.node_span(base));
                    return Ok(self.push(kind, span, vec![base]));
                }
                _ => return Ok(base),
            };
        }
    }

    fn parse_array_index(&mut self, base: NodeId) -> ParseResult<NodeId> {
        self.advance();
        let mut children = vec![base];
        if !self.check(&TokenKind::RightBracket) {
            children.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RightBracket, "']'")?;
        let span = self.span_from(self.node_span(base));
        Ok(self.push(NodeKind::ArrayIndex, span, children))
    }

    /// `base->member`, `base::member`. The postfix is a method call when
    /// arguments follow, a constant for `::NAME`, otherwise a property.
    fn parse_member_access(&mut self, base: NodeId, is_static: bool) -> ParseResult<NodeId> {
        self.advance();
        let postfix_start = self.current_span();
        let (name, is_variable) = if self.check(&TokenKind::LeftBrace) {
            self.advance();
            self.parse_expression()?;
            self.expect(&TokenKind::RightBrace, "'}'")?;
            (EcoString::from("{}"), true)
        } else {
            let is_variable = self.check(&TokenKind::Variable);
            (self.parse_member_name_or_variable()?.0, is_variable)
        };

        let postfix = if self.check(&TokenKind::LeftParen) {
            let arguments = self.parse_arguments()?;
            let span = self.span_from(postfix_start);
            self.push(NodeKind::MethodPostfix { name }, span, vec![arguments])
        } else if is_static && !is_variable {
            let span = self.span_from(postfix_start);
            self.push(NodeKind::ConstantPostfix { name }, span, vec![])
        } else {
            let span = self.span_from(postfix_start);
            self.push(NodeKind::PropertyPostfix { name }, span, vec![])
        };
        let span = self.span_from(self.node_span(base));
        Ok(self.push(
            NodeKind::MemberPrimaryPrefix { is_static },
            span,
            vec![base, postfix],
        ))
    }

    fn parse_member_name_or_variable(&mut self) -> ParseResult<(EcoString, Span)> {
        if self.check(&TokenKind::Variable) {
            let token = self.advance();
            return Ok((token.text().clone(), token.span()));
        }
        self.parse_member_name()
    }

    /// `target = value`, `target .= value`, `target = &value`.
    fn parse_assignment(&mut self, target: NodeId) -> ParseResult<NodeId> {
        let mut op = self.advance().text().clone();
        if op == "=" && self.eat_operator("&") {
            op = "=&".into();
        }
        let value = self.parse_expression_bp(ASSIGNMENT_RHS_BP)?;
        let span = self.span_from(self.node_span(target));
        Ok(self.push(NodeKind::Assignment { op }, span, vec![target, value]))
    }

    /// `( [arg, ...] )`. Spread, by-reference and named arguments reduce to
    /// their value expression.
    fn parse_arguments(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(&TokenKind::LeftParen, "'('")?.span();
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            if self.check(&TokenKind::Ellipsis) && self.peek_kind(1) == &TokenKind::RightParen {
                // First-class callable syntax: `f(...)`.
                self.advance();
                break;
            }
            self.eat(&TokenKind::Ellipsis);
            self.eat_operator("&");
            if matches!(
                self.current_kind(),
                TokenKind::Identifier | TokenKind::Keyword(_)
            ) && self.peek_kind(1) == &TokenKind::Colon
            {
                self.advance();
                self.advance();
            }
            arguments.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Arguments, span, arguments))
    }

    // ========================================================================
    // Primary
    // ========================================================================

    #[allow(clippy::too_many_lines)]
    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::Variable | TokenKind::Dollar => self.parse_variable(),
            TokenKind::Integer | TokenKind::Float | TokenKind::String => {
                let kind = match self.current_kind() {
                    TokenKind::Integer => LiteralKind::Integer,
                    TokenKind::Float => LiteralKind::Float,
                    _ => LiteralKind::String,
                };
                let token = self.advance();
                Ok(self.push(
                    NodeKind::Literal {
                        kind,
                        image: token.text().clone(),
                    },
                    token.span(),
                    vec![],
                ))
            }
            TokenKind::Identifier
                if self.current_token().text().eq_ignore_ascii_case("fn")
                    && (self.peek_kind(1) == &TokenKind::LeftParen
                        || self.peek_token(1).is_operator("&")) =>
            {
                self.parse_arrow_function(start, false)
            }
            TokenKind::Identifier | TokenKind::Backslash => self.parse_name_expression(),
            TokenKind::Keyword(Keyword::Namespace) if self.peek_kind(1) == &TokenKind::Backslash => {
                self.parse_name_expression()
            }
            TokenKind::Keyword(Keyword::Static)
                if self.peek_token(1).is_keyword(Keyword::Function)
                    || self.peek_token(1).text().eq_ignore_ascii_case("fn") =>
            {
                self.advance();
                if self.check_keyword(Keyword::Function) {
                    self.parse_closure(start, true)
                } else {
                    self.parse_arrow_function(start, true)
                }
            }
            TokenKind::Keyword(keyword) if keyword.is_late_bound() => self.parse_late_bound(),
            TokenKind::Keyword(Keyword::Function) => self.parse_closure(start, false),
            TokenKind::Keyword(Keyword::Array) if self.peek_kind(1) == &TokenKind::LeftParen => {
                self.advance();
                self.parse_array_literal(start, false)
            }
            TokenKind::LeftBracket => self.parse_array_literal(start, true),
            TokenKind::LeftParen => self.parse_parenthesized(),
            TokenKind::Keyword(Keyword::Isset) => {
                self.advance();
                let arguments = self.parse_call_operands()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Isset, span, arguments))
            }
            TokenKind::Keyword(Keyword::Empty) => {
                self.advance();
                let arguments = self.parse_call_operands()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Empty, span, arguments))
            }
            TokenKind::Keyword(Keyword::Exit | Keyword::Die) => {
                self.advance();
                let arguments = if self.check(&TokenKind::LeftParen) {
                    self.parse_call_operands()?
                } else {
                    Vec::new()
                };
                let span = self.span_from(start);
                Ok(self.push(NodeKind::Exit, span, arguments))
            }
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    /// `$name`, `$$name`, `${expr}`.
    fn parse_variable(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        if self.check(&TokenKind::Variable) {
            let token = self.advance();
            return Ok(self.push(
                NodeKind::Variable {
                    name: token.text().clone(),
                },
                token.span(),
                vec![],
            ));
        }
        self.expect(&TokenKind::Dollar, "variable")?;
        let inner = if self.eat(&TokenKind::LeftBrace) {
            let inner = self.parse_expression()?;
            self.expect(&TokenKind::RightBrace, "'}'")?;
            inner
        } else {
            self.parse_variable()?
        };
        let span = self.span_from(start);
        Ok(self.push(NodeKind::VariableVariable, span, vec![inner]))
    }

    /// A name in expression position: a function name before `(`, a class
    /// before `::`, a constant otherwise.
    fn parse_name_expression(&mut self) -> ParseResult<NodeId> {
        let (written, span) = self.parse_name()?;
        let kind = match self.current_kind() {
            TokenKind::LeftParen => NodeKind::Identifier { name: written },
            TokenKind::DoubleColon => NodeKind::ClassReference {
                name: self.names.resolve_class(&written),
            },
            _ => NodeKind::Constant { name: written },
        };
        Ok(self.push(kind, span, vec![]))
    }

    fn parse_parenthesized(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(&TokenKind::LeftParen, "'('")?.span();
        let inner = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Parenthesized, span, vec![inner]))
    }

    /// `(a, b)` operands of `isset`, `empty` and `exit`.
    fn parse_call_operands(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut operands = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            operands.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(operands)
    }

    /// `array(...)` or `[...]`. Elements may be keyed, by reference, spread
    /// or, in destructuring, empty.
    fn parse_array_literal(&mut self, start: Span, short: bool) -> ParseResult<NodeId> {
        let (open, close, expected) = if short {
            (TokenKind::LeftBracket, TokenKind::RightBracket, "']'")
        } else {
            (TokenKind::LeftParen, TokenKind::RightParen, "')'")
        };
        self.expect(&open, if short { "'['" } else { "'('" })?;
        let mut elements = Vec::new();
        while !self.check(&close) {
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            elements.push(self.parse_array_element()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&close, expected)?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Array { short }, span, elements))
    }

    fn parse_array_element(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        self.eat(&TokenKind::Ellipsis);
        let mut by_ref = self.eat_operator("&");
        let mut children = vec![self.parse_expression()?];
        if !by_ref && self.eat(&TokenKind::DoubleArrow) {
            by_ref = self.eat_operator("&");
            children.push(self.parse_expression()?);
        }
        let span = self.span_from(start);
        Ok(self.push(NodeKind::ArrayElement { by_ref }, span, children))
    }

    /// `function [&](params) [use (...)] [: type] { body }`, positioned on
    /// `function`.
    fn parse_closure(&mut self, start: Span, is_static: bool) -> ParseResult<NodeId> {
        self.expect_keyword(Keyword::Function, "'function'")?;
        let by_ref = self.eat_operator("&");
        let mut children = vec![self.parse_formal_parameters()?];
        if self.check_keyword(Keyword::Use) {
            let uses_start = self.advance().span();
            self.expect(&TokenKind::LeftParen, "'('")?;
            let mut variables = Vec::new();
            while !self.check(&TokenKind::RightParen) {
                self.eat_operator("&");
                variables.push(self.parse_variable()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen, "')'")?;
            let span = self.span_from(uses_start);
            children.push(self.push(NodeKind::ClosureUses, span, variables));
        }
        self.parse_return_type()?;
        children.push(self.parse_block()?);
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Closure { is_static, by_ref }, span, children))
    }

    /// `fn [&](params) [: type] => expression`, positioned on `fn`.
    fn parse_arrow_function(&mut self, start: Span, is_static: bool) -> ParseResult<NodeId> {
        self.advance();
        let by_ref = self.eat_operator("&");
        let parameters = self.parse_formal_parameters()?;
        self.parse_return_type()?;
        self.expect(&TokenKind::DoubleArrow, "'=>'")?;
        let body = self.parse_expression_bp(ASSIGNMENT_RHS_BP)?;
        let span = self.span_from(start);
        Ok(self.push(
            NodeKind::Closure { is_static, by_ref },
            span,
            vec![parameters, body],
        ))
    }

    // ========================================================================
    // Late-bound References
    // ========================================================================

    /// `self`, `parent` or `static`, checked against the enclosing type.
    ///
    /// Outside any type body each keyword is an error, as is `parent` in a
    /// class without a parent. In an interface or trait `parent` has no
    /// lexical target and resolves later.
    pub(super) fn parse_late_bound(&mut self) -> ParseResult<NodeId> {
        let token = self.advance();
        let keyword = match token.kind() {
            TokenKind::Keyword(Keyword::SelfType) => LateBoundKeyword::SelfType,
            TokenKind::Keyword(Keyword::Parent) => LateBoundKeyword::Parent,
            _ => LateBoundKeyword::Static,
        };
        let scope_error = |reason| {
            ParseError::new(
                ParseErrorKind::Scope {
                    keyword: keyword.as_str().into(),
                    reason,
                },
                token.span(),
            )
        };

        let Some(scope) = &self.type_scope else {
            return Err(scope_error(ScopeViolation::OutsideType));
        };
        let target = match keyword {
            LateBoundKeyword::Parent if scope.is_class => match &scope.parent {
                Some(parent) => Some(parent.clone()),
                None => {
                    return Err(scope_error(ScopeViolation::NoParent {
                        class: scope.name.clone(),
                    }))
                }
            },
            LateBoundKeyword::Parent => None,
            LateBoundKeyword::SelfType | LateBoundKeyword::Static => Some(scope.name.clone()),
        };
        Ok(self.push(
            NodeKind::LateBound(LateBoundReference::new(keyword, target)),
            token.span(),
            vec![],
        ))
    }
}

/// Targets that assignment operators may write to.
fn is_assignable(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Variable { .. }
            | NodeKind::VariableVariable
            | NodeKind::ArrayIndex
            | NodeKind::StringIndex
            | NodeKind::MemberPrimaryPrefix { .. }
            | NodeKind::Array { .. }
            | NodeKind::FunctionPostfix
    )
}

/// Bases that accept the `$s{0}` string offset form.
fn is_indexable(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Variable { .. }
            | NodeKind::ArrayIndex
            | NodeKind::StringIndex
            | NodeKind::MemberPrimaryPrefix { .. }
    )
}

#[cfg(test)]
mod tests {
    use ecow::EcoString;

    use crate::ast::{LateBoundKeyword, NodeId, NodeKind, SyntaxTree};
    use crate::source_analysis::{ParseErrorKind, ScopeViolation};
    use crate::test_helpers::{find_all, find_first, parse_errors, parse_ok};

    /// The expression of the first expression statement.
    fn expression(source: &str) -> (SyntaxTree, NodeId) {
        let tree = parse_ok(source);
        let statement = find_first(&tree, |k| matches!(k, NodeKind::ExpressionStatement)).unwrap();
        let expression = tree.children(statement)[0];
        (tree, expression)
    }

    fn shape(tree: &SyntaxTree, id: NodeId) -> String {
        let children = tree.children(id);
        let label = match tree.kind(id) {
            NodeKind::Binary { op } | NodeKind::Assignment { op } | NodeKind::Unary { op } => {
                op.to_string()
            }
            NodeKind::Variable { name } => return name.to_string(),
            NodeKind::Literal { image, .. } => return image.to_string(),
            kind => kind.label().to_string(),
        };
        let inner: Vec<_> = children.iter().map(|&c| shape(tree, c)).collect();
        format!("({label} {})", inner.join(" "))
    }

    #[test]
    fn multiplicative_binds_tighter() {
        let (tree, id) = expression("<?php $a + $b * 2;");
        assert_eq!(shape(&tree, id), "(+ $a (* $b 2))");
    }

    #[test]
    fn binary_is_left_associative() {
        let (tree, id) = expression("<?php 1 - 2 - 3;");
        assert_eq!(shape(&tree, id), "(- (- 1 2) 3)");
    }

    #[test]
    fn power_is_right_associative() {
        let (tree, id) = expression("<?php 2 ** 3 ** 4;");
        assert_eq!(shape(&tree, id), "(** 2 (** 3 4))");
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let (tree, id) = expression("<?php -2 ** 2;");
        assert_eq!(shape(&tree, id), "(- (** 2 2))");
    }

    #[test]
    fn assignment_inside_boolean_operator() {
        let (tree, id) = expression("<?php $a && $b = 5;");
        assert_eq!(shape(&tree, id), "(BooleanAnd $a (= $b 5))");
    }

    #[test]
    fn keyword_operators_bind_below_assignment() {
        let (tree, id) = expression("<?php $x = true and false;");
        assert_eq!(shape(&tree, id), "(LogicalAnd (= $x (Constant )) (Constant ))");
    }

    #[test]
    fn logical_and_boolean_operators_have_distinct_kinds() {
        let (tree, id) = expression("<?php $a or $b xor $c || $d;");
        assert_eq!(shape(&tree, id), "(LogicalOr $a (LogicalXor $b (BooleanOr $c $d)))");
    }

    #[test]
    fn ternary_and_short_ternary() {
        let (tree, id) = expression("<?php $a ? $b : $c;");
        assert_eq!(shape(&tree, id), "(Conditional $a $b $c)");
        let (tree, id) = expression("<?php $a ?: $c;");
        assert_eq!(shape(&tree, id), "(Conditional $a $c)");
        let (tree, id) = expression("<?php $x = $a ? 1 : 2;");
        assert_eq!(shape(&tree, id), "(= $x (Conditional $a 1 2))");
    }

    #[test]
    fn coalesce_is_right_associative() {
        let (tree, id) = expression("<?php $a ?? $b ?? $c;");
        assert_eq!(shape(&tree, id), "(?? $a (?? $b $c))");
    }

    #[test]
    fn method_and_static_calls() {
        let (tree, id) = expression("<?php $o->get($a)->name;");
        assert_eq!(
            shape(&tree, id),
            "(MemberPrimaryPrefix (MemberPrimaryPrefix $o (MethodPostfix (Arguments $a))) (PropertyPostfix ))"
        );
        let (tree, id) = expression("<?php Foo::bar(1);");
        assert_eq!(
            shape(&tree, id),
            "(MemberPrimaryPrefix (ClassReference ) (MethodPostfix (Arguments 1)))"
        );
        let (tree, id) = expression("<?php Foo::BAR;");
        assert_eq!(
            shape(&tree, id),
            "(MemberPrimaryPrefix (ClassReference ) (ConstantPostfix ))"
        );
        let (tree, id) = expression("<?php Foo::$instance;");
        assert_eq!(
            shape(&tree, id),
            "(MemberPrimaryPrefix (ClassReference ) (PropertyPostfix ))"
        );
    }

    #[test]
    fn nullsafe_access_is_member_access() {
        let (tree, id) = expression("<?php $a?->b();");
        assert!(matches!(
            tree.kind(id),
            NodeKind::MemberPrimaryPrefix { is_static: false }
        ));
    }

    #[test]
    fn function_call_and_allocation() {
        let (tree, id) = expression("<?php strlen($s);");
        assert_eq!(shape(&tree, id), "(FunctionPostfix (Identifier ) (Arguments $s))");
        let (tree, id) = expression("<?php new \\App\\User($name);");
        assert_eq!(shape(&tree, id), "(Allocation (ClassReference ) (Arguments $name))");
        let (tree, id) = expression("<?php new $class;");
        assert_eq!(shape(&tree, id), "(Allocation $class)");
    }

    #[test]
    fn casts_and_unary() {
        let (tree, id) = expression("<?php (int) $a + !$b;");
        assert_eq!(shape(&tree, id), "(+ (Cast $a) (! $b))");
        let (tree, id) = expression("<?php ++$i;");
        assert_eq!(shape(&tree, id), "(PreIncrement $i)");
        let (tree, id) = expression("<?php $i--;");
        assert_eq!(shape(&tree, id), "(PostDecrement $i)");
    }

    #[test]
    fn instanceof_with_class_and_late_bound() {
        let (tree, id) = expression("<?php $a instanceof Foo;");
        assert_eq!(shape(&tree, id), "(Instanceof $a (ClassReference ))");
        let tree = parse_ok("<?php class A { function m($x) { return $x instanceof self; } }");
        assert!(find_first(&tree, |k| matches!(k, NodeKind::LateBound(_))).is_some());
    }

    #[test]
    fn arrays_and_destructuring() {
        let (tree, id) = expression("<?php [$a, 'k' => &$b, ...$rest];");
        assert_eq!(tree.children(id).len(), 3);
        let (tree, id) = expression("<?php [$a, , $b] = $pair;");
        assert!(matches!(tree.kind(id), NodeKind::Assignment { .. }));
        let (tree, id) = expression("<?php array(1, 2,);");
        assert!(matches!(tree.kind(id), NodeKind::Array { short: false }));
        assert_eq!(tree.children(id).len(), 2);
    }

    #[test]
    fn closures_and_arrow_functions() {
        let (tree, id) = expression("<?php $f = function ($x) use (&$y) { return $x + $y; };");
        let closure = tree.children(id)[1];
        let labels: Vec<_> = tree
            .children(closure)
            .iter()
            .map(|&c| tree.kind(c).label())
            .collect();
        assert_eq!(labels, vec!["FormalParameters", "ClosureUses", "Scope"]);

        let (tree, id) = expression("<?php $g = static fn($x) => $x * 2;");
        let closure = tree.children(id)[1];
        assert!(matches!(
            tree.kind(closure),
            NodeKind::Closure { is_static: true, .. }
        ));
    }

    #[test]
    fn isset_empty_exit_print_include() {
        let tree = parse_ok("<?php isset($a, $b); empty($c); exit; die('x'); print 'y'; require_once 'z.php';");
        assert_eq!(find_all(&tree, |k| matches!(k, NodeKind::Isset)).len(), 1);
        assert_eq!(find_all(&tree, |k| matches!(k, NodeKind::Exit)).len(), 2);
        assert!(find_first(&tree, |k| matches!(k, NodeKind::Include { .. })).is_some());
    }

    #[test]
    fn string_offsets_and_variable_variables() {
        let (tree, id) = expression("<?php $s{0};");
        assert!(matches!(tree.kind(id), NodeKind::StringIndex));
        let (tree, id) = expression("<?php $$name;");
        assert!(matches!(tree.kind(id), NodeKind::VariableVariable));
    }

    #[test]
    fn late_bound_targets_enclosing_type() {
        let tree = parse_ok(
            "<?php namespace App; class B {} class A extends B { function m() { self::x(); parent::y(); return new static; } }",
        );
        let refs: Vec<_> = find_all(&tree, |k| matches!(k, NodeKind::LateBound(_)))
            .into_iter()
            .map(|id| match tree.kind(id) {
                NodeKind::LateBound(reference) => {
                    (reference.keyword(), reference.target().cloned())
                }
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            refs,
            vec![
                (LateBoundKeyword::SelfType, Some(EcoString::from("App\\A"))),
                (LateBoundKeyword::Parent, Some(EcoString::from("App\\B"))),
                (LateBoundKeyword::Static, Some(EcoString::from("App\\A"))),
            ]
        );
    }

    #[test]
    fn static_outside_type_is_scope_error() {
        let errors = parse_errors("<?php function f() { return static::create(); }");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind.to_string(),
            "The keyword \"static\" was used outside of a class/method scope."
        );
        assert_eq!(errors[0].span.start_line(), 1);
    }

    #[test]
    fn parent_without_parent_class_is_scope_error() {
        let errors = parse_errors("<?php class Foo { function m() { parent::m(); } }");
        assert!(matches!(
            &errors[0].kind,
            ParseErrorKind::Scope { reason: ScopeViolation::NoParent { class }, .. } if class == "Foo"
        ));
        assert_eq!(
            errors[0].kind.to_string(),
            "The keyword \"parent\" was used but the class \"Foo\" does not declare a parent."
        );
    }

    #[test]
    fn parent_in_trait_has_no_lexical_target() {
        let tree = parse_ok("<?php trait T { function m() { return parent::m(); } }");
        let late = find_first(&tree, |k| matches!(k, NodeKind::LateBound(_))).unwrap();
        assert!(matches!(
            tree.kind(late),
            NodeKind::LateBound(reference) if reference.target().is_none()
        ));
    }

    #[test]
    fn spans_cover_whole_expression() {
        let source = "<?php $total = $a + $b;";
        let (tree, id) = expression(source);
        let span = tree.span(id);
        assert_eq!(&source[span.start() as usize..span.end() as usize], "$total = $a + $b");
        assert_eq!(span.start_column(), 7);
        assert_eq!(span.end_column(), 22);
    }

    #[test]
    fn named_and_spread_arguments() {
        let (tree, id) = expression("<?php f(name: $a, ...$rest);");
        let arguments = tree.children(id)[1];
        assert_eq!(tree.children(arguments).len(), 2);
    }
}
