// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing.
//!
//! Control structures accept both the brace form and the alternate syntax
//! (`if (...): ... endif;`). In the alternate form the body is a
//! [`NodeKind::Scope`] running from the `:` to the last inner statement.

use crate::ast::{NodeId, NodeKind};
use crate::source_analysis::{Keyword, Span, Token, TokenKind};

use super::{ParseResult, Parser};

impl Parser {
    /// Parses one statement. Returns `None` for empty statements (`;`, a
    /// stray `?>`).
    pub(super) fn parse_statement(&mut self) -> ParseResult<Option<NodeId>> {
        self.enter_nesting()?;
        let result = self.parse_statement_inner();
        self.leave_nesting();
        result
    }

    fn parse_statement_inner(&mut self) -> ParseResult<Option<NodeId>> {
        let keyword = match self.current_kind() {
            TokenKind::Semicolon | TokenKind::CloseTag => {
                self.advance();
                return Ok(None);
            }
            TokenKind::LeftBrace => return self.parse_block().map(Some),
            TokenKind::Keyword(keyword) => *keyword,
            _ => return self.parse_expression_statement().map(Some),
        };

        let id = match keyword {
            Keyword::If => self.parse_if()?,
            Keyword::While => self.parse_while()?,
            Keyword::Do => self.parse_do_while()?,
            Keyword::For => self.parse_for()?,
            Keyword::Foreach => self.parse_foreach()?,
            Keyword::Switch => self.parse_switch()?,
            Keyword::Break => self.parse_jump(NodeKind::Break)?,
            Keyword::Continue => self.parse_jump(NodeKind::Continue)?,
            Keyword::Return => self.parse_jump(NodeKind::Return)?,
            Keyword::Echo => self.parse_echo()?,
            Keyword::Try => self.parse_try()?,
            Keyword::Throw => self.parse_throw()?,
            Keyword::Global => self.parse_global()?,
            Keyword::Unset => self.parse_unset()?,
            Keyword::Const => self.parse_constant_declaration()?,
            Keyword::Static if self.peek_kind(1) == &TokenKind::Variable => {
                self.parse_static_variables()?
            }
            Keyword::Function if self.starts_function_declaration() => {
                self.parse_function_declaration()?
            }
            Keyword::Abstract | Keyword::Final | Keyword::Class => self.parse_class()?,
            Keyword::Interface => self.parse_interface()?,
            Keyword::Trait => self.parse_trait()?,
            _ => self.parse_expression_statement()?,
        };
        Ok(Some(id))
    }

    /// `function name(` or `function &name(`, as opposed to a closure.
    fn starts_function_declaration(&self) -> bool {
        match self.peek_kind(1) {
            TokenKind::Identifier => true,
            TokenKind::Operator => {
                self.stream_text(1) == "&" && self.peek_kind(2) == &TokenKind::Identifier
            }
            _ => false,
        }
    }

    fn stream_text(&self, k: usize) -> &str {
        self.peek_token(k).text().as_str()
    }

    /// `{ statements }`
    pub(super) fn parse_block(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(&TokenKind::LeftBrace, "'{'")?.span();
        let statements = self.parse_statement_list(|t| t.kind() == &TokenKind::RightBrace)?;
        self.expect(&TokenKind::RightBrace, "'}'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Scope, span, statements))
    }

    /// The body of a control structure: a single statement or, with a
    /// leading `:`, an alternate-syntax block that ends before one of
    /// `terminators`.
    fn parse_body(&mut self, alternate: bool, terminators: &[Keyword]) -> ParseResult<NodeId> {
        if alternate {
            let start = self.expect(&TokenKind::Colon, "':'")?.span();
            let statements = self.parse_statement_list(|t| {
                terminators.iter().any(|&keyword| t.is_keyword(keyword))
            })?;
            let span = self.span_from(start);
            return Ok(self.push(NodeKind::Scope, span, statements));
        }
        match self.parse_statement()? {
            Some(id) => Ok(id),
            None => {
                let span = self.last_consumed_span();
                Ok(self.push(NodeKind::Scope, span, vec![]))
            }
        }
    }

    /// `( expression )` as used by control structures.
    fn parse_condition(&mut self) -> ParseResult<NodeId> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(condition)
    }

    /// Consumes `endif;`-style terminators.
    fn finish_alternate(&mut self, start: Span, end: Keyword, expected: &str) -> ParseResult<Span> {
        self.expect_keyword(end, expected)?;
        self.finish_statement(start)
    }

    // ========================================================================
    // Conditionals and Loops
    // ========================================================================

    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let condition = self.parse_condition()?;
        let alternate = self.check(&TokenKind::Colon);
        let terminators = [Keyword::ElseIf, Keyword::Else, Keyword::EndIf];
        let mut children = vec![condition, self.parse_body(alternate, &terminators)?];

        while self.check_keyword(Keyword::ElseIf) {
            let else_if_start = self.advance().span();
            let condition = self.parse_condition()?;
            let body = self.parse_body(alternate, &terminators)?;
            let span = self.span_from(else_if_start);
            children.push(self.push(NodeKind::ElseIf, span, vec![condition, body]));
        }
        if self.check_keyword(Keyword::Else) {
            let else_start = self.advance().span();
            let body = self.parse_body(alternate, &[Keyword::EndIf])?;
            let span = self.span_from(else_start);
            children.push(self.push(NodeKind::Else, span, vec![body]));
        }

        let span = if alternate {
            self.finish_alternate(start, Keyword::EndIf, "'endif'")?
        } else {
            self.span_from(start)
        };
        Ok(self.push(NodeKind::If, span, children))
    }

    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let condition = self.parse_condition()?;
        let alternate = self.check(&TokenKind::Colon);
        let body = self.parse_body(alternate, &[Keyword::EndWhile])?;
        let span = if alternate {
            self.finish_alternate(start, Keyword::EndWhile, "'endwhile'")?
        } else {
            self.span_from(start)
        };
        Ok(self.push(NodeKind::While, span, vec![condition, body]))
    }

    fn parse_do_while(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let body = self.parse_body(false, &[])?;
        self.expect_keyword(Keyword::While, "'while'")?;
        let condition = self.parse_condition()?;
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::DoWhile, span, vec![body, condition]))
    }

    /// `for (init; condition; update) body`. Each clause becomes a node only
    /// when it has expressions.
    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut children = Vec::new();
        let clauses = [
            (NodeKind::ForInit, TokenKind::Semicolon, "';'"),
            (NodeKind::ForCondition, TokenKind::Semicolon, "';'"),
            (NodeKind::ForUpdate, TokenKind::RightParen, "')'"),
        ];
        for (kind, end, expected) in clauses {
            let clause_start = self.current_span();
            let mut expressions = Vec::new();
            if !self.check(&end) {
                expressions.push(self.parse_expression()?);
                while self.eat(&TokenKind::Comma) {
                    expressions.push(self.parse_expression()?);
                }
            }
            if !expressions.is_empty() {
                let span = self.span_from(clause_start);
                children.push(self.push(kind, span, expressions));
            }
            self.expect(&end, expected)?;
        }
        let alternate = self.check(&TokenKind::Colon);
        children.push(self.parse_body(alternate, &[Keyword::EndFor])?);
        let span = if alternate {
            self.finish_alternate(start, Keyword::EndFor, "'endfor'")?
        } else {
            self.span_from(start)
        };
        Ok(self.push(NodeKind::For, span, children))
    }

    /// `foreach (subject as [key =>] [&]value) body`
    fn parse_foreach(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut children = vec![self.parse_expression()?];
        self.expect_keyword(Keyword::As, "'as'")?;

        let mut by_ref = self.eat_operator("&");
        let first = self.parse_expression()?;
        children.push(first);
        if self.eat(&TokenKind::DoubleArrow) {
            by_ref = self.eat_operator("&");
            children.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RightParen, "')'")?;

        let alternate = self.check(&TokenKind::Colon);
        children.push(self.parse_body(alternate, &[Keyword::EndForeach])?);
        let span = if alternate {
            self.finish_alternate(start, Keyword::EndForeach, "'endforeach'")?
        } else {
            self.span_from(start)
        };
        Ok(self.push(NodeKind::Foreach { by_ref }, span, children))
    }

    /// `switch (subject) { case e: ... default: ... }`, or the `:` ...
    /// `endswitch;` form. Children are the subject followed by the labels.
    fn parse_switch(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let mut children = vec![self.parse_condition()?];
        let alternate = if self.eat(&TokenKind::Colon) {
            true
        } else {
            self.expect(&TokenKind::LeftBrace, "'{'")?;
            false
        };
        self.eat(&TokenKind::Semicolon);

        let at_end = |t: &Token| {
            if alternate {
                t.is_keyword(Keyword::EndSwitch)
            } else {
                t.kind() == &TokenKind::RightBrace
            }
        };
        while !at_end(self.current_token()) {
            children.push(self.parse_switch_label()?);
        }

        let span = if alternate {
            self.finish_alternate(start, Keyword::EndSwitch, "'endswitch'")?
        } else {
            self.advance();
            self.span_from(start)
        };
        Ok(self.push(NodeKind::Switch, span, children))
    }

    fn parse_switch_label(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let (is_default, mut children) = if self.eat_keyword(Keyword::Case) {
            (false, vec![self.parse_expression()?])
        } else if self.eat_keyword(Keyword::Default) {
            (true, vec![])
        } else {
            return Err(self.unexpected(&["'case'", "'default'", "'}'"]));
        };
        if !self.eat(&TokenKind::Colon) && !self.eat(&TokenKind::Semicolon) {
            return Err(self.unexpected(&["':'", "';'"]));
        }
        children.extend(self.parse_statement_list(|t| {
            t.is_keyword(Keyword::Case)
                || t.is_keyword(Keyword::Default)
                || t.is_keyword(Keyword::EndSwitch)
                || t.kind() == &TokenKind::RightBrace
        })?);
        let span = self.span_from(start);
        Ok(self.push(NodeKind::SwitchLabel { is_default }, span, children))
    }

    // ========================================================================
    // Simple Statements
    // ========================================================================

    /// `break`, `continue` and `return` with an optional expression.
    fn parse_jump(&mut self, kind: NodeKind) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let mut children = Vec::new();
        if !self.current_kind().is_statement_end() {
            children.push(self.parse_expression()?);
        }
        let span = self.finish_statement(start)?;
        Ok(self.push(kind, span, children))
    }

    fn parse_echo(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let children = self.parse_expression_list()?;
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::Echo, span, children))
    }

    fn parse_throw(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let exception = self.parse_expression()?;
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::Throw, span, vec![exception]))
    }

    fn parse_global(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let children = self.parse_expression_list()?;
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::Global, span, children))
    }

    fn parse_unset(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut children = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            children.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::Unset, span, children))
    }

    /// `static $a = 1, $b;` inside a function body.
    fn parse_static_variables(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let mut children = Vec::new();
        loop {
            let token = self.expect(&TokenKind::Variable, "variable")?;
            let variable = self.push(
                NodeKind::Variable {
                    name: token.text().clone(),
                },
                token.span(),
                vec![],
            );
            if self.check_operator("=") {
                let op = self.advance().text().clone();
                let value = self.parse_expression()?;
                let span = token.span().merge(self.node_span(value));
                children.push(self.push(NodeKind::Assignment { op }, span, vec![variable, value]));
            } else {
                children.push(variable);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::StaticVariables, span, children))
    }

    /// `try { } catch (A | B $e) { } finally { }`
    fn parse_try(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let mut children = vec![self.parse_block()?];
        while self.check_keyword(Keyword::Catch) {
            let catch_start = self.advance().span();
            self.expect(&TokenKind::LeftParen, "'('")?;
            let mut types = Vec::new();
            loop {
                let (written, _) = self.parse_name()?;
                types.push(self.names.resolve_class(&written));
                if !self.eat_operator("|") {
                    break;
                }
            }
            let variable = if self.check(&TokenKind::Variable) {
                self.advance().text().clone()
            } else {
                ecow::EcoString::new()
            };
            self.expect(&TokenKind::RightParen, "')'")?;
            let body = self.parse_block()?;
            let span = self.span_from(catch_start);
            children.push(self.push(NodeKind::Catch { types, variable }, span, vec![body]));
        }
        if self.check_keyword(Keyword::Finally) {
            let finally_start = self.advance().span();
            let body = self.parse_block()?;
            let span = self.span_from(finally_start);
            children.push(self.push(NodeKind::Finally, span, vec![body]));
        }
        if children.len() == 1 {
            return Err(self.unexpected(&["'catch'", "'finally'"]));
        }
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Try, span, children))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let expression = self.parse_expression()?;
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::ExpressionStatement, span, vec![expression]))
    }

    /// One or more comma separated expressions.
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut expressions = vec![self.parse_expression()?];
        while self.eat(&TokenKind::Comma) {
            expressions.push(self.parse_expression()?);
        }
        Ok(expressions)
    }
}
