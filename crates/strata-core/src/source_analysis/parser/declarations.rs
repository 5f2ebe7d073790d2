// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing: classes, interfaces, traits, their members,
//! functions and constants.
//!
//! Members of a type body are direct children of the type node, in source
//! order. Declared names are qualified with the enclosing namespace and
//! referenced names are resolved through the active imports.

use ecow::EcoString;

use crate::ast::{AdaptationAction, Modifiers, NodeId, NodeKind, Visibility};
use crate::source_analysis::{Keyword, Span, TokenKind};

use super::{ParseResult, Parser, TypeScope};

/// Which kind of type body is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeBody {
    Class,
    Interface,
    Trait,
}

impl Parser {
    // ========================================================================
    // Types
    // ========================================================================

    /// `[abstract|final] class Name [extends Parent] [implements A, B] { ... }`
    pub(super) fn parse_class(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let doc = self.current_token().doc_comment();
        let mut modifiers = Modifiers::default();
        loop {
            if self.eat_keyword(Keyword::Abstract) {
                modifiers.is_abstract = true;
            } else if self.eat_keyword(Keyword::Final) {
                modifiers.is_final = true;
            } else {
                break;
            }
        }
        self.expect_keyword(Keyword::Class, "'class'")?;
        let name = self.parse_declared_name()?;

        let parent = if self.eat_keyword(Keyword::Extends) {
            Some(self.parse_class_name()?)
        } else {
            None
        };
        let interfaces = if self.eat_keyword(Keyword::Implements) {
            self.parse_class_name_list()?
        } else {
            Vec::new()
        };

        let scope = TypeScope {
            name: name.clone(),
            is_class: true,
            parent: parent.clone(),
        };
        let members = self.parse_type_body(scope, TypeBody::Class)?;
        let span = self.span_from(start);
        let id = self.push(
            NodeKind::Class {
                name,
                modifiers,
                parent,
                interfaces,
            },
            span,
            members,
        );
        self.tree.set_doc_comment(id, doc);
        Ok(id)
    }

    /// `interface Name [extends A, B] { ... }`
    pub(super) fn parse_interface(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let doc = self.current_token().doc_comment();
        self.advance();
        let name = self.parse_declared_name()?;
        let parents = if self.eat_keyword(Keyword::Extends) {
            self.parse_class_name_list()?
        } else {
            Vec::new()
        };
        let scope = TypeScope {
            name: name.clone(),
            is_class: false,
            parent: None,
        };
        let members = self.parse_type_body(scope, TypeBody::Interface)?;
        let span = self.span_from(start);
        let id = self.push(NodeKind::Interface { name, parents }, span, members);
        self.tree.set_doc_comment(id, doc);
        Ok(id)
    }

    /// `trait Name { ... }`
    pub(super) fn parse_trait(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let doc = self.current_token().doc_comment();
        self.advance();
        let name = self.parse_declared_name()?;
        let scope = TypeScope {
            name: name.clone(),
            is_class: false,
            parent: None,
        };
        let members = self.parse_type_body(scope, TypeBody::Trait)?;
        let span = self.span_from(start);
        let id = self.push(NodeKind::Trait { name }, span, members);
        self.tree.set_doc_comment(id, doc);
        Ok(id)
    }

    fn parse_declared_name(&mut self) -> ParseResult<EcoString> {
        let token = self.expect(&TokenKind::Identifier, "identifier")?;
        Ok(self.names.qualify_declaration(token.text()))
    }

    /// A referenced class name, resolved to its qualified form.
    pub(super) fn parse_class_name(&mut self) -> ParseResult<EcoString> {
        let (written, _) = self.parse_name()?;
        Ok(self.names.resolve_class(&written))
    }

    fn parse_class_name_list(&mut self) -> ParseResult<Vec<EcoString>> {
        let mut names = vec![self.parse_class_name()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.parse_class_name()?);
        }
        Ok(names)
    }

    /// `{ members }` with `scope` active. The previous scope is restored
    /// whether or not the body parses.
    fn parse_type_body(&mut self, scope: TypeScope, body: TypeBody) -> ParseResult<Vec<NodeId>> {
        let outer = self.type_scope.replace(scope);
        let result = self.parse_members(body);
        self.type_scope = outer;
        result
    }

    fn parse_members(&mut self, body: TypeBody) -> ParseResult<Vec<NodeId>> {
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(self.unexpected(&["'}'"]));
            }
            let depth = self.nesting_depth;
            match self.parse_member(body) {
                Ok(id) => members.push(id),
                Err(error) => self.recover(error, depth)?,
            }
        }
        self.advance();
        Ok(members)
    }

    fn parse_member(&mut self, body: TypeBody) -> ParseResult<NodeId> {
        if self.check_keyword(Keyword::Use) && body != TypeBody::Interface {
            return self.parse_trait_use();
        }
        let start = self.current_span();
        let doc = self.current_token().doc_comment();
        let modifiers = self.parse_modifiers();

        let id = if self.check_keyword(Keyword::Const) {
            self.parse_constant_declaration()?
        } else if self.check_keyword(Keyword::Function) {
            self.parse_method(start, modifiers)?
        } else if body != TypeBody::Interface && self.starts_property() {
            self.parse_property_declaration(start, modifiers)?
        } else {
            return Err(self.unexpected(&["'function'", "'const'", "property"]));
        };
        self.tree.set_doc_comment(id, doc);
        Ok(id)
    }

    /// `public`, `protected`, `private`, `static`, `abstract`, `final` and
    /// `var`, in any order.
    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            let Some(keyword) = self.current_kind().keyword() else {
                break;
            };
            match keyword {
                Keyword::Public | Keyword::Var => modifiers.visibility = Some(Visibility::Public),
                Keyword::Protected => modifiers.visibility = Some(Visibility::Protected),
                Keyword::Private => modifiers.visibility = Some(Visibility::Private),
                Keyword::Static => modifiers.is_static = true,
                Keyword::Abstract => modifiers.is_abstract = true,
                Keyword::Final => modifiers.is_final = true,
                _ => break,
            }
            self.advance();
        }
        modifiers
    }

    /// A variable, or a type hint followed by one.
    fn starts_property(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Variable
                | TokenKind::Identifier
                | TokenKind::Question
                | TokenKind::Backslash
                | TokenKind::Keyword(Keyword::Array | Keyword::SelfType | Keyword::Static)
        )
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// `function [&]name(params) [: type] { body }`, or `;` for abstract and
    /// interface methods.
    fn parse_method(&mut self, start: Span, modifiers: Modifiers) -> ParseResult<NodeId> {
        self.advance();
        let by_ref = self.eat_operator("&");
        let (name, _) = self.parse_member_name()?;
        let mut children = vec![self.parse_formal_parameters()?];
        self.parse_return_type()?;
        if !self.eat(&TokenKind::Semicolon) {
            children.push(self.parse_block()?);
        }
        let span = self.span_from(start);
        Ok(self.push(
            NodeKind::Method {
                name,
                modifiers,
                by_ref,
            },
            span,
            children,
        ))
    }

    /// `[type] $a [= default], $b;`
    fn parse_property_declaration(
        &mut self,
        start: Span,
        modifiers: Modifiers,
    ) -> ParseResult<NodeId> {
        if !self.check(&TokenKind::Variable) {
            self.parse_type_hint()?;
        }
        let mut properties = Vec::new();
        loop {
            let token = self.expect(&TokenKind::Variable, "variable")?;
            let mut children = Vec::new();
            if self.eat_operator("=") {
                children.push(self.parse_expression()?);
            }
            let span = self.span_from(token.span());
            properties.push(self.push(
                NodeKind::Property {
                    name: token.text().clone(),
                },
                span,
                children,
            ));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::PropertyDeclaration { modifiers }, span, properties))
    }

    /// `const A = 1, B = 2;` at file level or inside a type body.
    pub(super) fn parse_constant_declaration(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let mut declarators = Vec::new();
        loop {
            let (name, name_span) = self.parse_member_name()?;
            if !self.eat_operator("=") {
                return Err(self.unexpected(&["'='"]));
            }
            let value = self.parse_expression()?;
            let span = self.span_from(name_span);
            declarators.push(self.push(NodeKind::ConstantDeclarator { name }, span, vec![value]));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let span = self.finish_statement(start)?;
        Ok(self.push(NodeKind::ConstantDeclaration, span, declarators))
    }

    /// `use A, B;` or `use A, B { A::m insteadof B; B::m as protected n; }`
    fn parse_trait_use(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let traits = self.parse_class_name_list()?;
        let mut rules = Vec::new();
        if self.eat(&TokenKind::LeftBrace) {
            while !self.eat(&TokenKind::RightBrace) {
                rules.push(self.parse_trait_adaptation()?);
            }
        } else {
            self.finish_statement(start)?;
        }
        let span = self.span_from(start);
        Ok(self.push(NodeKind::TraitUse { traits }, span, rules))
    }

    fn parse_trait_adaptation(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let (trait_name, method) = if self.peek_kind(1) == &TokenKind::DoubleColon
            || self.check(&TokenKind::Backslash)
        {
            let trait_name = self.parse_class_name()?;
            self.expect(&TokenKind::DoubleColon, "'::'")?;
            let (method, _) = self.parse_member_name()?;
            (Some(trait_name), method)
        } else {
            (None, self.parse_member_name()?.0)
        };

        let action = if self.eat_keyword(Keyword::Insteadof) {
            AdaptationAction::Precedence {
                excluded: self.parse_class_name_list()?,
            }
        } else if self.eat_keyword(Keyword::As) {
            let visibility = match self.current_kind() {
                TokenKind::Keyword(Keyword::Public) => Some(Visibility::Public),
                TokenKind::Keyword(Keyword::Protected) => Some(Visibility::Protected),
                TokenKind::Keyword(Keyword::Private) => Some(Visibility::Private),
                _ => None,
            };
            if visibility.is_some() {
                self.advance();
            }
            let alias = if self.current_kind().is_statement_end() {
                None
            } else {
                Some(self.parse_member_name()?.0)
            };
            if visibility.is_none() && alias.is_none() {
                return Err(self.unexpected(&["visibility", "alias name"]));
            }
            AdaptationAction::Alias { visibility, alias }
        } else {
            return Err(self.unexpected(&["'insteadof'", "'as'"]));
        };
        let span = self.finish_statement(start)?;
        Ok(self.push(
            NodeKind::TraitAdaptation {
                trait_name,
                method,
                action,
            },
            span,
            vec![],
        ))
    }

    // ========================================================================
    // Functions and Parameters
    // ========================================================================

    /// `function [&]name(params) [: type] { body }`. The body has no type
    /// scope even when the function is declared inside a method.
    pub(super) fn parse_function_declaration(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        let doc = self.current_token().doc_comment();
        self.advance();
        let by_ref = self.eat_operator("&");
        let token = self.expect(&TokenKind::Identifier, "function name")?;
        let name = self.names.qualify_declaration(token.text());

        let outer = self.type_scope.take();
        let result = self.parse_function_rest();
        self.type_scope = outer;
        let children = result?;

        let span = self.span_from(start);
        let id = self.push(NodeKind::Function { name, by_ref }, span, children);
        self.tree.set_doc_comment(id, doc);
        Ok(id)
    }

    fn parse_function_rest(&mut self) -> ParseResult<Vec<NodeId>> {
        let parameters = self.parse_formal_parameters()?;
        self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(vec![parameters, body])
    }

    /// `( [param, ...] )`, allowing a trailing comma.
    pub(super) fn parse_formal_parameters(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(&TokenKind::LeftParen, "'('")?.span();
        let mut parameters = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            parameters.push(self.parse_formal_parameter()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::FormalParameters, span, parameters))
    }

    fn parse_formal_parameter(&mut self) -> ParseResult<NodeId> {
        let start = self.current_span();
        // Constructor promotion modifiers carry no structure of their own.
        while matches!(
            self.current_kind().keyword(),
            Some(Keyword::Public | Keyword::Protected | Keyword::Private)
        ) || self.is_readonly_modifier()
        {
            self.advance();
        }

        let type_hint = if self.check(&TokenKind::Variable)
            || self.check(&TokenKind::Ellipsis)
            || self.check_operator("&")
        {
            None
        } else {
            Some(self.parse_type_hint()?)
        };
        let by_ref = self.eat_operator("&");
        let variadic = self.eat(&TokenKind::Ellipsis);
        let token = self.expect(&TokenKind::Variable, "parameter variable")?;
        let mut children = Vec::new();
        if self.eat_operator("=") {
            children.push(self.parse_expression()?);
        }
        let span = self.span_from(start);
        Ok(self.push(
            NodeKind::FormalParameter {
                name: token.text().clone(),
                type_hint,
                by_ref,
                variadic,
            },
            span,
            children,
        ))
    }

    fn is_readonly_modifier(&self) -> bool {
        self.check(&TokenKind::Identifier)
            && self.current_token().text().eq_ignore_ascii_case("readonly")
            && !matches!(self.peek_kind(1), TokenKind::LeftParen)
    }

    /// `: type` after a parameter list.
    pub(super) fn parse_return_type(&mut self) -> ParseResult<()> {
        if self.eat(&TokenKind::Colon) {
            self.parse_type_hint()?;
        }
        Ok(())
    }

    /// `?T`, `A|B`, `array`, `self`, `static`. Class names are resolved.
    pub(super) fn parse_type_hint(&mut self) -> ParseResult<EcoString> {
        let mut hint = EcoString::new();
        if self.eat(&TokenKind::Question) {
            hint.push('?');
        }
        loop {
            match self.current_kind() {
                TokenKind::Keyword(Keyword::Array | Keyword::SelfType | Keyword::Static) => {
                    let text = self.advance().text().to_ascii_lowercase();
                    hint.push_str(&text);
                }
                TokenKind::Identifier | TokenKind::Backslash | TokenKind::Keyword(Keyword::Namespace) => {
                    let (written, _) = self.parse_name()?;
                    if is_builtin_type(&written) {
                        hint.push_str(&written.to_ascii_lowercase());
                    } else {
                        hint.push_str(&self.names.resolve_class(&written));
                    }
                }
                _ => return Err(self.unexpected(&["type"])),
            }
            if self.check_operator("|") {
                self.advance();
                hint.push('|');
            } else {
                break;
            }
        }
        Ok(hint)
    }
}

fn is_builtin_type(name: &str) -> bool {
    const BUILTIN: &[&str] = &[
        "bool", "int", "float", "string", "iterable", "callable", "object", "mixed", "void",
        "null", "never", "false", "true",
    ];
    BUILTIN.iter().any(|builtin| builtin.eq_ignore_ascii_case(name))
}
