// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for PHP source.
//!
//! One method per grammar production. Each consumes exactly the tokens of its
//! construct and returns the id of a node whose span runs from its first to
//! its last consumed token.
//!
//! # Errors and Recovery
//!
//! - **Grammar violations** ([`ParseErrorKind::UnexpectedToken`]) are
//!   collected; the parser resynchronizes at the next statement boundary and
//!   keeps going so one run reports every grammar error of a file.
//! - **Everything else** (end of input inside a construct, lexical errors,
//!   illegal `self`/`parent`/`static`, runaway nesting) aborts the file.
//!
//! Either way a file with errors yields no tree.
//!
//! # Binary Operator Precedence (Pratt Parsing)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 10  | `or`                 | Left |
//! | 20  | `xor`                | Left |
//! | 30  | `and`                | Left |
//! | 50  | `? :`                | Left |
//! | 60  | `??`                 | Right |
//! | 70  | `\|\|`               | Left |
//! | 80  | `&&`                 | Left |
//! | 90  | `\|`                 | Left |
//! | 100 | `^`                  | Left |
//! | 110 | `&`                  | Left |
//! | 120 | `==` `!=` `===` `!==` `<>` `<=>` | Left |
//! | 130 | `<` `<=` `>` `>=`    | Left |
//! | 140 | `<<` `>>`            | Left |
//! | 150 | `+` `-` `.`          | Left |
//! | 160 | `*` `/` `%`          | Left |
//! | 170 | `instanceof`         | Left |
//! | 180 | `**`                 | Right |
//!
//! Assignment is parsed from its target, so `$a && $b = 1` assigns to `$b`.
//!
//! # Usage
//!
//! ```
//! use strata_core::ast::{FileId, NodeKind};
//! use strata_core::source_analysis::parse;
//!
//! let tree = parse("<?php $x = 3 + 4;", FileId(0)).unwrap();
//! let statement = tree.children(tree.root())[0];
//! assert!(matches!(tree.kind(statement), NodeKind::ExpressionStatement));
//! ```

use std::collections::HashMap;

use ecow::EcoString;

use crate::ast::{FileId, NodeId, NodeKind, SyntaxTree, TreeBuilder};
use crate::source_analysis::{
    Expected, Keyword, LineColumn, ParseError, ParseErrorKind, Span, Token, TokenKind,
    TokenStream,
};

mod declarations;
mod expressions;
mod statements;


// ============================================================================
// Pratt Parsing for Binary Operator Precedence
// ============================================================================

/// Binding power for binary operators.
///
/// - Left-associative: `left_bp == right_bp - 1`
/// - Right-associative: `left_bp == right_bp + 1`
#[derive(Debug, Clone, Copy)]
pub(super) struct BindingPower {
    pub(super) left: u8,
    pub(super) right: u8,
}

impl BindingPower {
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }

    const fn right_assoc(precedence: u8) -> Self {
        Self {
            left: precedence + 1,
            right: precedence,
        }
    }
}

/// Binding power of the ternary operator.
const TERNARY_BP: BindingPower = BindingPower::left_assoc(50);

/// Operand binding power for `!`: `instanceof` still binds inside it.
const NOT_OPERAND_BP: u8 = 170;

/// Operand binding power for `-`, `~`, `@` and casts: only `**` binds inside.
const UNARY_OPERAND_BP: u8 = 175;

/// Right-hand side binding power of assignments: everything except the
/// keyword operators `and`, `or`, `xor`.
const ASSIGNMENT_RHS_BP: u8 = 40;

/// Gets the binding power for a binary operator, keyword operators by their
/// lowercase text. Returns `None` for anything that is not a binary operator.
pub(super) fn binary_binding_power(op: &str) -> Option<BindingPower> {
    let bp = match op {
        "or" => BindingPower::left_assoc(10),
        "xor" => BindingPower::left_assoc(20),
        "and" => BindingPower::left_assoc(30),
        "??" => BindingPower::right_assoc(60),
        "||" => BindingPower::left_assoc(70),
        "&&" => BindingPower::left_assoc(80),
        "|" => BindingPower::left_assoc(90),
        "^" => BindingPower::left_assoc(100),
        "&" => BindingPower::left_assoc(110),
        "==" | "!=" | "===" | "!==" | "<>" | "<=>" => BindingPower::left_assoc(120),
        "<" | "<=" | ">" | ">=" => BindingPower::left_assoc(130),
        "<<" | ">>" => BindingPower::left_assoc(140),
        "+" | "-" | "." => BindingPower::left_assoc(150),
        "*" | "/" | "%" => BindingPower::left_assoc(160),
        "instanceof" => BindingPower::left_assoc(170),
        "**" => BindingPower::right_assoc(180),
        _ => return None,
    };
    Some(bp)
}

/// Whether `op` is an assignment operator.
pub(super) fn is_assignment_operator(op: &str) -> bool {
    matches!(
        op,
        "=" | "+=" | "-=" | "*=" | "/=" | ".=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>="
            | "**=" | "??="
    )
}

// ============================================================================
// Parser State
// ============================================================================

/// Maximum statement plus expression nesting before the file is rejected.
const MAX_NESTING_DEPTH: usize = 64;

/// The default namespace, which maps to the `+global` package.
const GLOBAL_NAMESPACE: &str = "";

pub(super) type ParseResult<T> = Result<T, ParseError>;

/// The class, interface or trait whose body is being parsed.
#[derive(Debug, Clone)]
pub(super) struct TypeScope {
    pub(super) name: EcoString,
    pub(super) is_class: bool,
    pub(super) parent: Option<EcoString>,
}

/// Namespace and `use` imports in effect.
#[derive(Debug, Default)]
pub(super) struct NameContext {
    pub(super) namespace: EcoString,
    /// Lowercase alias to qualified name.
    pub(super) imports: HashMap<EcoString, EcoString>,
}

impl NameContext {
    /// Qualifies a declared short name with the current namespace.
    pub(super) fn qualify_declaration(&self, name: &str) -> EcoString {
        if self.namespace.is_empty() {
            name.into()
        } else {
            eco_format(&[&self.namespace, "\\", name])
        }
    }

    /// Resolves a class name as written to its qualified form.
    pub(super) fn resolve_class(&self, written: &str) -> EcoString {
        if let Some(absolute) = written.strip_prefix('\\') {
            return absolute.into();
        }
        if let Some(relative) = strip_prefix_ignore_case(written, "namespace\\") {
            if !relative.is_empty() {
                return self.qualify_declaration(relative);
            }
        }
        let (first, rest) = match written.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (written, None),
        };
        if let Some(imported) = self.imports.get(first.to_ascii_lowercase().as_str()) {
            return match rest {
                Some(rest) => eco_format(&[imported, "\\", rest]),
                None => imported.clone(),
            };
        }
        self.qualify_declaration(written)
    }
}

/// `text` without an ASCII `prefix`, compared case-insensitively.
fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

fn eco_format(parts: &[&str]) -> EcoString {
    let mut out = EcoString::new();
    for part in parts {
        out.push_str(part);
    }
    out
}

/// The parser state.
pub(super) struct Parser {
    stream: TokenStream,
    pub(super) tree: TreeBuilder,
    errors: Vec<ParseError>,
    pub(super) names: NameContext,
    pub(super) type_scope: Option<TypeScope>,
    /// Span of the last consumed token other than `?>`.
    last_span: Span,
    nesting_depth: usize,
}

/// Parses a source file into a syntax tree.
///
/// Returns every collected error if the file has any.
pub fn parse(source: &str, file: FileId) -> Result<SyntaxTree, Vec<ParseError>> {
    parse_tokens(TokenStream::from_source(source), file)
}

/// Parses an already lexed token stream.
pub fn parse_tokens(stream: TokenStream, file: FileId) -> Result<SyntaxTree, Vec<ParseError>> {
    let mut parser = Parser::new(stream, file);
    match parser.parse_compilation_unit() {
        Ok(root) if parser.errors.is_empty() => Ok(parser.tree.finish(root)),
        Ok(_) => Err(parser.errors),
        Err(fatal) => {
            parser.errors.push(fatal);
            Err(parser.errors)
        }
    }
}

impl Parser {
    fn new(stream: TokenStream, file: FileId) -> Self {
        Self {
            stream,
            tree: TreeBuilder::new(file),
            errors: Vec::new(),
            names: NameContext {
                namespace: GLOBAL_NAMESPACE.into(),
                imports: HashMap::new(),
            },
            type_scope: None,
            last_span: Span::empty(0, LineColumn::default()),
            nesting_depth: 0,
        }
    }

    // ========================================================================
    // Token Access
    // ========================================================================

    pub(super) fn current_token(&self) -> &Token {
        self.stream.peek(0)
    }

    pub(super) fn current_kind(&self) -> &TokenKind {
        self.stream.peek(0).kind()
    }

    pub(super) fn current_span(&self) -> Span {
        self.stream.peek(0).span()
    }

    pub(super) fn peek_kind(&self, k: usize) -> &TokenKind {
        self.stream.peek(k).kind()
    }

    pub(super) fn peek_token(&self, k: usize) -> &Token {
        self.stream.peek(k)
    }

    pub(super) fn last_consumed_span(&self) -> Span {
        self.last_span
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.stream.is_at_end()
    }

    /// Consumes the current token and returns it.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.stream.peek(0).clone();
        if self.stream.next().is_some() && token.kind() != &TokenKind::CloseTag {
            self.last_span = token.span();
        }
        token
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(super) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current_token().is_keyword(keyword)
    }

    pub(super) fn check_operator(&self, op: &str) -> bool {
        self.current_token().is_operator(op)
    }

    pub(super) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn eat_operator(&mut self, op: &str) -> bool {
        if self.check_operator(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of `kind` or fails with `expected` as the expected set.
    pub(super) fn expect(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[expected]))
        }
    }

    pub(super) fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> ParseResult<Token> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[expected]))
        }
    }

    /// The error for the current token given what the production wanted.
    pub(super) fn unexpected(&self, expected: &[&str]) -> ParseError {
        let token = self.current_token();
        let expected = Expected::new(expected.iter().copied());
        let kind = match token.kind() {
            TokenKind::Eof => ParseErrorKind::TokenStreamEnd { expected },
            TokenKind::Error(lex) => ParseErrorKind::Lex(lex.clone()),
            _ => ParseErrorKind::UnexpectedToken {
                expected,
                found: token.text().clone(),
            },
        };
        ParseError::new(kind, token.span())
    }

    /// Span from `start` to the last consumed token.
    pub(super) fn span_from(&self, start: Span) -> Span {
        start.merge(self.last_span)
    }

    /// Ends a statement at `;` or `?>`. The close tag is consumed but stays
    /// outside the returned span.
    pub(super) fn finish_statement(&mut self, start: Span) -> ParseResult<Span> {
        match self.current_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.span_from(start))
            }
            TokenKind::CloseTag => {
                let span = self.span_from(start);
                self.advance();
                Ok(span)
            }
            _ => Err(self.unexpected(&["';'"])),
        }
    }

    pub(super) fn push(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        self.tree.push(kind, span, children)
    }

    pub(super) fn node_span(&self, id: NodeId) -> Span {
        self.tree.span(id)
    }

    // ========================================================================
    // Nesting and Recovery
    // ========================================================================

    pub(super) fn enter_nesting(&mut self) -> ParseResult<()> {
        self.nesting_depth += 1;
        if self.nesting_depth > MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep {
                    max: MAX_NESTING_DEPTH,
                },
                self.current_span(),
            ));
        }
        Ok(())
    }

    pub(super) fn leave_nesting(&mut self) {
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    /// Records a recoverable error and skips to a statement boundary, or
    /// hands a fatal error back to abort the file.
    pub(super) fn recover(&mut self, error: ParseError, depth: usize) -> ParseResult<()> {
        if !error.is_recoverable() {
            return Err(error);
        }
        self.errors.push(error);
        self.nesting_depth = depth;
        self.synchronize();
        Ok(())
    }

    /// Skips past the offending token to just after a `;`, or to a `}` or a
    /// statement keyword.
    fn synchronize(&mut self) {
        if !self.is_at_end() {
            self.advance();
        }
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semicolon | TokenKind::CloseTag => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace => return,
                TokenKind::Keyword(keyword) if starts_statement(*keyword) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parses statements until `stop` matches or input ends, recovering from
    /// grammar errors along the way.
    pub(super) fn parse_statement_list(
        &mut self,
        stop: impl Fn(&Token) -> bool,
    ) -> ParseResult<Vec<NodeId>> {
        let mut statements = Vec::new();
        while !self.is_at_end() && !stop(self.current_token()) {
            let depth = self.nesting_depth;
            match self.parse_statement() {
                Ok(Some(id)) => statements.push(id),
                Ok(None) => {}
                Err(error) => self.recover(error, depth)?,
            }
        }
        Ok(statements)
    }

    // ========================================================================
    // Compilation Unit
    // ========================================================================

    fn parse_compilation_unit(&mut self) -> ParseResult<NodeId> {
        let mut children = Vec::new();
        while !self.is_at_end() {
            let depth = self.nesting_depth;
            match self.parse_top_statement() {
                Ok(ids) => children.extend(ids),
                Err(error) => self.recover(error, depth)?,
            }
        }
        let span = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => self.node_span(first).merge(self.node_span(last)),
            _ => Span::empty(0, LineColumn::default()),
        };
        Ok(self.push(NodeKind::CompilationUnit, span, children))
    }

    /// Statements that are only legal outside functions: namespaces and
    /// imports. Everything else defers to [`Parser::parse_statement`].
    fn parse_top_statement(&mut self) -> ParseResult<Vec<NodeId>> {
        if self.check_keyword(Keyword::Namespace) && self.peek_kind(1) != &TokenKind::Backslash {
            return self.parse_namespace().map(|id| vec![id]);
        }
        if self.check_keyword(Keyword::Use) {
            return self.parse_use_imports();
        }
        Ok(self.parse_statement()?.into_iter().collect())
    }

    /// `namespace A\B;` followed by its statements, or `namespace A\B { ... }`.
    fn parse_namespace(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().span();
        let name = if matches!(self.current_kind(), TokenKind::Identifier) {
            self.parse_name()?.0
        } else {
            EcoString::new()
        };
        self.names = NameContext {
            namespace: name.clone(),
            imports: HashMap::new(),
        };

        let children = if self.eat(&TokenKind::LeftBrace) {
            let mut children = Vec::new();
            while !self.check(&TokenKind::RightBrace) {
                if self.is_at_end() {
                    return Err(self.unexpected(&["'}'"]));
                }
                let depth = self.nesting_depth;
                match self.parse_top_statement() {
                    Ok(ids) => children.extend(ids),
                    Err(error) => self.recover(error, depth)?,
                }
            }
            self.advance();
            children
        } else {
            self.finish_statement(start)?;
            let mut children = Vec::new();
            while !self.is_at_end() && !self.check_keyword(Keyword::Namespace) {
                let depth = self.nesting_depth;
                match self.parse_top_statement() {
                    Ok(ids) => children.extend(ids),
                    Err(error) => self.recover(error, depth)?,
                }
            }
            children
        };
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Namespace { name }, span, children))
    }

    /// `use A\B, C\D as E;` and the group form `use A\{B, C as D};`.
    /// `use function` and `use const` are parsed but not recorded.
    fn parse_use_imports(&mut self) -> ParseResult<Vec<NodeId>> {
        let start = self.advance().span();
        let records = !self.check_keyword(Keyword::Function) && !self.check_keyword(Keyword::Const);
        if !records {
            self.advance();
        }
        let mut ids = Vec::new();
        loop {
            let clause_start = self.current_span();
            let (prefix, _) = self.parse_name()?;
            if self.check(&TokenKind::Backslash) && self.peek_kind(1) == &TokenKind::LeftBrace {
                self.advance();
                self.advance();
                loop {
                    let (name, _) = self.parse_name()?;
                    let full = eco_format(&[prefix.trim_start_matches('\\'), "\\", &name]);
                    let id = self.finish_import(clause_start, full, records)?;
                    ids.extend(id);
                    if !self.eat(&TokenKind::Comma) || self.check(&TokenKind::RightBrace) {
                        break;
                    }
                }
                self.expect(&TokenKind::RightBrace, "'}'")?;
            } else {
                let full: EcoString = prefix.trim_start_matches('\\').into();
                ids.extend(self.finish_import(clause_start, full, records)?);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.finish_statement(start)?;
        Ok(ids)
    }

    fn finish_import(
        &mut self,
        start: Span,
        name: EcoString,
        records: bool,
    ) -> ParseResult<Option<NodeId>> {
        let alias: EcoString = if self.eat_keyword(Keyword::As) {
            self.expect(&TokenKind::Identifier, "alias name")?.text().clone()
        } else {
            name.rsplit('\\').next().unwrap_or(&name).into()
        };
        if !records {
            return Ok(None);
        }
        self.names
            .imports
            .insert(alias.to_ascii_lowercase().into(), name.clone());
        let span = self.span_from(start);
        Ok(Some(self.push(NodeKind::UseImport { name, alias }, span, vec![])))
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Parses a possibly qualified name as written: `Foo`, `\Foo\Bar`,
    /// `namespace\Foo`. Segments after the first may be keywords.
    pub(super) fn parse_name(&mut self) -> ParseResult<(EcoString, Span)> {
        let start = self.current_span();
        let mut written = EcoString::new();
        if self.check_keyword(Keyword::Namespace) && self.peek_kind(1) == &TokenKind::Backslash {
            self.advance();
            written.push_str("namespace");
        } else if self.eat(&TokenKind::Backslash) {
            written.push('\\');
        } else if matches!(self.current_kind(), TokenKind::Identifier) {
            written.push_str(&self.advance().text().clone());
        } else {
            return Err(self.unexpected(&["name"]));
        }
        loop {
            let ends_with_separator = written.ends_with('\\');
            if ends_with_separator {
                if !matches!(
                    self.current_kind(),
                    TokenKind::Identifier | TokenKind::Keyword(_)
                ) {
                    return Err(self.unexpected(&["name"]));
                }
                written.push_str(&self.advance().text().clone());
            } else if self.check(&TokenKind::Backslash)
                && matches!(
                    self.peek_kind(1),
                    TokenKind::Identifier | TokenKind::Keyword(_)
                )
            {
                self.advance();
                written.push('\\');
            } else {
                break;
            }
        }
        Ok((written, self.span_from(start)))
    }

    /// A name valid after `->`, `::` or `function`: any identifier or keyword.
    pub(super) fn parse_member_name(&mut self) -> ParseResult<(EcoString, Span)> {
        match self.current_kind() {
            TokenKind::Identifier | TokenKind::Keyword(_) => {
                let token = self.advance();
                Ok((token.text().clone(), token.span()))
            }
            _ => Err(self.unexpected(&["identifier"])),
        }
    }
}

/// Keywords that begin a statement, used as recovery points.
const fn starts_statement(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::If
            | Keyword::While
            | Keyword::Do
            | Keyword::For
            | Keyword::Foreach
            | Keyword::Switch
            | Keyword::Return
            | Keyword::Echo
            | Keyword::Try
            | Keyword::Class
            | Keyword::Interface
            | Keyword::Trait
            | Keyword::Function
            | Keyword::Abstract
            | Keyword::Final
            | Keyword::Public
            | Keyword::Protected
            | Keyword::Private
            | Keyword::Case
            | Keyword::Default
            | Keyword::Namespace
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::LexErrorKind;
    use crate::test_helpers::{find_all, find_first, parse_errors, parse_ok};

    #[test]
    fn binding_powers_order_tiers() {
        let or = binary_binding_power("or").unwrap();
        let and = binary_binding_power("&&").unwrap();
        let plus = binary_binding_power("+").unwrap();
        let times = binary_binding_power("*").unwrap();
        assert!(or.left < and.left);
        assert!(and.left < plus.left);
        assert!(plus.left < times.left);
        assert!(binary_binding_power("=").is_none());
        assert!(is_assignment_operator("??="));
    }

    #[test]
    fn power_and_coalesce_are_right_associative() {
        let pow = binary_binding_power("**").unwrap();
        assert!(pow.left > pow.right);
        let coalesce = binary_binding_power("??").unwrap();
        assert!(coalesce.left > coalesce.right);
    }

    #[test]
    fn name_context_resolution() {
        let mut names = NameContext {
            namespace: "App\\Model".into(),
            imports: HashMap::new(),
        };
        names.imports.insert("base".into(), "Lib\\Base".into());
        assert_eq!(names.resolve_class("\\Exception"), "Exception");
        assert_eq!(names.resolve_class("User"), "App\\Model\\User");
        assert_eq!(names.resolve_class("BASE"), "Lib\\Base");
        assert_eq!(names.resolve_class("Base\\Inner"), "Lib\\Base\\Inner");
        assert_eq!(names.resolve_class("namespace\\Sub\\X"), "App\\Model\\Sub\\X");
    }

    #[test]
    fn non_ascii_class_names_resolve() {
        let names = NameContext::default();
        assert_eq!(names.resolve_class("abcdefghié"), "abcdefghié");
        assert_eq!(names.resolve_class("NAMESPACE\\Ünï"), "Ünï");

        let tree = parse_ok("<?php new abcdefghié; class Çlass extends abcdefghié {}");
        let class = find_first(&tree, |k| matches!(k, NodeKind::Class { .. })).unwrap();
        assert!(matches!(
            tree.kind(class),
            NodeKind::Class { name, parent, .. }
                if name == "Çlass" && parent.as_deref() == Some("abcdefghié")
        ));
    }

    #[test]
    fn namespace_statement_form_owns_following_statements() {
        let tree = parse_ok("<?php namespace App; class A {} function f() {}");
        let ns = find_first(&tree, |k| matches!(k, NodeKind::Namespace { .. })).unwrap();
        assert_eq!(tree.children(ns).len(), 2);
        let class = find_first(&tree, |k| matches!(k, NodeKind::Class { .. })).unwrap();
        assert!(matches!(
            tree.kind(class),
            NodeKind::Class { name, .. } if name == "App\\A"
        ));
    }

    #[test]
    fn braced_namespaces() {
        let tree = parse_ok("<?php namespace A { class X {} } namespace { class Y {} }");
        let names: Vec<_> = find_all(&tree, |k| matches!(k, NodeKind::Class { .. }))
            .into_iter()
            .map(|id| match tree.kind(id) {
                NodeKind::Class { name, .. } => name.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["A\\X", "Y"]);
    }

    #[test]
    fn use_imports_resolve_parent_names() {
        let tree = parse_ok(
            "<?php namespace App; use Lib\\Base as Root, Lib\\{Util, Other as O}; class A extends Root implements O {}",
        );
        let imports = find_all(&tree, |k| matches!(k, NodeKind::UseImport { .. }));
        assert_eq!(imports.len(), 3);
        let class = find_first(&tree, |k| matches!(k, NodeKind::Class { .. })).unwrap();
        match tree.kind(class) {
            NodeKind::Class {
                parent, interfaces, ..
            } => {
                assert_eq!(parent.as_deref(), Some("Lib\\Base"));
                assert_eq!(interfaces, &vec![EcoString::from("Lib\\Other")]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn recoverable_errors_are_all_reported() {
        let errors = parse_errors("<?php $a = ; $b = 1; $c = );");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(ParseError::is_recoverable));
    }

    #[test]
    fn lex_error_aborts_file() {
        let errors = parse_errors("<?php $a = 'open");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            ParseErrorKind::Lex(LexErrorKind::UnterminatedString)
        );
    }

    #[test]
    fn unclosed_block_is_token_stream_end() {
        let errors = parse_errors("<?php function f() { $a = 1;");
        assert!(matches!(
            errors.last().map(|e| &e.kind),
            Some(ParseErrorKind::TokenStreamEnd { .. })
        ));
    }

    #[test]
    fn deep_nesting_is_rejected_without_overflow() {
        let source = format!("<?php $a = {}1{};", "(".repeat(300), ")".repeat(300));
        let errors = parse_errors(&source);
        assert!(matches!(
            errors.last().map(|e| &e.kind),
            Some(ParseErrorKind::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn compilation_unit_of_html_only_file_is_empty() {
        let tree = parse_ok("<html></html>");
        assert!(tree.children(tree.root()).is_empty());
    }
}
