// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token definitions.
//!
//! Tokens keep the literal source text alongside their kind so the parser can
//! build names and literals without going back to the source.

use std::fmt;

use ecow::EcoString;

use super::{LexErrorKind, Span};

/// Reserved words. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abstract,
    And,
    Array,
    As,
    Break,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Default,
    Die,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Exit,
    Extends,
    Final,
    Finally,
    For,
    Foreach,
    Function,
    Global,
    If,
    Implements,
    Include,
    IncludeOnce,
    Instanceof,
    Insteadof,
    Interface,
    Isset,
    Namespace,
    New,
    Or,
    Parent,
    Print,
    Private,
    Protected,
    Public,
    Require,
    RequireOnce,
    Return,
    SelfType,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,
    Xor,
}

impl Keyword {
    /// Looks up a keyword by identifier text, ignoring case.
    #[must_use]
    pub fn from_ident(ident: &str) -> Option<Self> {
        let keyword = match ident.to_ascii_lowercase().as_str() {
            "abstract" => Self::Abstract,
            "and" => Self::And,
            "array" => Self::Array,
            "as" => Self::As,
            "break" => Self::Break,
            "case" => Self::Case,
            "catch" => Self::Catch,
            "class" => Self::Class,
            "clone" => Self::Clone,
            "const" => Self::Const,
            "continue" => Self::Continue,
            "default" => Self::Default,
            "die" => Self::Die,
            "do" => Self::Do,
            "echo" => Self::Echo,
            "else" => Self::Else,
            "elseif" => Self::ElseIf,
            "empty" => Self::Empty,
            "endfor" => Self::EndFor,
            "endforeach" => Self::EndForeach,
            "endif" => Self::EndIf,
            "endswitch" => Self::EndSwitch,
            "endwhile" => Self::EndWhile,
            "exit" => Self::Exit,
            "extends" => Self::Extends,
            "final" => Self::Final,
            "finally" => Self::Finally,
            "for" => Self::For,
            "foreach" => Self::Foreach,
            "function" => Self::Function,
            "global" => Self::Global,
            "if" => Self::If,
            "implements" => Self::Implements,
            "include" => Self::Include,
            "include_once" => Self::IncludeOnce,
            "instanceof" => Self::Instanceof,
            "insteadof" => Self::Insteadof,
            "interface" => Self::Interface,
            "isset" => Self::Isset,
            "namespace" => Self::Namespace,
            "new" => Self::New,
            "or" => Self::Or,
            "parent" => Self::Parent,
            "print" => Self::Print,
            "private" => Self::Private,
            "protected" => Self::Protected,
            "public" => Self::Public,
            "require" => Self::Require,
            "require_once" => Self::RequireOnce,
            "return" => Self::Return,
            "self" => Self::SelfType,
            "static" => Self::Static,
            "switch" => Self::Switch,
            "throw" => Self::Throw,
            "trait" => Self::Trait,
            "try" => Self::Try,
            "unset" => Self::Unset,
            "use" => Self::Use,
            "var" => Self::Var,
            "while" => Self::While,
            "xor" => Self::Xor,
            _ => return None,
        };
        Some(keyword)
    }

    /// Keywords that act as binary operators.
    #[must_use]
    pub const fn is_operator(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Xor | Self::Instanceof)
    }

    /// `self`, `parent` and `static`.
    #[must_use]
    pub const fn is_late_bound(self) -> bool {
        matches!(self, Self::SelfType | Self::Parent | Self::Static)
    }
}

/// Whitespace, comments and text outside the PHP tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trivia {
    Whitespace(EcoString),
    /// `// text` or `# text`
    LineComment(EcoString),
    /// `/* text */`
    BlockComment(EcoString),
    /// `/** text */`
    DocComment(EcoString),
    /// Text outside `<?php ... ?>`.
    InlineHtml(EcoString),
    /// `<?php` or `<?`
    OpenTag(EcoString),
}

impl Trivia {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Whitespace(s)
            | Self::LineComment(s)
            | Self::BlockComment(s)
            | Self::DocComment(s)
            | Self::InlineHtml(s)
            | Self::OpenTag(s) => s,
        }
    }

    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(
            self,
            Self::LineComment(_) | Self::BlockComment(_) | Self::DocComment(_)
        )
    }
}

/// The kind of a token. The literal text lives on [`Token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare name: `foo`, `Bar`, `true`
    Identifier,
    /// `$name`
    Variable,
    /// `42`, `0x1F`, `0b101`, `017`
    Integer,
    /// `1.5`, `2e10`
    Float,
    /// A single-quoted, double-quoted or heredoc string.
    String,
    Keyword(Keyword),
    /// `(int)`, `(string)`, ...
    Cast,
    /// Any symbolic operator: `+`, `===`, `+=`, `&&`, `!`, `@`, `++`, ...
    Operator,
    Semicolon,
    Comma,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    /// `::`
    DoubleColon,
    /// `->`
    Arrow,
    /// `=>`
    DoubleArrow,
    Question,
    Backslash,
    /// `$` not followed by a name.
    Dollar,
    /// `...`
    Ellipsis,
    /// `?>`
    CloseTag,
    Eof,
    Error(LexErrorKind),
}

impl TokenKind {
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub const fn keyword(&self) -> Option<Keyword> {
        match self {
            Self::Keyword(keyword) => Some(*keyword),
            _ => None,
        }
    }

    /// Whether this token ends a statement: `;` or `?>`.
    #[must_use]
    pub const fn is_statement_end(&self) -> bool {
        matches!(self, Self::Semicolon | Self::CloseTag)
    }
}

/// A token with its literal text, location and leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: EcoString,
    span: Span,
    leading_trivia: Vec<Trivia>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<EcoString>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            leading_trivia: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_trivia(
        kind: TokenKind,
        text: impl Into<EcoString>,
        span: Span,
        leading_trivia: Vec<Trivia>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            leading_trivia,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// The literal source text of the token.
    #[must_use]
    pub fn text(&self) -> &EcoString {
        &self.text
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading_trivia
    }

    /// The last doc comment before this token, if no code intervened.
    #[must_use]
    pub fn doc_comment(&self) -> Option<EcoString> {
        self.leading_trivia.iter().rev().find_map(|trivia| match trivia {
            Trivia::DocComment(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Whether this is the operator token with the given text.
    #[must_use]
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text.as_str() == op
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Eof => f.write_str("end of file"),
            _ => f.write_str(&self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(Keyword::from_ident("CLASS"), Some(Keyword::Class));
        assert_eq!(Keyword::from_ident("EndSwitch"), Some(Keyword::EndSwitch));
        assert_eq!(Keyword::from_ident("self"), Some(Keyword::SelfType));
        assert_eq!(Keyword::from_ident("classy"), None);
    }

    #[test]
    fn operator_keywords() {
        assert!(Keyword::Or.is_operator());
        assert!(Keyword::Instanceof.is_operator());
        assert!(!Keyword::Class.is_operator());
        assert!(Keyword::Static.is_late_bound());
    }

    #[test]
    fn doc_comment_prefers_closest() {
        let token = Token::with_trivia(
            TokenKind::Keyword(Keyword::Class),
            "class",
            Span::default(),
            vec![
                Trivia::DocComment("/** first */".into()),
                Trivia::Whitespace("\n".into()),
                Trivia::DocComment("/** second */".into()),
                Trivia::Whitespace("\n".into()),
            ],
        );
        assert_eq!(token.doc_comment().as_deref(), Some("/** second */"));
    }

    #[test]
    fn display_uses_text() {
        let token = Token::new(TokenKind::Variable, "$a", Span::default());
        assert_eq!(token.to_string(), "$a");
        let eof = Token::new(TokenKind::Eof, "", Span::default());
        assert_eq!(eof.to_string(), "end of file");
    }
}
