// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for PHP source.
//!
//! The lexer starts outside PHP mode: everything up to the first open tag is
//! inline HTML trivia. Inside PHP mode it produces [`Token`]s carrying their
//! literal text and a [`Span`] with line/column positions. `?>` produces a
//! [`TokenKind::CloseTag`] token and switches back to HTML mode.
//!
//! # Error Recovery
//!
//! The lexer never fails completely. Stray characters, unterminated strings
//! and unterminated comments produce [`TokenKind::Error`] tokens; the parser
//! turns them into fatal [`LexError`]s for the file.
//!
//! ```
//! use strata_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("<?php $x + 1;").collect();
//! assert_eq!(tokens.len(), 4); // $x, +, 1, ;
//! assert_eq!(tokens[0].kind(), &TokenKind::Variable);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{
    Keyword, LexError, LexErrorKind, LineColumn, Span, Token, TokenKind, Trivia,
};

/// Casts accepted inside `( ... )`.
const CAST_TYPES: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real", "string", "array",
    "object", "unset", "binary",
];

/// Symbolic tokens, longest first so that matching is greedy.
const SYMBOLS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::Operator),
    ("!==", TokenKind::Operator),
    ("<=>", TokenKind::Operator),
    ("**=", TokenKind::Operator),
    ("<<=", TokenKind::Operator),
    (">>=", TokenKind::Operator),
    ("??=", TokenKind::Operator),
    ("?->", TokenKind::Arrow),
    ("...", TokenKind::Ellipsis),
    ("?>", TokenKind::CloseTag),
    ("->", TokenKind::Arrow),
    ("=>", TokenKind::DoubleArrow),
    ("::", TokenKind::DoubleColon),
    ("==", TokenKind::Operator),
    ("!=", TokenKind::Operator),
    ("<>", TokenKind::Operator),
    ("<=", TokenKind::Operator),
    (">=", TokenKind::Operator),
    ("&&", TokenKind::Operator),
    ("||", TokenKind::Operator),
    ("++", TokenKind::Operator),
    ("--", TokenKind::Operator),
    ("+=", TokenKind::Operator),
    ("-=", TokenKind::Operator),
    ("*=", TokenKind::Operator),
    ("/=", TokenKind::Operator),
    (".=", TokenKind::Operator),
    ("%=", TokenKind::Operator),
    ("&=", TokenKind::Operator),
    ("|=", TokenKind::Operator),
    ("^=", TokenKind::Operator),
    ("<<", TokenKind::Operator),
    (">>", TokenKind::Operator),
    ("??", TokenKind::Operator),
    ("**", TokenKind::Operator),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    (":", TokenKind::Colon),
    ("?", TokenKind::Question),
    ("\\", TokenKind::Backslash),
    ("+", TokenKind::Operator),
    ("-", TokenKind::Operator),
    ("*", TokenKind::Operator),
    ("/", TokenKind::Operator),
    ("%", TokenKind::Operator),
    ("=", TokenKind::Operator),
    ("<", TokenKind::Operator),
    (">", TokenKind::Operator),
    ("!", TokenKind::Operator),
    (".", TokenKind::Operator),
    ("&", TokenKind::Operator),
    ("|", TokenKind::Operator),
    ("^", TokenKind::Operator),
    ("~", TokenKind::Operator),
    ("@", TokenKind::Operator),
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || !c.is_ascii()
}

/// A position captured at the start of a token or trivia item.
#[derive(Debug, Clone, Copy)]
struct Mark {
    offset: u32,
    at: LineColumn,
}

/// A lexer for PHP source text. Implements [`Iterator`] over the tokens
/// before end of file.
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    position: usize,
    /// Position of the next character.
    next_at: LineColumn,
    /// Position of the last consumed character.
    last_at: LineColumn,
    in_php: bool,
    pending_trivia: Vec<Trivia>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("in_php", &self.in_php)
            .finish_non_exhaustive()
    }
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            next_at: LineColumn::new(1, 1),
            last_at: LineColumn::new(1, 1),
            in_php: false,
            pending_trivia: Vec::new(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead (n=0 is the same as `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        self.last_at = self.next_at;
        if c == '\n' {
            self.next_at = LineColumn::new(self.next_at.line + 1, 1);
        } else {
            self.next_at.column += 1;
        }
        Some(c)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Consumes `count` bytes worth of characters.
    fn advance_bytes(&mut self, count: usize) {
        let target = self.position + count;
        while self.position < target && self.advance().is_some() {}
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn mark(&self) -> Mark {
        Mark {
            offset: self.position as u32,
            at: self.next_at,
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn span_from(&self, start: Mark) -> Span {
        let end = self.position as u32;
        if end == start.offset {
            Span::empty(end, start.at)
        } else {
            Span::new(start.offset..end, start.at, self.last_at)
        }
    }

    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Collects trivia in front of the next token. Returns an error token if
    /// a block comment runs to end of file.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            if !self.in_php {
                self.lex_inline_html();
                if self.in_php {
                    continue;
                }
                return None;
            }
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    let start = self.mark();
                    self.advance_while(char::is_whitespace);
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia.push(Trivia::Whitespace(text.into()));
                }
                Some('#') => self.lex_line_comment(),
                Some('/') if self.peek_char_n(1) == Some('/') => self.lex_line_comment(),
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    if let Some(error) = self.lex_block_comment() {
                        return Some(error);
                    }
                }
                _ => return None,
            }
        }
    }

    /// Consumes text up to the next open tag. `<?=` is left in place so that
    /// it lexes as an `echo` keyword.
    fn lex_inline_html(&mut self) {
        let Some(tag_offset) = self.rest().find("<?") else {
            let start = self.mark();
            self.advance_while(|_| true);
            self.push_html(start);
            return;
        };
        let start = self.mark();
        self.advance_bytes(tag_offset);
        self.push_html(start);
        self.in_php = true;

        if self.rest().starts_with("<?=") {
            return;
        }
        let start = self.mark();
        let is_long = self
            .rest()
            .get(2..5)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("php"));
        self.advance_bytes(if is_long { 5 } else { 2 });
        let text = self.text_for(self.span_from(start));
        self.pending_trivia.push(Trivia::OpenTag(text.into()));
    }

    fn push_html(&mut self, start: Mark) {
        let span = self.span_from(start);
        if !span.is_empty() {
            let text = self.text_for(span);
            self.pending_trivia.push(Trivia::InlineHtml(text.into()));
        }
    }

    /// `// ...` or `# ...`, ending at a newline or before `?>`.
    fn lex_line_comment(&mut self) {
        let start = self.mark();
        while let Some(c) = self.peek_char() {
            if c == '\n' || (c == '?' && self.peek_char_n(1) == Some('>')) {
                break;
            }
            self.advance();
        }
        let text = self.text_for(self.span_from(start));
        self.pending_trivia.push(Trivia::LineComment(text.into()));
    }

    /// `/* ... */` or `/** ... */`.
    fn lex_block_comment(&mut self) -> Option<Token> {
        let start = self.mark();
        let is_doc = self.rest().starts_with("/**") && !self.rest().starts_with("/**/");
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek_char() {
                None => {
                    let span = self.span_from(start);
                    return Some(self.error_token(LexErrorKind::UnterminatedComment, span));
                }
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        let text: EcoString = self.text_for(self.span_from(start)).into();
        self.pending_trivia.push(if is_doc {
            Trivia::DocComment(text)
        } else {
            Trivia::BlockComment(text)
        });
        None
    }

    fn error_token(&mut self, kind: LexErrorKind, span: Span) -> Token {
        let text = self.text_for(span);
        Token::with_trivia(
            TokenKind::Error(kind),
            text,
            span,
            std::mem::take(&mut self.pending_trivia),
        )
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Lexes the next token, returning an EOF token at the end of input.
    pub fn lex_token(&mut self) -> Token {
        if let Some(error) = self.skip_trivia() {
            return error;
        }
        let start = self.mark();
        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c),
        };
        let span = self.span_from(start);
        let text = self.text_for(span);
        Token::with_trivia(kind, text, span, std::mem::take(&mut self.pending_trivia))
    }

    fn lex_token_kind(&mut self, c: char) -> TokenKind {
        match c {
            '$' if self.peek_char_n(1).is_some_and(is_ident_start) => {
                self.advance();
                self.advance_while(is_ident_continue);
                TokenKind::Variable
            }
            '$' => {
                self.advance();
                TokenKind::Dollar
            }
            c if is_ident_start(c) => self.lex_identifier_or_keyword(),
            '0'..='9' => self.lex_number(),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            '\'' => self.lex_quoted('\''),
            '"' => self.lex_quoted('"'),
            '`' => self.lex_quoted('`'),
            '<' if self.rest().starts_with("<<<") => self.lex_heredoc(),
            '<' if self.rest().starts_with("<?=") => {
                self.advance_bytes(3);
                TokenKind::Keyword(Keyword::Echo)
            }
            '(' => match self.cast_length() {
                Some(length) => {
                    self.advance_bytes(length);
                    TokenKind::Cast
                }
                None => self.lex_symbol(c),
            },
            _ => self.lex_symbol(c),
        }
    }

    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.mark();
        self.advance_while(is_ident_continue);
        let text = self.text_for(self.span_from(start));
        Keyword::from_ident(text).map_or(TokenKind::Identifier, TokenKind::Keyword)
    }

    fn lex_number(&mut self) -> TokenKind {
        let radix_digits: Option<fn(char) -> bool> = match (self.peek_char(), self.peek_char_n(1)) {
            (Some('0'), Some('x' | 'X')) => Some(|c| c.is_ascii_hexdigit() || c == '_'),
            (Some('0'), Some('b' | 'B')) => Some(|c| matches!(c, '0' | '1' | '_')),
            _ => None,
        };
        if let Some(digits) = radix_digits {
            self.advance();
            self.advance();
            self.advance_while(digits);
            return TokenKind::Integer;
        }

        self.advance_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit() || c == '_');
            is_float = true;
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char_n(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
                is_float = true;
            }
        }
        if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        }
    }

    /// Single-quoted, double-quoted and backtick strings. Interpolated
    /// `{$...}` sections may contain nested quotes.
    fn lex_quoted(&mut self, quote: char) -> TokenKind {
        self.advance();
        let mut brace_depth = 0usize;
        loop {
            match self.peek_char() {
                None => return TokenKind::Error(LexErrorKind::UnterminatedString),
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('{') if quote != '\'' && self.peek_char_n(1) == Some('$') => {
                    brace_depth += 1;
                    self.advance();
                }
                Some('}') if brace_depth > 0 => {
                    brace_depth -= 1;
                    self.advance();
                }
                Some(c @ ('\'' | '"')) if brace_depth > 0 && c != quote => {
                    if let TokenKind::Error(kind) = self.lex_quoted(c) {
                        return TokenKind::Error(kind);
                    }
                }
                Some(c) if c == quote && brace_depth == 0 => {
                    self.advance();
                    return TokenKind::String;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// `<<<ID` / `<<<"ID"` / `<<<'ID'` up to a line starting with `ID`.
    fn lex_heredoc(&mut self) -> TokenKind {
        self.advance_bytes(3);
        self.advance_while(|c| c == ' ' || c == '\t');
        let quoted = matches!(self.peek_char(), Some('\'' | '"'));
        if quoted {
            self.advance();
        }
        let start = self.mark();
        self.advance_while(is_ident_continue);
        let label: EcoString = self.text_for(self.span_from(start)).into();
        if quoted {
            self.advance();
        }
        if label.is_empty() {
            return TokenKind::Error(LexErrorKind::UnterminatedHeredoc(label));
        }

        loop {
            self.advance_while(|c| c != '\n');
            if self.advance().is_none() {
                return TokenKind::Error(LexErrorKind::UnterminatedHeredoc(label));
            }
            let line = self.rest().trim_start_matches([' ', '\t']);
            let indent = self.rest().len() - line.len();
            if let Some(after) = line.strip_prefix(label.as_str()) {
                if !after.starts_with(is_ident_continue) {
                    self.advance_bytes(indent + label.len());
                    return TokenKind::String;
                }
            }
        }
    }

    /// Byte length of a cast such as `( int )` at the current position.
    fn cast_length(&self) -> Option<usize> {
        let rest = self.rest().strip_prefix('(')?;
        let inner_start = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        let rest = &rest[inner_start..];
        let word_len = rest.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len());
        let word = &rest[..word_len];
        if !CAST_TYPES.iter().any(|cast| cast.eq_ignore_ascii_case(word)) {
            return None;
        }
        let after = &rest[word_len..];
        let trailing = after.len() - after.trim_start_matches([' ', '\t']).len();
        after[trailing..]
            .starts_with(')')
            .then_some(1 + inner_start + word_len + trailing + 1)
    }

    fn lex_symbol(&mut self, c: char) -> TokenKind {
        let rest = self.rest();
        if let Some((symbol, kind)) = SYMBOLS.iter().find(|(symbol, _)| rest.starts_with(symbol)) {
            self.advance_bytes(symbol.len());
            if *kind == TokenKind::CloseTag {
                self.in_php = false;
            }
            return kind.clone();
        }
        self.advance();
        TokenKind::Error(LexErrorKind::UnexpectedCharacter(c))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lex_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Lexes source into a vector of tokens (excluding EOF).
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lexes source into a vector of tokens including the trailing EOF token.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.lex_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}

/// Decodes raw file bytes, reporting the first invalid UTF-8 sequence.
#[expect(
    clippy::cast_possible_truncation,
    reason = "source files over 4GB are not supported"
)]
pub fn decode_source(bytes: &[u8]) -> Result<&str, LexError> {
    std::str::from_utf8(bytes).map_err(|error| {
        let valid = error.valid_up_to();
        let prefix = String::from_utf8_lossy(&bytes[..valid]);
        let line = prefix.matches('\n').count() as u32 + 1;
        let column = prefix
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count()) as u32
            + 1;
        let width = error.error_len().unwrap_or(bytes.len() - valid) as u32;
        let at = LineColumn::new(line, column);
        let offset = valid as u32;
        LexError::new(
            LexErrorKind::InvalidUtf8,
            Span::new(offset..offset + width, at, at),
        )
    })
}
