// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexing and parsing of PHP source.
//!
//! **DDD Context:** Source Analysis
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] turns source text into [`Token`]s with line/column
//! [`Span`]s. Whitespace, comments and inline HTML are kept as leading
//! [`Trivia`] on the following token, which is how doc comments reach
//! declarations. [`TokenStream`] adds lookahead and backtracking on top.
//!
//! ```
//! use strata_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("<?php echo 1;").collect();
//! assert_eq!(tokens.len(), 3); // echo, 1, ;
//! ```
//!
//! # Parsing
//!
//! [`parse`] builds a [`SyntaxTree`](crate::ast::SyntaxTree) per file. Binary
//! operator precedence uses Pratt parsing (see the `parser` module).
//!
//! # Error Handling
//!
//! Lexing never stops: bad input becomes a [`TokenKind::Error`] token. The
//! parser reports it as a [`ParseErrorKind::Lex`] error, which aborts the
//! file. Grammar errors are collected and parsing resumes at the next
//! statement.

mod error;
mod lexer;
mod parser;
mod span;
mod token;
mod token_stream;


pub use error::{Expected, LexError, LexErrorKind, ParseError, ParseErrorKind, ScopeViolation};
pub use lexer::{decode_source, lex, lex_with_eof, Lexer};
pub use parser::{parse, parse_tokens};
pub use span::{LineColumn, Span};
pub use token::{Keyword, Token, TokenKind, Trivia};
pub use token_stream::{Checkpoint, TokenStream};
