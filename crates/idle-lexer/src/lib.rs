#![deny(warnings)]

//! Tokenizer for the manual analysis action.
//!
//! Provides a regex rule-table lexer producing positioned tokens, bracket
//! validation with errors and warnings, the weighted complexity score, and a
//! seeded deck of sample snippets.

pub mod snippets;
pub mod tokenizer;
pub mod validate;

pub use snippets::{SnippetDeck, SNIPPETS};
pub use tokenizer::{count_by_kind, LexerError, Token, TokenKind, Tokenizer, DEFAULT_KEYWORDS};
pub use validate::{complexity_score, complexity_weight, validate, Issue, IssueKind, ValidationReport};
