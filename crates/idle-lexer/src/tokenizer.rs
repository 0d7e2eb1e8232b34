//! Rule-table tokenizer.
//!
//! At each position the rules are tried in a fixed order and the first one
//! matching at that exact position wins. Whitespace and comments are consumed
//! but not emitted. A position no rule matches yields a one-character
//! [`TokenKind::Unknown`] token, so the scan always advances and every input
//! string tokenizes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Keywords recognised by [`Tokenizer::new`].
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "async",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "from",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "null",
    "of",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "yield",
];

const NUMBER: &str =
    r"^(?:0[xX][0-9a-fA-F]+|0[bB][01]+|0[oO][0-7]+|[0-9]+(?:\.[0-9]*)?(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?)";
const STRING: &str = r#"^(?:"(?:[^"\\]|\\[\s\S])*"|'(?:[^'\\]|\\[\s\S])*'|`(?:[^`\\]|\\[\s\S])*`)"#;
const IDENTIFIER: &str = r"^[A-Za-z_$][A-Za-z0-9_$]*";
const COMMENT: &str = r"^(?://[^\n]*|/\*[\s\S]*?\*/)";
// Longest operators first so `===` never splits into `==` and `=`.
const OPERATOR: &str = r"^(?:>>>=|===|!==|\*\*=|<<=|>>=|>>>|\.\.\.|&&=|\|\|=|\?\?=|=>|==|!=|<=|>=|&&|\|\||\?\?|\?\.|\+\+|--|\+=|-=|\*=|/=|%=|&=|\|=|\^=|\*\*|<<|>>|[+\-*/%=<>!&|^~?:])";
const DELIMITER: &str = r"^[(){}\[\];,.]";
const WHITESPACE: &str = r"^\s+";

/// Kind of an emitted token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Keyword,
    Number,
    String,
    Identifier,
    Operator,
    Delimiter,
    /// A character no rule matched.
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Delimiter => "DELIMITER",
            TokenKind::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A lexeme with its position in the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Offset of the first character, counted in Unicode scalar values.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in Unicode scalar values.
    pub column: usize,
}

/// Errors building a custom rule table.
#[derive(Debug, Error)]
pub enum LexerError {
    #[error("invalid token pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("keyword list is empty")]
    NoKeywords,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RuleAction {
    Emit(TokenKind),
    Skip,
}

#[derive(Clone, Debug)]
struct Rule {
    action: RuleAction,
    pattern: Regex,
}

/// Converts source text into tokens.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    rules: Vec<Rule>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Tokenizer with [`DEFAULT_KEYWORDS`].
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_KEYWORDS).expect("built-in token patterns compile")
    }

    /// Tokenizer recognising a custom keyword set.
    pub fn with_keywords(keywords: &[&str]) -> Result<Self, LexerError> {
        if keywords.is_empty() {
            return Err(LexerError::NoKeywords);
        }
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let keyword = format!(r"^(?:{alternation})\b");
        // COMMENT precedes OPERATOR so `//` and `/*` are not read as division.
        let table: [(RuleAction, &str); 8] = [
            (RuleAction::Emit(TokenKind::Keyword), keyword.as_str()),
            (RuleAction::Emit(TokenKind::Number), NUMBER),
            (RuleAction::Emit(TokenKind::String), STRING),
            (RuleAction::Emit(TokenKind::Identifier), IDENTIFIER),
            (RuleAction::Skip, COMMENT),
            (RuleAction::Emit(TokenKind::Operator), OPERATOR),
            (RuleAction::Emit(TokenKind::Delimiter), DELIMITER),
            (RuleAction::Skip, WHITESPACE),
        ];
        let mut rules = Vec::with_capacity(table.len());
        for (action, pattern) in table {
            rules.push(Rule {
                action,
                pattern: Regex::new(pattern)?,
            });
        }
        Ok(Self { rules })
    }

    fn match_at(&self, rest: &str) -> (usize, RuleAction) {
        for rule in &self.rules {
            if let Some(m) = rule.pattern.find(rest) {
                if m.start() == 0 && m.end() > 0 {
                    return (m.end(), rule.action);
                }
            }
        }
        let width = rest.chars().next().map_or(1, char::len_utf8);
        (width, RuleAction::Emit(TokenKind::Unknown))
    }

    /// Tokenize `source`. Never fails; the empty string yields no tokens.
    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0usize;
        let mut offset = 0usize;
        let mut line = 1usize;
        let mut column = 1usize;

        while pos < source.len() {
            let rest = &source[pos..];
            let (len, action) = self.match_at(rest);
            let text = &rest[..len];
            if let RuleAction::Emit(kind) = action {
                tokens.push(Token {
                    kind,
                    value: text.to_string(),
                    offset,
                    line,
                    column,
                });
            }
            let chars = text.chars().count();
            offset += chars;
            match text.rfind('\n') {
                Some(last) => {
                    line += text.matches('\n').count();
                    column = 1 + text[last + 1..].chars().count();
                }
                None => column += chars,
            }
            pos += len;
        }
        trace!(tokens = tokens.len(), chars = offset, "tokenized");
        tokens
    }
}

/// Number of tokens per kind.
pub fn count_by_kind(tokens: &[Token]) -> BTreeMap<TokenKind, usize> {
    let mut counts = BTreeMap::new();
    for t in tokens {
        *counts.entry(t.kind).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds_and_values(src: &str) -> Vec<(TokenKind, String)> {
        Tokenizer::new()
            .tokenize(src)
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn let_statement() {
        use TokenKind::*;
        let got = kinds_and_values("let x = 1;");
        let want = vec![
            (Keyword, "let".to_string()),
            (Identifier, "x".to_string()),
            (Operator, "=".to_string()),
            (Number, "1".to_string()),
            (Delimiter, ";".to_string()),
        ];
        assert_eq!(got, want);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(Tokenizer::new().tokenize("").is_empty());
        assert!(Tokenizer::new().tokenize("  \n\t ").is_empty());
    }

    #[test]
    fn keywords_need_word_boundary() {
        use TokenKind::*;
        assert_eq!(
            kinds_and_values("letter instanceof in"),
            vec![
                (Identifier, "letter".to_string()),
                (Keyword, "instanceof".to_string()),
                (Keyword, "in".to_string()),
            ]
        );
    }

    #[test]
    fn operators_are_greedy() {
        let got = kinds_and_values("a === b => c !== d >>>= e ...f");
        let ops: Vec<String> = got
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Operator)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(ops, vec!["===", "=>", "!==", ">>>=", "..."]);
    }

    #[test]
    fn strings_with_escapes() {
        let got = kinds_and_values(r#""a\"b" 'it\'s' `x`"#);
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|(k, _)| *k == TokenKind::String));
        assert_eq!(got[0].1, r#""a\"b""#);
    }

    #[test]
    fn comments_are_discarded() {
        use TokenKind::*;
        assert_eq!(
            kinds_and_values("a // note\n/* block\n comment */ b / c"),
            vec![
                (Identifier, "a".to_string()),
                (Identifier, "b".to_string()),
                (Operator, "/".to_string()),
                (Identifier, "c".to_string()),
            ]
        );
    }

    #[test]
    fn numbers() {
        let got = kinds_and_values("0xFF 3.14 1e10 .5 42");
        assert!(got.iter().all(|(k, _)| *k == TokenKind::Number));
        assert_eq!(got.len(), 5);
    }

    #[test]
    fn unknown_characters_advance_one_at_a_time() {
        let tokens = Tokenizer::new().tokenize("a @# b");
        let unknown: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Unknown)
            .collect();
        assert_eq!(unknown.len(), 2);
        assert_eq!(unknown[0].value, "@");
        assert_eq!(unknown[1].value, "#");
        assert_eq!(unknown[1].column, 4);
        let emoji = Tokenizer::new().tokenize("é");
        assert_eq!(emoji.len(), 1);
        assert_eq!(emoji[0].kind, TokenKind::Unknown);
    }

    #[test]
    fn positions_track_multiline_matches() {
        let src = "a /* one\ntwo\nthree */ b\n  c `x\ny` d";
        let tokens = Tokenizer::new().tokenize(src);
        let pos: Vec<(&str, usize, usize, usize)> = tokens
            .iter()
            .map(|t| (t.value.as_str(), t.offset, t.line, t.column))
            .collect();
        assert_eq!(pos[0], ("a", 0, 1, 1));
        // "three */ " leaves the column at 1 + 9.
        assert_eq!(pos[1], ("b", 22, 3, 10));
        assert_eq!(pos[2], ("c", 26, 4, 3));
        assert_eq!(pos[3].1, 28);
        assert_eq!((pos[4].0, pos[4].2, pos[4].3), ("d", 5, 4));
    }

    #[test]
    fn custom_keywords() {
        let t = Tokenizer::with_keywords(&["fn", "mut"]).unwrap();
        let tokens = t.tokenize("fn let");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert!(matches!(
            Tokenizer::with_keywords(&[]),
            Err(LexerError::NoKeywords)
        ));
    }

    #[test]
    fn counts_per_kind() {
        let tokens = Tokenizer::new().tokenize("let a = b + 1;");
        let counts = count_by_kind(&tokens);
        assert_eq!(counts[&TokenKind::Identifier], 2);
        assert_eq!(counts[&TokenKind::Operator], 2);
        assert_eq!(counts.get(&TokenKind::String), None);
    }

    proptest! {
        #[test]
        fn every_token_matches_its_source_span(src in "\\PC{0,64}") {
            let chars: Vec<char> = src.chars().collect();
            let tokens = Tokenizer::new().tokenize(&src);
            let mut last_end = 0usize;
            for t in &tokens {
                let len = t.value.chars().count();
                prop_assert!(len > 0);
                prop_assert!(t.offset >= last_end);
                let span: String = chars[t.offset..t.offset + len].iter().collect();
                prop_assert_eq!(&span, &t.value);
                last_end = t.offset + len;
            }
            prop_assert!(last_end <= chars.len());
        }

        #[test]
        fn arbitrary_bytes_never_stall(src in ".{0,128}") {
            let tokens = Tokenizer::new().tokenize(&src);
            prop_assert!(tokens.len() <= src.chars().count());
        }
    }
}
