//! Structural checks and the complexity score over a token stream.

use crate::{Token, TokenKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Category of a validation finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// A closer appeared with no opener on the stack.
    UnmatchedClosingBracket,
    /// A closer did not match the innermost opener.
    MismatchedBrackets,
    /// An opener was still open at end of input.
    UnclosedBracket,
    /// A character no rule recognised. Reported as a warning.
    UnknownToken,
}

/// A single error or warning with the position of the offending token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Issue {
    fn at(kind: IssueKind, token: &Token, message: String) -> Self {
        Self {
            kind,
            message,
            offset: token.offset,
            line: token.line,
            column: token.column,
        }
    }
}

/// Result of [`validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when there are no errors; warnings do not count.
    pub is_valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

fn closer_for(open: &str) -> Option<&'static str> {
    match open {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

fn is_closer(value: &str) -> bool {
    matches!(value, ")" | "]" | "}")
}

/// Check bracket nesting of `(){}[]` and flag unknown characters.
pub fn validate(tokens: &[Token]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut stack: Vec<&Token> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Unknown => warnings.push(Issue::at(
                IssueKind::UnknownToken,
                token,
                format!("unknown character {:?}", token.value),
            )),
            TokenKind::Delimiter if closer_for(&token.value).is_some() => stack.push(token),
            TokenKind::Delimiter if is_closer(&token.value) => match stack.pop() {
                None => errors.push(Issue::at(
                    IssueKind::UnmatchedClosingBracket,
                    token,
                    format!("unmatched closing bracket {:?}", token.value),
                )),
                Some(open) => {
                    if closer_for(&open.value) != Some(token.value.as_str()) {
                        errors.push(Issue::at(
                            IssueKind::MismatchedBrackets,
                            token,
                            format!(
                                "{:?} at {}:{} closed by {:?}",
                                open.value, open.line, open.column, token.value
                            ),
                        ));
                    }
                }
            },
            _ => {}
        }
    }

    for open in stack {
        errors.push(Issue::at(
            IssueKind::UnclosedBracket,
            open,
            format!("unclosed bracket {:?}", open.value),
        ));
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Weight of one token in [`complexity_score`].
pub fn complexity_weight(kind: TokenKind) -> Decimal {
    match kind {
        TokenKind::Keyword => dec!(2),
        TokenKind::Identifier | TokenKind::Number | TokenKind::String => dec!(1),
        TokenKind::Operator => dec!(1.5),
        TokenKind::Delimiter => dec!(0.5),
        TokenKind::Unknown => dec!(3),
    }
}

/// Weighted token sum rounded to one decimal place.
pub fn complexity_score(tokens: &[Token]) -> Decimal {
    tokens
        .iter()
        .map(|t| complexity_weight(t.kind))
        .sum::<Decimal>()
        .round_dp(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tokenizer;

    fn report(src: &str) -> ValidationReport {
        validate(&Tokenizer::new().tokenize(src))
    }

    #[test]
    fn mismatched_pair() {
        let r = report("(]");
        assert!(!r.is_valid);
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].kind, IssueKind::MismatchedBrackets);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn balanced_nesting_is_valid() {
        let r = report("function f(a) { return [a, (a)]; }");
        assert!(r.is_valid);
        assert!(r.errors.is_empty());
    }

    #[test]
    fn unmatched_closer() {
        let r = report("a)");
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].kind, IssueKind::UnmatchedClosingBracket);
        assert_eq!(r.errors[0].column, 2);
    }

    #[test]
    fn every_unclosed_opener_is_reported() {
        let r = report("({[");
        assert_eq!(r.errors.len(), 3);
        assert!(r.errors.iter().all(|e| e.kind == IssueKind::UnclosedBracket));
        assert_eq!(r.errors[0].offset, 0);
    }

    #[test]
    fn unknown_tokens_are_warnings() {
        let r = report("a @ b");
        assert!(r.is_valid);
        assert_eq!(r.warnings.len(), 1);
        assert_eq!(r.warnings[0].kind, IssueKind::UnknownToken);
    }

    #[test]
    fn brackets_inside_strings_and_comments_are_ignored() {
        assert!(report("\"(\" // )\n").is_valid);
    }

    #[test]
    fn complexity_of_let_statement() {
        let tokens = Tokenizer::new().tokenize("let x = 1;");
        assert_eq!(complexity_score(&tokens), dec!(6.0));
        assert_eq!(complexity_score(&[]), dec!(0));
        let unknown = Tokenizer::new().tokenize("@@");
        assert_eq!(complexity_score(&unknown), dec!(6));
    }
}
