//! Sample source snippets for the manual analysis action.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Built-in snippets, ordered roughly by size.
pub const SNIPPETS: &[&str] = &[
    "let x = 1;",
    "const greet = (name) => `Hello, ${name}!`;",
    "function add(a, b) {\n  return a + b;\n}",
    "for (let i = 0; i < 10; i++) {\n  total += i * 2;\n}",
    "if (user && user.isAdmin) {\n  grantAccess(user.id);\n} else {\n  deny();\n}",
    "class Stack {\n  constructor() { this.items = []; }\n  push(x) { this.items.push(x); }\n  pop() { return this.items.pop(); }\n}",
    "async function load(url) {\n  const res = await fetch(url);\n  return res.ok ? res.json() : null;\n}",
    "/* memoized fibonacci */\nconst fib = (n, memo = {}) => n < 2 ? n : memo[n] ?? (memo[n] = fib(n - 1, memo) + fib(n - 2, memo));",
    "const matrix = [[1, 2], [3, 4]].map(row => row.map(v => v ** 2));",
    "switch (op) {\n  case '+': return a + b;\n  case '-': return a - b;\n  default: throw new Error('bad op');\n}",
];

/// Reproducible sequence of snippets that never repeats the previous pick.
#[derive(Clone, Debug)]
pub struct SnippetDeck {
    rng: ChaCha8Rng,
    last: Option<usize>,
}

impl SnippetDeck {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            last: None,
        }
    }

    /// Next snippet.
    pub fn next_snippet(&mut self) -> &'static str {
        let n = SNIPPETS.len();
        let mut idx = self.rng.gen_range(0..n);
        if Some(idx) == self.last {
            idx = (idx + 1) % n;
        }
        self.last = Some(idx);
        SNIPPETS[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validate, Tokenizer};

    #[test]
    fn seeded_decks_agree() {
        let mut a = SnippetDeck::new(42);
        let mut b = SnippetDeck::new(42);
        for _ in 0..20 {
            assert_eq!(a.next_snippet(), b.next_snippet());
        }
    }

    #[test]
    fn never_repeats_back_to_back() {
        let mut deck = SnippetDeck::new(7);
        let mut prev = deck.next_snippet();
        for _ in 0..100 {
            let next = deck.next_snippet();
            assert_ne!(prev, next);
            prev = next;
        }
    }

    #[test]
    fn builtin_snippets_are_balanced() {
        let t = Tokenizer::new();
        for s in SNIPPETS {
            let report = validate(&t.tokenize(s));
            assert!(report.is_valid, "{s}: {:?}", report.errors);
            assert!(report.warnings.is_empty(), "{s}: {:?}", report.warnings);
        }
    }
}
