//! Character-level L-System rewriting.
//!
//! The rewriter is deliberately minimal: one symbol maps to one replacement
//! string, and symbols without a rule are copied unchanged. Parametric
//! grammars are handled by [`symbios`] and consumed through
//! [`SkeletonInterpreter::interpret_state`](crate::SkeletonInterpreter::interpret_state).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Replacement strings keyed by the symbol they rewrite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewriteRules {
    rules: HashMap<char, String>,
}

impl RewriteRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the rule for `symbol` (builder pattern).
    pub fn with_rule(mut self, symbol: char, replacement: impl Into<String>) -> Self {
        self.insert(symbol, replacement);
        self
    }

    pub fn insert(&mut self, symbol: char, replacement: impl Into<String>) {
        self.rules.insert(symbol, replacement.into());
    }

    pub fn get(&self, symbol: char) -> Option<&str> {
        self.rules.get(&symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for RewriteRules {
    fn from_iter<I: IntoIterator<Item = (char, S)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|(c, s)| (c, s.into())).collect(),
        }
    }
}

/// Expands `axiom` by applying `rules` to every symbol, `iterations` times.
///
/// Output grows geometrically under expansive rules. The iteration count is
/// not bounded here; callers keep it small (three or so for a stalk).
pub fn generate(axiom: &str, rules: &RewriteRules, iterations: usize) -> String {
    let mut current = axiom.to_owned();
    for _ in 0..iterations {
        let mut next = String::with_capacity(current.len() * 2);
        for c in current.chars() {
            match rules.get(c) {
                Some(replacement) => next.push_str(replacement),
                None => next.push(c),
            }
        }
        current = next;
    }
    debug!(
        axiom,
        iterations,
        expanded_len = current.len(),
        "expanded l-system"
    );
    current
}

/// An axiom, its rules and how many times to apply them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LSystem {
    pub axiom: String,
    #[serde(default)]
    pub rules: RewriteRules,
    #[serde(default)]
    pub iterations: usize,
}

impl LSystem {
    pub fn new(axiom: impl Into<String>, rules: RewriteRules, iterations: usize) -> Self {
        Self {
            axiom: axiom.into(),
            rules,
            iterations,
        }
    }

    /// Runs the rewriter over this system.
    pub fn expand(&self) -> String {
        generate(&self.axiom, &self.rules, self.iterations)
    }
}
