// src/common/search.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Como as palavras de um filtro de texto livre se combinam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordMatch {
    /// Todas as palavras precisam aparecer (AND).
    All,
    /// Basta uma das palavras (OR).
    Any,
}

impl FromStr for WordMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "and" => Ok(WordMatch::All),
            "any" | "or" => Ok(WordMatch::Any),
            other => Err(format!("unknown word match mode '{}'", other)),
        }
    }
}

pub fn split_words(term: &str) -> Vec<&str> {
    term.split_whitespace().collect()
}

/// Busca case-insensitive por substring, palavra a palavra.
pub fn matches_text(haystack: &str, term: &str, mode: WordMatch) -> bool {
    let words = split_words(term);
    if words.is_empty() {
        return true;
    }
    let haystack = haystack.to_lowercase();
    let mut hits = words.iter().map(|w| haystack.contains(&w.to_lowercase()));
    match mode {
        WordMatch::All => hits.all(|hit| hit),
        WordMatch::Any => hits.any(|hit| hit),
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_requires_every_word() {
        assert!(matches_text("Silla Plegable Azul", "silla azul", WordMatch::All));
        assert!(!matches_text("Silla Plegable Azul", "silla roja", WordMatch::All));
    }

    #[test]
    fn any_accepts_a_single_word() {
        assert!(matches_text("Silla Plegable Azul", "silla roja", WordMatch::Any));
        assert!(!matches_text("Mesa", "silla roja", WordMatch::Any));
    }

    #[test]
    fn blank_terms_match_everything() {
        assert!(matches_text("Mesa", "   ", WordMatch::All));
    }

    #[test]
    fn parses_modes() {
        assert_eq!("ALL".parse::<WordMatch>(), Ok(WordMatch::All));
        assert_eq!("or".parse::<WordMatch>(), Ok(WordMatch::Any));
        assert!("maybe".parse::<WordMatch>().is_err());
    }
}
