//! Important-word extraction from secret messages.
//!
//! Reduces free text to the deduplicated, order-preserving set of tokens that
//! players can actually guess: articles, prepositions, pronouns and other
//! filler are dropped. Pure functions only, no side effects.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Closed stop-word list: articles, prepositions, conjunctions, pronouns,
/// auxiliary verbs and common adverbs that are never guessable answers.
static STOP_WORDS: &[&str] = &[
    // Articles
    "a", "an", "the",
    // Prepositions
    "at", "in", "on", "to", "for", "of", "with", "by", "from", "about", "into",
    "through", "during", "before", "after", "above", "below", "up", "down",
    "out", "off", "over", "under", "again", "further", "then", "once",
    // Conjunctions
    "and", "or", "but", "nor", "so", "yet", "if", "because", "since", "when",
    "where", "while", "although", "though", "unless", "until", "whereas",
    // Pronouns
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us",
    "them", "my", "your", "his", "its", "our", "their", "mine", "yours",
    "hers", "ours", "theirs", "this", "that", "these", "those", "who", "whom",
    "whose", "which", "what",
    // Auxiliary verbs
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "will", "would", "could",
    "should", "may", "might", "must", "can", "shall",
    // Other common words
    "very", "really", "quite", "rather", "too", "also", "just", "only",
    "even", "still", "already", "soon", "here", "there", "now", "how", "why",
    "yes", "no", "not", "dont", "doesn't", "didn't", "won't", "wouldn't",
    "can't", "couldn't", "shouldn't", "mustn't",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}

/// Extract the important words from `text`, lower-cased, first-seen order,
/// deduplicated. Total function: empty input yields an empty result.
pub fn extract_important_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    // Punctuation becomes whitespace; word characters are alphanumerics + '_'
    let cleaned: String = lowered
        .chars()
        .map(|c| if is_word_char(c) { c } else { ' ' })
        .collect();

    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() < 2 {
            continue;
        }
        if is_stop_word(word) {
            continue;
        }
        // Pure numbers are noise unless short enough to be a time/date
        if word.chars().all(|c| c.is_ascii_digit()) && word.len() > 4 {
            continue;
        }
        if seen.insert(word.to_string()) {
            words.push(word.to_string());
        }
    }
    words
}

/// Either-direction containment: equal, target contains guess, or guess
/// contains target. Deliberately permissive; reproduced exactly, including
/// that no minimum guess length is enforced here.
pub fn either_contains(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}

/// Find the first important word the normalized guess matches
pub fn find_match<'a>(important_words: &'a [String], guess: &str) -> Option<&'a String> {
    important_words.iter().find(|w| either_contains(w, guess))
}

/// Whether every important word is covered by the collected guesses
pub fn all_words_covered(important_words: &[String], guesses: &[String]) -> bool {
    important_words
        .iter()
        .all(|word| guesses.iter().any(|g| either_contains(g, word)))
}

/// Filter a generator-returned substitution mapping down to entries keyed by
/// an important word. A stop-word key gets remapped under the first important
/// word found inside it.
pub fn filter_important_mapping(mapping: &HashMap<String, String>) -> HashMap<String, String> {
    let mut filtered = HashMap::new();
    for (key, value) in mapping {
        let important = extract_important_words(key);
        if important.is_empty() {
            continue;
        }
        let key_to_use = if is_stop_word(&key.to_lowercase()) {
            important[0].clone()
        } else {
            key.clone()
        };
        filtered.insert(key_to_use, value.clone());
    }
    filtered
}

/// Progressively-revealed rendering of the secret: words of length <= 2 show
/// verbatim, guessed words show verbatim, everything else becomes underscores
/// of equal count with the stripped punctuation appended.
pub fn sentence_with_blanks(secret: &str, correct_guesses: &[String]) -> String {
    split_preserving_whitespace(secret)
        .into_iter()
        .map(|token| {
            if token.chars().all(char::is_whitespace) {
                return token.to_string();
            }
            let clean: String = token
                .to_lowercase()
                .chars()
                .filter(|c| is_word_char(*c))
                .collect();
            if clean.chars().count() <= 2 {
                return token.to_string();
            }
            let guessed = correct_guesses.iter().any(|g| either_contains(&clean, g));
            if guessed {
                token.to_string()
            } else {
                let punctuation: String =
                    token.chars().filter(|c| !is_word_char(*c)).collect();
                let blanks = "_".repeat(clean.chars().count());
                format!("{blanks}{punctuation}")
            }
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split into alternating word and whitespace-run tokens, losing nothing
fn split_preserving_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_whitespace = None;
    for (idx, c) in text.char_indices() {
        let ws = c.is_whitespace();
        match in_whitespace {
            None => in_whitespace = Some(ws),
            Some(current) if current != ws => {
                tokens.push(&text[start..idx]);
                start = idx;
                in_whitespace = Some(ws);
            }
            _ => {}
        }
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}
