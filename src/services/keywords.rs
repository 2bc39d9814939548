//! RAKE keyword extraction.
//!
//! Candidate phrases are the runs of words left after cutting the text at
//! stopwords and punctuation. Each word is scored by degree / frequency over
//! the phrase co-occurrence graph, and a phrase scores the sum of its words.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_KEYWORDS: usize = 10;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+|[^\w\s]+").expect("token pattern is valid")
});

/// NLTK English stopword list.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

fn is_delimiter(token: &str) -> bool {
    is_stopword(token) || !token.chars().any(char::is_alphanumeric)
}

/// Returns up to [`MAX_KEYWORDS`] phrases, highest score first.
pub fn extract_keywords(text: &str) -> Vec<String> {
    rank_phrases(text)
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(phrase, _)| phrase)
        .collect()
}

/// Every distinct candidate phrase with its RAKE score, highest first. Equal
/// scores keep the order in which phrases first appear.
pub fn rank_phrases(text: &str) -> Vec<(String, f64)> {
    let phrases = candidate_phrases(text);
    if phrases.is_empty() {
        return Vec::new();
    }

    let mut frequency: HashMap<&str, f64> = HashMap::new();
    let mut degree: HashMap<&str, f64> = HashMap::new();
    for phrase in &phrases {
        let len = phrase.len() as f64;
        for word in phrase {
            *frequency.entry(word.as_str()).or_default() += 1.0;
            *degree.entry(word.as_str()).or_default() += len;
        }
    }

    let word_score = |word: &str| degree[word] / frequency[word];

    let mut seen = HashSet::new();
    let mut ranked: Vec<(String, f64)> = Vec::new();
    for phrase in &phrases {
        let joined = phrase.join(" ");
        if !seen.insert(joined.clone()) {
            continue;
        }
        let score = phrase.iter().map(|w| word_score(w.as_str())).sum();
        ranked.push((joined, score));
    }

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

fn candidate_phrases(text: &str) -> Vec<Vec<String>> {
    let lowered = text.to_lowercase();
    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for token in TOKEN_PATTERN.find_iter(&lowered).map(|m| m.as_str()) {
        if is_delimiter(token) {
            if !current.is_empty() {
                phrases.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token.to_string());
        }
    }
    if !current.is_empty() {
        phrases.push(current);
    }

    phrases
}
