//! LexRank extractive summarization.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::sentences::{sentence_words, split_sentences};

pub const SUMMARY_SENTENCES: usize = 3;

const SIMILARITY_THRESHOLD: f64 = 0.1;
const CONVERGENCE_EPSILON: f64 = 0.1;
const MAX_ITERATIONS: usize = 1000;

/// The [`SUMMARY_SENTENCES`] most central sentences, in document order,
/// joined by single spaces.
pub fn extract_summary(text: &str) -> String {
    summarize(text, SUMMARY_SENTENCES).join(" ")
}

/// Up to `count` sentences chosen by LexRank centrality, returned in the order
/// they appear in `text`.
pub fn summarize(text: &str, count: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.len() <= count {
        return sentences;
    }

    let words: Vec<Vec<String>> = sentences.iter().map(|s| sentence_words(s)).collect();
    let scores = lexrank_scores(&words);
    debug!(sentences = sentences.len(), "LexRank scores computed");

    let mut ranked: Vec<usize> = (0..sentences.len()).collect();
    // stable sort: equal scores keep document order
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ranked.truncate(count);
    ranked.sort_unstable();

    ranked.into_iter().map(|i| sentences[i].clone()).collect()
}

/// Stationary centrality of each sentence over the thresholded similarity graph.
pub fn lexrank_scores(sentences: &[Vec<String>]) -> Vec<f64> {
    let n = sentences.len();
    if n == 0 {
        return Vec::new();
    }

    let tf = term_frequencies(sentences);
    let idf = inverse_document_frequencies(sentences);

    let mut matrix = vec![vec![0.0f64; n]; n];
    let mut degrees = vec![0.0f64; n];
    for row in 0..n {
        for col in 0..n {
            let similarity = idf_modified_cosine(&tf[row], &tf[col], &idf);
            if similarity > SIMILARITY_THRESHOLD {
                matrix[row][col] = 1.0;
                degrees[row] += 1.0;
            }
        }
    }
    for (row, degree) in matrix.iter_mut().zip(degrees.iter()) {
        let degree = if *degree == 0.0 { 1.0 } else { *degree };
        row.iter_mut().for_each(|cell| *cell /= degree);
    }

    power_method(&matrix)
}

fn term_frequencies(sentences: &[Vec<String>]) -> Vec<HashMap<&str, f64>> {
    sentences
        .iter()
        .map(|words| {
            let mut counts: HashMap<&str, f64> = HashMap::new();
            for word in words {
                *counts.entry(word.as_str()).or_default() += 1.0;
            }
            let max = counts.values().cloned().fold(0.0, f64::max).max(1.0);
            counts.values_mut().for_each(|c| *c /= max);
            counts
        })
        .collect()
}

fn inverse_document_frequencies(sentences: &[Vec<String>]) -> HashMap<&str, f64> {
    let total = sentences.len() as f64;
    let mut containing: HashMap<&str, f64> = HashMap::new();
    for words in sentences {
        let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
        for word in unique {
            *containing.entry(word).or_default() += 1.0;
        }
    }
    containing
        .into_iter()
        .map(|(word, n_j)| (word, (total / (1.0 + n_j)).ln()))
        .collect()
}

fn idf_modified_cosine(
    tf1: &HashMap<&str, f64>,
    tf2: &HashMap<&str, f64>,
    idf: &HashMap<&str, f64>,
) -> f64 {
    let idf_of = |word: &str| idf.get(word).copied().unwrap_or(0.0);

    let numerator: f64 = tf1
        .iter()
        .filter_map(|(word, a)| tf2.get(word).map(|b| a * b * idf_of(*word).powi(2)))
        .sum();
    let norm = |tf: &HashMap<&str, f64>| -> f64 {
        tf.iter().map(|(word, v)| (v * idf_of(*word)).powi(2)).sum::<f64>()
    };

    let (d1, d2) = (norm(tf1), norm(tf2));
    if d1 > 0.0 && d2 > 0.0 {
        numerator / (d1.sqrt() * d2.sqrt())
    } else {
        0.0
    }
}

fn power_method(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n = matrix.len();
    let mut p = vec![1.0 / n as f64; n];

    for _ in 0..MAX_ITERATIONS {
        // next = Mᵀ · p
        let next: Vec<f64> = (0..n)
            .map(|col| (0..n).map(|row| matrix[row][col] * p[row]).sum())
            .collect();
        let delta = next
            .iter()
            .zip(p.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        p = next;
        if delta <= CONVERGENCE_EPSILON {
            break;
        }
    }

    p
}
