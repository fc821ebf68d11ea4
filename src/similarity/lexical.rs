use std::collections::HashMap;

use crate::cache::VectorPayload;
use crate::constants::LEXICAL_BUCKETS;
use crate::hashing::feature_bucket;

/// English function words dropped before counting. Sorted for binary search.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
    "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "may",
    "more", "most", "no", "not", "of", "on", "or", "our", "she", "should", "so", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "to", "too", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "will", "with", "would", "you", "your",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Splits normalized text into lexical tokens: runs of alphanumerics or `_`, stop-words
/// and single characters removed.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() > 1 && !is_stopword(t))
        .collect()
}

/// Sparse term-frequency vectorizer over unigrams and bigrams.
///
/// Terms are feature-hashed into a fixed number of buckets, weighted `1 + ln(tf)` and
/// L2-normalised.
#[derive(Debug, Clone, Copy)]
pub struct LexicalVectorizer {
    buckets: u32,
}

impl Default for LexicalVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalVectorizer {
    pub fn new() -> Self {
        Self {
            buckets: LEXICAL_BUCKETS,
        }
    }

    pub fn vectorize(&self, text: &str) -> VectorPayload {
        let tokens = tokenize(text);

        let mut counts: HashMap<u32, u32> = HashMap::new();
        for token in &tokens {
            *counts.entry(feature_bucket(token, self.buckets)).or_default() += 1;
        }
        let mut bigram = String::new();
        for pair in tokens.windows(2) {
            bigram.clear();
            bigram.push_str(pair[0]);
            bigram.push(' ');
            bigram.push_str(pair[1]);
            *counts.entry(feature_bucket(&bigram, self.buckets)).or_default() += 1;
        }

        let mut weighted: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(bucket, tf)| (bucket, 1.0 + (tf as f32).ln()))
            .collect();
        weighted.sort_unstable_by_key(|(bucket, _)| *bucket);

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        let (indices, values) = weighted
            .into_iter()
            .map(|(bucket, w)| (bucket, if norm > 0.0 { w / norm } else { w }))
            .unzip();

        VectorPayload::Sparse { indices, values }
    }
}

#[cfg(test)]
pub(super) fn stopwords_sorted() -> bool {
    STOPWORDS.windows(2).all(|w| w[0] < w[1])
}
