use std::collections::HashMap;

use crate::constants::SEQUENCE_TOKEN_CAP;

/// `2 * LCS / (len_a + len_b)` over whitespace tokens, each side capped at
/// [`SEQUENCE_TOKEN_CAP`] tokens.
///
/// Symmetric by construction. Two empty inputs score `1.0`; one empty input scores `0.0`.
pub fn sequence_ratio(a: &str, b: &str) -> f32 {
    let mut interner: HashMap<&str, u32> = HashMap::new();
    let ta = intern(&mut interner, a);
    let tb = intern(&mut interner, b);

    let total = ta.len() + tb.len();
    if total == 0 {
        return 1.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    2.0 * lcs_len(&ta, &tb) as f32 / total as f32
}

/// Maps tokens to small integers so the LCS inner loop compares `u32`s.
fn intern<'a>(interner: &mut HashMap<&'a str, u32>, text: &'a str) -> Vec<u32> {
    text.split_whitespace()
        .take(SEQUENCE_TOKEN_CAP)
        .map(|token| {
            let next = interner.len() as u32;
            *interner.entry(token).or_insert(next)
        })
        .collect()
}

/// Longest common subsequence length with two rolling rows.
fn lcs_len(a: &[u32], b: &[u32]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for x in outer {
        for (j, y) in inner.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[inner.len()]
}
