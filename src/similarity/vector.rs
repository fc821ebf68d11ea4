use crate::cache::VectorPayload;

/// Cosine similarity of two payloads of the same kind.
///
/// Mismatched kinds, mismatched dense widths and zero vectors score `0.0`. The result is
/// not clamped; callers go through [`SimilarityScore::new`](super::SimilarityScore::new).
pub fn cosine(a: &VectorPayload, b: &VectorPayload) -> f32 {
    match (a, b) {
        (VectorPayload::Dense(a), VectorPayload::Dense(b)) => {
            if a.len() != b.len() {
                return 0.0;
            }
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            finish(dot, norm(a), norm(b))
        }
        (
            VectorPayload::Sparse {
                indices: ia,
                values: va,
            },
            VectorPayload::Sparse {
                indices: ib,
                values: vb,
            },
        ) => finish(sparse_dot(ia, va, ib, vb), norm(va), norm(vb)),
        _ => 0.0,
    }
}

fn norm(values: &[f32]) -> f32 {
    values.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn finish(dot: f32, na: f32, nb: f32) -> f32 {
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// Merge over two strictly increasing index lists.
fn sparse_dot(ia: &[u32], va: &[f32], ib: &[u32], vb: &[f32]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0f32;
    while i < ia.len() && j < ib.len() {
        match ia[i].cmp(&ib[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += va[i] * vb[j];
                i += 1;
                j += 1;
            }
        }
    }
    dot
}
