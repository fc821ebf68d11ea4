use std::fmt::Write;

use crate::detector::Candidate;

/// One structured prompt listing every pair, numbered from 1, with a strict reply format.
pub fn build_prompt(candidates: &[&Candidate]) -> String {
    let mut prompt = String::from(
        "Each numbered pair below names a CANDIDATE document and the BASELINE document it \
         most resembles. Decide whether the baseline has superseded the candidate: its \
         content is fully absorbed (YES), not absorbed (NO), or only partly absorbed \
         (PARTIAL).\n\n",
    );

    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. candidate: {} | baseline: {} | similarity: {:.0}%",
            i + 1,
            candidate.path(),
            candidate.matched().unwrap_or("(none)"),
            candidate.confidence() * 100.0
        );
    }

    let _ = write!(
        prompt,
        "\nReply with exactly {} line(s), one per pair and in the same order, formatted as:\n\
         <number>. YES|NO|PARTIAL\n\
         After PARTIAL, name the sections of the candidate that are still unique. Do not \
         add any other text.",
        candidates.len()
    );
    prompt
}
