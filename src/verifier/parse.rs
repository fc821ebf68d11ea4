use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Leading ordinal: `3.`, `3)`, `3:`, `[3]`, `#3`, `Candidate 3:`.
static ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:\[(\d+)\]|#(\d+)|(?:candidate|pair|item)\s*#?(\d+)\s*[:.)\-]?|(\d+)\s*[.):\-])\s*",
    )
    .expect("ordinal pattern is valid")
});

/// Verdict keyword anywhere in a numbered line.
static KEYWORD_ANY_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(yes|no|partial)\b").expect("keyword pattern is valid")
});

/// Verdict keyword in an unnumbered line: upper case only, so prose such as
/// "No problem, here are the verdicts" is not read as a verdict.
static KEYWORD_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(YES|NO|PARTIAL)\b").expect("keyword pattern is valid"));

/// The verifier's classification of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "UPPERCASE")]
pub enum Verdict {
    Yes,
    No,
    /// Partly absorbed; `scope` names what is still unique, when given.
    Partial { scope: Option<String> },
}

/// A verdict plus the response line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchVerdict {
    pub verdict: Verdict,
    /// The response line, kept verbatim for audit.
    pub reasoning: String,
}

/// Matches response lines to `expected` positions.
///
/// Lines with an ordinal go to that position; other verdict-bearing lines fill the next
/// open position. The first verdict for a position wins. Positions with no verdict are
/// `None`.
///
/// A single-candidate reply that has no upper-case verdict falls back to the earliest
/// keyword in any case, so "Yes, the baseline covers it." still counts.
pub fn parse_verdicts(response: &str, expected: usize) -> Vec<Option<BatchVerdict>> {
    let mut slots: Vec<Option<BatchVerdict>> = vec![None; expected];

    for (line, ordinal, body) in verdict_lines(response) {
        let keyword = if ordinal.is_some() {
            &KEYWORD_ANY_CASE
        } else {
            &KEYWORD_UPPER
        };
        let Some(verdict) = find_verdict(&body, keyword) else {
            continue;
        };

        let slot = match ordinal {
            Some(n) if (1..=expected).contains(&n) => n - 1,
            Some(_) => continue,
            None => match slots.iter().position(Option::is_none) {
                Some(open) => open,
                None => continue,
            },
        };

        if slots[slot].is_none() {
            slots[slot] = Some(BatchVerdict {
                verdict,
                reasoning: line,
            });
        }
    }

    if expected == 1 && slots[0].is_none() {
        slots[0] = verdict_lines(response)
            .filter(|(_, ordinal, _)| ordinal.is_none_or(|n| n == 1))
            .find_map(|(line, _, body)| {
                find_verdict(&body, &KEYWORD_ANY_CASE).map(|verdict| BatchVerdict {
                    verdict,
                    reasoning: line,
                })
            });
    }

    slots
}

/// Non-empty lines with emphasis markers removed, split into ordinal and body.
fn verdict_lines(response: &str) -> impl Iterator<Item = (String, Option<usize>, String)> + '_ {
    response.lines().filter_map(|raw| {
        let line = raw.replace('*', "").trim().to_string();
        if line.is_empty() {
            return None;
        }
        let (ordinal, body) = split_ordinal(&line);
        let body = body.to_string();
        Some((line, ordinal, body))
    })
}

fn split_ordinal(line: &str) -> (Option<usize>, &str) {
    let Some(caps) = ORDINAL.captures(line) else {
        return (None, line);
    };
    let number = (1..=4)
        .filter_map(|i| caps.get(i))
        .next()
        .and_then(|m| m.as_str().parse().ok());
    match (number, caps.get(0)) {
        (Some(n), Some(whole)) => (Some(n), &line[whole.end()..]),
        _ => (None, line),
    }
}

/// Earliest keyword wins; text after PARTIAL becomes the scope.
fn find_verdict(body: &str, keyword: &Regex) -> Option<Verdict> {
    let caps = keyword.captures(body)?;
    let m = caps.get(1)?;
    match m.as_str().to_ascii_uppercase().as_str() {
        "YES" => Some(Verdict::Yes),
        "NO" => Some(Verdict::No),
        "PARTIAL" => {
            let scope = body[m.end()..]
                .trim_start_matches(|c: char| c.is_whitespace() || ":-,.;()[]".contains(c))
                .trim_end_matches(|c: char| c.is_whitespace() || c == ')' || c == ']')
                .trim();
            Some(Verdict::Partial {
                scope: (!scope.is_empty()).then(|| scope.to_string()),
            })
        }
        _ => None,
    }
}
