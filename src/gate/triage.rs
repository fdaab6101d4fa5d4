// ABOUTME: Triage stage — structural injection markers plus the oracle's manipulation score.
// ABOUTME: Fixed regex catalog compiled once; reply parsing degrades to score 0, never fails.

use std::sync::OnceLock;

use regex::Regex;

use super::types::TriageResult;
use crate::oracle::Oracle;

const TRIAGE_PROMPT: &str = include_str!("../prompts/triage.md");

/// Substituted when the oracle reply carries no usable rationale.
pub const PLACEHOLDER_RATIONALE: &str = "no rationale provided";

/// Structural patterns that are near-never legitimate in code or commands.
/// Compiled once and cached; the shipped catalog always compiles.
fn structural_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Paired bracket-escape sequence: `]] [[`.
            ("bracket_escape", r"\]\]\s*\[\["),
            // Opening or closing role-delimiter tags.
            (
                "role_tag",
                r"(?i)</?\s*(?:system-prompt|system|assistant|human|user)\s*>",
            ),
            // Fake conversation delimiters: `--- END SYSTEM`, `--- BEGIN USER`, ...
            (
                "conversation_delimiter",
                r"(?i)---+\s*(?:END|BEGIN)\s+(?:SYSTEM|USER|ASSISTANT)",
            ),
        ]
        .into_iter()
        .map(|(name, pattern)| {
            let re = Regex::new(pattern).expect("triage pattern must compile");
            (name, re)
        })
        .collect()
    })
}

/// Scan raw action text for structural injection markers.
///
/// Matching is case-insensitive and independent across patterns; each match
/// contributes its flag once, in catalog order.
pub fn structural_flags(text: &str) -> Vec<String> {
    structural_patterns()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

/// Run the triage stage: pure structural scan plus one oracle consultation.
///
/// Content-level parse problems substitute defaults; only the oracle call
/// itself can fail, and that error propagates to the pipeline.
pub async fn assess(oracle: &dyn Oracle, raw_text: &str) -> anyhow::Result<TriageResult> {
    let flags = structural_flags(raw_text);
    let prompt = TRIAGE_PROMPT.replace("{input}", raw_text);
    let reply = oracle.complete(&prompt).await?;
    Ok(parse_reply(&reply, flags))
}

/// Extract score and rationale from the oracle reply.
fn parse_reply(reply: &str, flags: Vec<String>) -> TriageResult {
    let score = reply
        .lines()
        .find(|l| !l.trim().is_empty())
        .map(leading_score)
        .unwrap_or(0);

    let rationale = reply
        .lines()
        .find_map(|l| l.trim().strip_prefix("RATIONALE:"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| PLACEHOLDER_RATIONALE.to_string());

    TriageResult {
        score,
        flags,
        rationale,
    }
}

/// First integer token on the line, clamped to [0, 100]. Missing → 0.
fn leading_score(line: &str) -> u8 {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SCORE_RE.get_or_init(|| Regex::new(r"\d{1,3}").expect("score pattern must compile"));
    re.find(line)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| n.min(100) as u8)
        .unwrap_or(0)
}
