// ABOUTME: Preference stage — the oracle reads the verbatim policy text against the explanation.
// ABOUTME: An unparseable verdict token degrades to Review, never to silence or allow.

use super::explain::line_value;
use super::types::{Explanation, PreferenceVerdict, Verdict};
use crate::oracle::Oracle;

const PREFERENCE_PROMPT: &str = include_str!("../prompts/preference.md");

/// Substituted when the oracle reply carries no usable rationale.
pub const PLACEHOLDER_RATIONALE: &str = "no rationale provided";

/// Run the preference stage: hand the oracle the explanation plus the policy
/// document verbatim. The policy is never structurally parsed here — all rule
/// matching is the oracle's reasoning over that text.
pub async fn judge(
    oracle: &dyn Oracle,
    explanation: &Explanation,
    policy_text: &str,
) -> anyhow::Result<PreferenceVerdict> {
    let prompt = PREFERENCE_PROMPT
        .replace("{policy}", policy_text)
        .replace("{summary}", &explanation.summary)
        .replace("{paths}", &explanation.affected_paths.join(", "))
        .replace("{location}", &explanation.location_note);
    let reply = oracle.complete(&prompt).await?;
    Ok(parse_reply(&reply))
}

fn parse_reply(reply: &str) -> PreferenceVerdict {
    let verdict = match line_value(reply, "VERDICT:").map(str::to_ascii_lowercase) {
        Some(v) if v == "allow" => Verdict::Allow,
        Some(v) if v == "deny" => Verdict::Deny,
        // Includes "review", anything unrecognized, and a missing line:
        // fail toward caution.
        _ => Verdict::Review,
    };

    PreferenceVerdict {
        violated_rules: split_list(line_value(reply, "VIOLATED:")),
        matched_allowed: split_list(line_value(reply, "ALLOWED:")),
        review_reasons: split_list(line_value(reply, "REVIEW:")),
        verdict,
        rationale: line_value(reply, "RATIONALE:")
            .map(str::to_string)
            .unwrap_or_else(|| PLACEHOLDER_RATIONALE.to_string()),
    }
}

/// Semicolon-separated list entries; empties and the literal "none" are dropped.
fn split_list(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    value
        .split(';')
        .map(str::trim)
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("none"))
        .map(str::to_string)
        .collect()
}
