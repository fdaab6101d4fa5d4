// ABOUTME: The mode-aware decision resolver — a pure, total function over small enums.
// ABOUTME: Baseline mapping, per-mode adjustment rules, and reason composition.

use super::types::{Decision, Mode, Resolution, ToolCategory, Verdict};

/// Everything the resolver looks at. Borrowed views; the resolver owns nothing
/// and touches nothing else.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    pub verdict: Verdict,
    pub mode: Mode,
    pub category: ToolCategory,
    pub summary: &'a str,
    pub affected_paths: &'a [String],
    pub violated_rules: &'a [String],
    pub matched_allowed: &'a [String],
    pub review_reasons: &'a [String],
}

/// Markers that make a violated rule dangerous enough to deny even while
/// edits are auto-accepted.
const DANGEROUS_RULE_MARKERS: &[&str] = &["system", "sudo", "credential", "ssh key", "/etc", "/usr"];

/// Markers that keep a review reason worth asking about in acceptEdits mode.
const DANGEROUS_REVIEW_MARKERS: &[&str] = &["system", "sudo", "credential", "delete", "destructive"];

/// Resolve the final decision for a request that ran the full pipeline.
///
/// Pure and total: every input combination yields exactly one decision.
pub fn resolve(input: &ResolverInput) -> Resolution {
    let baseline = input.verdict.baseline();
    let decision = adjust(input, baseline);
    let reason = compose_reason(input, baseline, decision);
    Resolution {
        decision,
        baseline,
        reason,
    }
}

/// Apply the mode-adjustment rules on top of the baseline mapping.
fn adjust(input: &ResolverInput, baseline: Decision) -> Decision {
    match input.mode {
        Mode::Plan => match input.category {
            // Leaving planning is always the host's call to confirm, never ours.
            ToolCategory::ExitPlan => Decision::Deny,
            // Reads cannot change anything; planning needs them freely.
            ToolCategory::ReadOnly => Decision::Allow,
            // Writes are only fine when they target planning documents.
            ToolCategory::Write => {
                if input.affected_paths.iter().any(|p| is_planning_path(p)) {
                    Decision::Allow
                } else {
                    Decision::Ask
                }
            }
            ToolCategory::Other => {
                if baseline == Decision::Allow {
                    Decision::Allow
                } else {
                    Decision::Ask
                }
            }
        },

        Mode::AcceptEdits => {
            if !input.violated_rules.is_empty() {
                // Non-dangerous policy violations are permitted in this mode.
                if contains_marker(input.violated_rules, DANGEROUS_RULE_MARKERS) {
                    Decision::Deny
                } else {
                    Decision::Allow
                }
            } else if baseline == Decision::Ask {
                if contains_marker(input.review_reasons, DANGEROUS_REVIEW_MARKERS) {
                    Decision::Ask
                } else {
                    Decision::Allow
                }
            } else {
                baseline
            }
        }

        Mode::Default => {
            let mut decision = baseline;
            // Edits always need confirmation in this mode.
            if baseline == Decision::Allow && input.category == ToolCategory::Write {
                decision = Decision::Ask;
            }
            if !input.review_reasons.is_empty() && decision != Decision::Deny {
                decision = Decision::Ask;
            }
            decision
        }
    }
}

/// Planning-document heuristic: the token "plan", a plan-file extension, or a
/// plans/planning path segment.
fn is_planning_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    let has_token = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|seg| seg == "plan");
    has_token
        || lower.ends_with(".plan")
        || lower.ends_with(".plan.md")
        || lower.contains("/plans/")
        || lower.contains("/planning/")
}

/// Case-insensitive substring scan of every text against every marker.
fn contains_marker(texts: &[String], markers: &[&str]) -> bool {
    texts.iter().any(|t| {
        let lower = t.to_lowercase();
        markers.iter().any(|m| lower.contains(m))
    })
}

/// Operator-facing reason: summary, the lists that drove the decision, and a
/// trailer naming the baseline and the mode-adjusted final verdict.
fn compose_reason(input: &ResolverInput, baseline: Decision, decision: Decision) -> String {
    let mut parts = Vec::new();
    if !input.summary.is_empty() {
        parts.push(input.summary.to_string());
    }
    if !input.violated_rules.is_empty() {
        parts.push(format!("violated: {}", input.violated_rules.join("; ")));
    }
    if !input.review_reasons.is_empty() {
        parts.push(format!("review: {}", input.review_reasons.join("; ")));
    }
    if !input.matched_allowed.is_empty() {
        parts.push(format!("allowed: {}", input.matched_allowed.join("; ")));
    }
    parts.push(format!(
        "baseline {} -> {} in {} mode",
        baseline.as_str(),
        decision.as_str(),
        input.mode.as_str()
    ));
    parts.join(" | ")
}
