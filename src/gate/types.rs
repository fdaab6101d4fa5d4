// ABOUTME: Core types for the permission gate pipeline.
// ABOUTME: Decision, Verdict, Mode, HookKind, ToolCategory, and per-stage result structs.

use serde::{Deserialize, Serialize};

/// The final decision emitted to the host agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Proceed without prompting.
    Allow,
    /// Block the action.
    Deny,
    /// Surface the action to a human for review.
    Ask,
}

impl Decision {
    /// Lowercase string for the wire response ("allow", "deny", "ask").
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Ask => "ask",
        }
    }
}

/// The verdict token returned by the preference oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
    /// Needs human review — also the fallback for any unparseable reply.
    Review,
}

impl Verdict {
    /// Baseline mapping before mode adjustment: allow→allow, deny→deny, review→ask.
    pub fn baseline(self) -> Decision {
        match self {
            Verdict::Allow => Decision::Allow,
            Verdict::Deny => Decision::Deny,
            Verdict::Review => Decision::Ask,
        }
    }
}

/// The host agent's operating posture at the time of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "acceptEdits")]
    AcceptEdits,
    #[serde(rename = "default")]
    Default,
}

impl Mode {
    /// Forgiving parse: unknown or missing mode strings mean `Default`.
    pub fn parse(s: &str) -> Self {
        match s {
            "plan" => Mode::Plan,
            "acceptEdits" => Mode::AcceptEdits,
            _ => Mode::Default,
        }
    }

    /// The host's wire spelling of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Plan => "plan",
            Mode::AcceptEdits => "acceptEdits",
            Mode::Default => "default",
        }
    }
}

/// Which integration point the host invoked us from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    PreToolUse,
    PermissionRequest,
}

impl HookKind {
    /// Forgiving parse: anything unrecognized is treated as `PreToolUse`.
    pub fn parse(s: &str) -> Self {
        match s {
            "PermissionRequest" => HookKind::PermissionRequest,
            _ => HookKind::PreToolUse,
        }
    }
}

/// The name of the shell-command tool, which gets pre-filter treatment.
pub const SHELL_TOOL: &str = "Bash";

/// The dedicated tool that ends planning mode. Plan mode always denies it.
pub const EXIT_PLAN_TOOL: &str = "ExitPlanMode";

/// Tools that only observe state.
const READ_ONLY_TOOLS: &[&str] = &[
    "Read",
    "Glob",
    "Grep",
    "NotebookRead",
    "WebFetch",
    "WebSearch",
    "TodoRead",
];

/// Tools that mutate files.
const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Coarse tool classification used by the mode-adjustment rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolCategory {
    ReadOnly,
    Write,
    ExitPlan,
    Other,
}

impl ToolCategory {
    /// Classify a tool name by membership in the fixed sets.
    pub fn of(tool_name: &str) -> Self {
        if tool_name == EXIT_PLAN_TOOL {
            ToolCategory::ExitPlan
        } else if READ_ONLY_TOOLS.contains(&tool_name) {
            ToolCategory::ReadOnly
        } else if WRITE_TOOLS.contains(&tool_name) {
            ToolCategory::Write
        } else {
            ToolCategory::Other
        }
    }
}

/// Output of the triage stage: structural flags plus the oracle's injection score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    /// Injection likelihood in [0, 100]; 0 when the reply was unparseable.
    pub score: u8,
    /// Named structural pattern matches, deduplicated, in catalog order.
    pub flags: Vec<String>,
    /// The oracle's one-line rationale, or a placeholder.
    pub rationale: String,
}

impl TriageResult {
    /// Whether this result terminates the pipeline before explanation/preference.
    pub fn short_circuits(&self) -> bool {
        self.score > 70 || !self.flags.is_empty()
    }
}

/// Output of the explanation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// One/two-sentence plain-English description of the action.
    pub summary: String,
    /// Paths the action touches, in the oracle's order. Free text, not canonicalized.
    pub affected_paths: Vec<String>,
    /// Where the action sits relative to the project root (inside, parent, sibling, outside).
    pub location_note: String,
}

/// Output of the preference stage: the oracle's reading of the policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceVerdict {
    pub violated_rules: Vec<String>,
    pub matched_allowed: Vec<String>,
    pub review_reasons: Vec<String>,
    pub verdict: Verdict,
    pub rationale: String,
}

/// The resolver's output: final decision, the pre-adjustment baseline, and the
/// operator-facing reason string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub decision: Decision,
    pub baseline: Decision,
    pub reason: String,
}
