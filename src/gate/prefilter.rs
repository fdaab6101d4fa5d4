// ABOUTME: Deterministic pre-filter — shortcuts evaluated before any oracle call.
// ABOUTME: Passthrough tool globs plus hard shell rules that must never depend on model judgment.

use std::sync::OnceLock;

use glob::Pattern;
use regex::Regex;

use super::types::{Decision, Mode, Resolution};
use crate::request::ActionRequest;

/// Tools this gate never evaluates; the host handles them natively. Glob
/// patterns so whole MCP tool families can be covered.
pub const PASSTHROUGH_TOOLS: &[&str] = &["AskUserQuestion", "TodoWrite", "mcp__ide__*"];

/// What the pre-filter decided, when it decided anything.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefilterOutcome {
    /// Fixed empty-object response, unconditionally; the pipeline never runs.
    Passthrough,
    /// A hard rule produced a full decision without consulting the oracle.
    Decided(Resolution),
}

/// Whether a tool name is in the fixed passthrough set.
pub fn is_passthrough(tool_name: &str) -> bool {
    !tool_name.is_empty()
        && PASSTHROUGH_TOOLS.iter().any(|p| {
            Pattern::new(p)
                .map(|pat| pat.matches(tool_name))
                .unwrap_or(false)
        })
}

/// Evaluate the pre-filter. Returns None when the pipeline should proceed.
pub fn check(req: &ActionRequest) -> Option<PrefilterOutcome> {
    if is_passthrough(&req.tool_name) {
        return Some(PrefilterOutcome::Passthrough);
    }

    if req.is_shell() {
        if let Some(command) = req.command.as_deref() {
            if let Some(resolution) = shell_rules(command, req.mode) {
                return Some(PrefilterOutcome::Decided(resolution));
            }
        }
    }

    None
}

/// Hard rules for the shell tool, applied to the extracted command text.
fn shell_rules(command: &str, mode: Mode) -> Option<Resolution> {
    // Parallel dispatch fans one auto-accepted approval out into many
    // unreviewed actions; blocked while edits are auto-accepted.
    if mode == Mode::AcceptEdits && parallel_re().is_match(command) {
        return Some(hard(
            Decision::Deny,
            format!("parallel dispatch is blocked while edits are auto-accepted: {command}"),
        ));
    }

    // `gh api` without a state-mutating method marker is a read-only
    // remote-repository query.
    if gh_api_re().is_match(command) && !mutating_re().is_match(command) {
        return Some(hard(
            Decision::Allow,
            format!("read-only remote repository query: {command}"),
        ));
    }

    None
}

fn hard(decision: Decision, reason: String) -> Resolution {
    Resolution {
        decision,
        baseline: decision,
        reason,
    }
}

fn parallel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bparallel\b").expect("parallel pattern must compile"))
}

fn gh_api_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*gh\s+api(\s|$)").expect("gh api pattern must compile"))
}

/// Markers that turn a `gh api` call into a mutation: explicit non-GET
/// methods, or field flags that imply POST.
fn mutating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:-X|--method)[=\s]+(?:POST|PUT|PATCH|DELETE)|(?:^|\s)(?:-f|-F|--field|--raw-field)[\s=]")
            .expect("mutation pattern must compile")
    })
}
