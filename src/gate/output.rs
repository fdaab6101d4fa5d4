// ABOUTME: Wire response formatting, keyed by hook kind rather than by mode.
// ABOUTME: PreToolUse always speaks; PermissionRequest stays silent on ask to defer to the host.

use serde_json::{Value, json};

use super::pipeline::GateOutcome;
use super::types::{Decision, HookKind};

/// Map the final outcome to the single-line wire response for the hook kind.
pub fn format_response(kind: HookKind, outcome: &GateOutcome) -> Value {
    let resolution = match outcome {
        GateOutcome::Passthrough => return json!({}),
        GateOutcome::Decided(r) => r,
    };

    match kind {
        HookKind::PreToolUse => json!({
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": resolution.decision.as_str(),
                "permissionDecisionReason": resolution.reason,
            }
        }),
        HookKind::PermissionRequest => match resolution.decision {
            // Empty response: defer to the host's native prompt.
            Decision::Ask => json!({}),
            decision => json!({
                "hookSpecificOutput": {
                    "hookEventName": "PermissionRequest",
                    "decision": {
                        "behavior": decision.as_str(),
                        "message": resolution.reason,
                    }
                }
            }),
        },
    }
}
