// ABOUTME: Replay harness — re-runs the pure resolver over a recorded audit log.
// ABOUTME: Reports agreement between recorded decisions and today's rules, no oracle calls.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::audit::AuditRecord;
use crate::gate::resolver::{self, ResolverInput};
use crate::gate::types::{Decision, ToolCategory};

/// One record where today's resolver disagrees with what was recorded.
#[derive(Debug, Serialize)]
pub struct Disagreement {
    /// 1-based line number in the log file.
    pub line: usize,
    pub tool_name: String,
    pub recorded: Decision,
    pub replayed: Decision,
}

/// Outcome of replaying a whole log.
#[derive(Debug, Default, Serialize)]
pub struct ReplaySummary {
    /// Non-empty lines seen.
    pub total: usize,
    /// Records that carried enough stage output to re-resolve.
    pub replayed: usize,
    pub agreements: usize,
    /// Unparseable lines plus records with nothing to replay (passthroughs,
    /// hard-rule exits, triage short-circuits, stage failures).
    pub skipped: usize,
    pub disagreements: Vec<Disagreement>,
}

/// Replay a recorded audit log through the resolver.
///
/// Deterministic by construction: only the pure resolver runs, fed from the
/// recorded explanation and preference outputs.
pub fn replay_log(path: &Path) -> anyhow::Result<ReplaySummary> {
    let content = fs::read_to_string(path)?;
    let mut summary = ReplaySummary::default();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        summary.total += 1;

        let Ok(record) = serde_json::from_str::<AuditRecord>(line) else {
            summary.skipped += 1;
            continue;
        };
        let (Some(explanation), Some(preference), Some(resolution)) =
            (&record.explanation, &record.preference, &record.resolution)
        else {
            summary.skipped += 1;
            continue;
        };

        let replayed = resolver::resolve(&ResolverInput {
            verdict: preference.verdict,
            mode: record.mode,
            category: ToolCategory::of(&record.tool_name),
            summary: &explanation.summary,
            affected_paths: &explanation.affected_paths,
            violated_rules: &preference.violated_rules,
            matched_allowed: &preference.matched_allowed,
            review_reasons: &preference.review_reasons,
        });

        summary.replayed += 1;
        if replayed.decision == resolution.decision {
            summary.agreements += 1;
        } else {
            summary.disagreements.push(Disagreement {
                line: idx + 1,
                tool_name: record.tool_name.clone(),
                recorded: resolution.decision,
                replayed: replayed.decision,
            });
        }
    }

    Ok(summary)
}

/// Human-readable report for the replay subcommand.
pub fn render_summary(summary: &ReplaySummary) -> String {
    let mut out = format!(
        "replayed {}/{} records: {} agree, {} disagree, {} skipped",
        summary.replayed,
        summary.total,
        summary.agreements,
        summary.disagreements.len(),
        summary.skipped
    );
    for d in &summary.disagreements {
        out.push_str(&format!(
            "\n  line {}: {} recorded {} but resolves to {}",
            d.line,
            d.tool_name,
            d.recorded.as_str(),
            d.replayed.as_str()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::types::{
        Explanation, HookKind, Mode, PreferenceVerdict, Resolution, Verdict,
    };
    use chrono::Utc;
    use std::path::PathBuf;

    fn full_record(mode: Mode, tool: &str, verdict: Verdict, decision: Decision) -> AuditRecord {
        AuditRecord {
            timestamp: Utc::now(),
            argv: vec![],
            raw_stdin: String::new(),
            cwd: PathBuf::from("/repo"),
            hook_kind: HookKind::PreToolUse,
            tool_name: tool.to_string(),
            mode,
            triage: None,
            explanation: Some(Explanation {
                summary: "does a thing".to_string(),
                affected_paths: vec![],
                location_note: "inside".to_string(),
            }),
            preference: Some(PreferenceVerdict {
                violated_rules: vec![],
                matched_allowed: vec![],
                review_reasons: vec![],
                verdict,
                rationale: "r".to_string(),
            }),
            resolution: Some(Resolution {
                decision,
                baseline: decision,
                reason: "r".to_string(),
            }),
            response: serde_json::json!({}),
        }
    }

    fn write_log(records: &[AuditRecord]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let lines: Vec<String> = records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();
        (dir, path)
    }

    #[test]
    fn agreeing_records_are_counted() {
        // Read tool, allow verdict, default mode: resolver says allow.
        let records = vec![full_record(Mode::Default, "Read", Verdict::Allow, Decision::Allow)];
        let (_dir, path) = write_log(&records);

        let summary = replay_log(&path).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.replayed, 1);
        assert_eq!(summary.agreements, 1);
        assert!(summary.disagreements.is_empty());
    }

    #[test]
    fn disagreements_are_reported_with_line_numbers() {
        // Recorded allow for a Write tool in default mode; today's rules ask.
        let records = vec![full_record(Mode::Default, "Write", Verdict::Allow, Decision::Allow)];
        let (_dir, path) = write_log(&records);

        let summary = replay_log(&path).unwrap();
        assert_eq!(summary.agreements, 0);
        assert_eq!(summary.disagreements.len(), 1);
        let d = &summary.disagreements[0];
        assert_eq!(d.line, 1);
        assert_eq!(d.recorded, Decision::Allow);
        assert_eq!(d.replayed, Decision::Ask);
    }

    #[test]
    fn partial_records_and_garbage_are_skipped() {
        let mut partial = full_record(Mode::Default, "Read", Verdict::Allow, Decision::Allow);
        partial.preference = None;
        let (_dir, path) = write_log(&[partial]);

        // Append a garbage line.
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("\nnot json\n");
        std::fs::write(&path, content).unwrap();

        let summary = replay_log(&path).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.replayed, 0);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn render_mentions_disagreements() {
        let records = vec![full_record(Mode::Default, "Write", Verdict::Allow, Decision::Allow)];
        let (_dir, path) = write_log(&records);
        let summary = replay_log(&path).unwrap();
        let report = render_summary(&summary);
        assert!(report.contains("1 disagree"));
        assert!(report.contains("recorded allow but resolves to ask"));
    }

    #[test]
    fn missing_log_is_an_error() {
        assert!(replay_log(Path::new("/nope/missing.jsonl")).is_err());
    }
}
