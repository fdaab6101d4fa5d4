// ABOUTME: ActionRequest construction from the host's argv + stdin payload.
// ABOUTME: Structured parse with opaque-text fallback, command extraction, VCS root resolution.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::gate::types::{HookKind, Mode, SHELL_TOOL};

/// Everything known about one proposed tool action. Immutable per invocation
/// once the project root has been resolved.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Free tokens from the hook command line.
    pub argv: Vec<String>,
    /// The full stdin payload, verbatim.
    pub raw_stdin: String,
    /// Working directory, replaced by the VCS root when one is found.
    pub cwd: PathBuf,
    pub hook_kind: HookKind,
    pub tool_name: String,
    pub mode: Mode,
    /// Shell command text pulled from the raw payload by a narrow pattern,
    /// present whenever the pattern matched (tolerates malformed payloads).
    pub command: Option<String>,
}

/// Recognized fields of the structured stdin payload.
#[derive(Debug, Default, Deserialize)]
struct HookPayload {
    #[serde(default)]
    hook_event_name: String,
    #[serde(default)]
    permission_mode: String,
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    cwd: String,
}

impl ActionRequest {
    /// Build a request from the invocation's argv and stdin.
    ///
    /// The payload is first attempted as one structured JSON object; parse
    /// failure falls back to treating it as opaque text with default field
    /// values (`PreToolUse`, `default` mode, empty tool name, `fallback_cwd`).
    pub fn from_invocation(argv: Vec<String>, raw_stdin: String, fallback_cwd: PathBuf) -> Self {
        let payload: HookPayload = serde_json::from_str(&raw_stdin).unwrap_or_default();

        let cwd = if payload.cwd.is_empty() {
            fallback_cwd
        } else {
            PathBuf::from(&payload.cwd)
        };

        let command = extract_command(&raw_stdin);

        Self {
            argv,
            hook_kind: HookKind::parse(&payload.hook_event_name),
            mode: Mode::parse(&payload.permission_mode),
            tool_name: payload.tool_name,
            cwd,
            raw_stdin,
            command,
        }
    }

    /// Whether this request targets the shell-command tool.
    pub fn is_shell(&self) -> bool {
        self.tool_name == SHELL_TOOL
    }

    /// Concatenated argv + stdin: the text the triage stage scans.
    pub fn combined_text(&self) -> String {
        format!("{}\n{}", self.argv.join(" "), self.raw_stdin)
    }

    /// Substitute the enclosing VCS root for `cwd` when one resolves.
    ///
    /// Called once at startup; downstream heuristics treat the result as the
    /// project boundary. Failure leaves `cwd` unchanged.
    pub fn resolve_project_root(&mut self) {
        if let Some(root) = vcs_root(&self.cwd) {
            self.cwd = root;
        }
    }
}

/// Pull the embedded shell command out of the raw payload text.
///
/// A narrow pattern rather than a structural parse, so a partially-malformed
/// payload still yields its command. JSON string escapes are decoded.
pub fn extract_command(raw: &str) -> Option<String> {
    static COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    let re = COMMAND_RE.get_or_init(|| {
        Regex::new(r#""command"\s*:\s*"((?:\\.|[^"\\])*)""#).expect("command pattern must compile")
    });
    let captured = re.captures(raw)?.get(1)?.as_str();
    serde_json::from_str::<String>(&format!("\"{captured}\"")).ok()
}

/// Ask git for the enclosing worktree root. None when git is absent, the
/// directory is not a repository, or the output is unusable.
pub fn vcs_root(cwd: &Path) -> Option<PathBuf> {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(cwd)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let root = stdout.trim();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(stdin: &str) -> ActionRequest {
        ActionRequest::from_invocation(vec![], stdin.to_string(), PathBuf::from("/work"))
    }

    #[test]
    fn structured_payload_populates_fields() {
        let req = request(
            r#"{"hook_event_name":"PermissionRequest","permission_mode":"plan","tool_name":"Edit","cwd":"/repo"}"#,
        );
        assert_eq!(req.hook_kind, HookKind::PermissionRequest);
        assert_eq!(req.mode, Mode::Plan);
        assert_eq!(req.tool_name, "Edit");
        assert_eq!(req.cwd, PathBuf::from("/repo"));
    }

    #[test]
    fn malformed_payload_falls_back_to_defaults() {
        let req = request("this is not json at all");
        assert_eq!(req.hook_kind, HookKind::PreToolUse);
        assert_eq!(req.mode, Mode::Default);
        assert_eq!(req.tool_name, "");
        assert_eq!(req.cwd, PathBuf::from("/work"));
        assert_eq!(req.raw_stdin, "this is not json at all");
    }

    #[test]
    fn unknown_payload_fields_are_ignored() {
        let req = request(r#"{"tool_name":"Bash","tool_input":{"command":"ls"},"session_id":"abc"}"#);
        assert_eq!(req.tool_name, "Bash");
        assert_eq!(req.command.as_deref(), Some("ls"));
    }

    #[test]
    fn command_extracted_from_malformed_payload() {
        // Truncated JSON — the structured parse fails, the narrow pattern still hits.
        let req = request(r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf build"},"#);
        assert_eq!(req.tool_name, "");
        assert_eq!(req.command.as_deref(), Some("rm -rf build"));
    }

    #[test]
    fn command_escapes_are_decoded() {
        let req = request(r#"{"tool_input":{"command":"echo \"hi\" \\ there"}}"#);
        assert_eq!(req.command.as_deref(), Some(r#"echo "hi" \ there"#));
    }

    #[test]
    fn no_command_field_means_none() {
        assert!(extract_command(r#"{"tool_name":"Read","file_path":"a.txt"}"#).is_none());
    }

    #[test]
    fn combined_text_joins_argv_and_stdin() {
        let req = ActionRequest::from_invocation(
            vec!["--strict".to_string(), "extra".to_string()],
            "payload body".to_string(),
            PathBuf::from("/work"),
        );
        assert_eq!(req.combined_text(), "--strict extra\npayload body");
    }

    #[test]
    fn vcs_root_absent_for_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(vcs_root(dir.path()), None);
    }
}
