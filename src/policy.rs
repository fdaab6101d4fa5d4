// ABOUTME: Policy document lookup — project-local, then user-global, then built-in default.
// ABOUTME: Content is opaque prose handed verbatim to the preference stage, never parsed here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Compiled-in permissive default: allow inside the project, review elsewhere.
pub const DEFAULT_POLICY: &str = include_str!("prompts/default_policy.md");

/// Relative location of a policy file under a project or home directory.
const POLICY_REL_PATH: &str = ".toolwarden/policy.md";

/// Where the active policy text came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PolicySource {
    Override(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    BuiltIn,
}

/// The policy text plus its provenance, for the audit record.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDocument {
    pub text: String,
    pub source: PolicySource,
}

/// Reads a file if it exists, returning None otherwise.
pub fn read_if_exists(path: &Path) -> Option<String> {
    if path.exists() {
        fs::read_to_string(path).ok()
    } else {
        None
    }
}

/// Resolve the policy document.
///
/// An explicit override path wins when readable; otherwise the chain is
/// project-local, then user-global, then the built-in default. Never fails —
/// an unreadable override just falls through to the chain.
pub fn load(
    override_path: Option<&Path>,
    project_root: &Path,
    home: Option<&Path>,
) -> PolicyDocument {
    if let Some(path) = override_path {
        if let Some(text) = read_if_exists(path) {
            return PolicyDocument {
                text,
                source: PolicySource::Override(path.to_path_buf()),
            };
        }
        tracing::warn!(path = %path.display(), "policy override unreadable, falling back");
    }

    let project = project_root.join(POLICY_REL_PATH);
    if let Some(text) = read_if_exists(&project) {
        return PolicyDocument {
            text,
            source: PolicySource::Project(project),
        };
    }

    if let Some(home) = home {
        let user = home.join(POLICY_REL_PATH);
        if let Some(text) = read_if_exists(&user) {
            return PolicyDocument {
                text,
                source: PolicySource::User(user),
            };
        }
    }

    PolicyDocument {
        text: DEFAULT_POLICY.to_string(),
        source: PolicySource::BuiltIn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_policy(base: &Path, content: &str) -> PathBuf {
        let dir = base.join(".toolwarden");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("policy.md");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn project_policy_wins_over_user() {
        let project = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        write_policy(project.path(), "project rules");
        write_policy(home.path(), "user rules");

        let doc = load(None, project.path(), Some(home.path()));
        assert_eq!(doc.text, "project rules");
        assert!(matches!(doc.source, PolicySource::Project(_)));
    }

    #[test]
    fn user_policy_when_project_missing() {
        let project = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        write_policy(home.path(), "user rules");

        let doc = load(None, project.path(), Some(home.path()));
        assert_eq!(doc.text, "user rules");
        assert!(matches!(doc.source, PolicySource::User(_)));
    }

    #[test]
    fn builtin_default_when_nothing_exists() {
        let project = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();

        let doc = load(None, project.path(), Some(home.path()));
        assert_eq!(doc.source, PolicySource::BuiltIn);
        assert!(doc.text.contains("inside the project directory"));
    }

    #[test]
    fn override_wins_when_readable() {
        let project = tempfile::tempdir().unwrap();
        write_policy(project.path(), "project rules");

        let override_file = project.path().join("custom.md");
        fs::write(&override_file, "override rules").unwrap();

        let doc = load(Some(&override_file), project.path(), None);
        assert_eq!(doc.text, "override rules");
        assert!(matches!(doc.source, PolicySource::Override(_)));
    }

    #[test]
    fn unreadable_override_falls_through() {
        let project = tempfile::tempdir().unwrap();
        write_policy(project.path(), "project rules");

        let missing = project.path().join("does-not-exist.md");
        let doc = load(Some(&missing), project.path(), None);
        assert_eq!(doc.text, "project rules");
    }
}
