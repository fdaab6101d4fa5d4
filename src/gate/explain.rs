// ABOUTME: Explanation stage — asks the oracle what the action does and where.
// ABOUTME: Parses SUMMARY/PATHS/LOCATION lines permissively; missing fields get defaults.

use super::types::Explanation;
use crate::oracle::Oracle;
use crate::request::ActionRequest;

const EXPLAIN_PROMPT: &str = include_str!("../prompts/explain.md");

/// Substituted when the oracle reply carries no usable summary.
pub const PLACEHOLDER_SUMMARY: &str = "the action could not be summarized";

/// Value of the first reply line starting with `prefix`, trimmed.
pub(crate) fn line_value<'a>(reply: &'a str, prefix: &str) -> Option<&'a str> {
    reply
        .lines()
        .find_map(|l| l.trim().strip_prefix(prefix))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Run the explanation stage for a request.
///
/// Paths are the oracle's free-text best effort; no canonicalization happens
/// here. Only the transport can fail.
pub async fn describe(oracle: &dyn Oracle, req: &ActionRequest) -> anyhow::Result<Explanation> {
    let prompt = EXPLAIN_PROMPT
        .replace("{cwd}", &req.cwd.display().to_string())
        .replace("{argv}", &req.argv.join(" "))
        .replace("{stdin}", &req.raw_stdin);
    let reply = oracle.complete(&prompt).await?;
    Ok(parse_reply(&reply))
}

fn parse_reply(reply: &str) -> Explanation {
    let summary = line_value(reply, "SUMMARY:")
        .map(str::to_string)
        .unwrap_or_else(|| PLACEHOLDER_SUMMARY.to_string());

    let affected_paths = line_value(reply, "PATHS:")
        .map(split_paths)
        .unwrap_or_default();

    let location_note = line_value(reply, "LOCATION:")
        .map(str::to_string)
        .unwrap_or_else(|| "location unknown".to_string());

    Explanation {
        summary,
        affected_paths,
        location_note,
    }
}

/// Comma-separated paths; entries equal to the literal token "none"
/// (case-insensitive) and empties are dropped.
fn split_paths(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("none"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_well_formed_reply() {
        let reply = "SUMMARY: Writes a new test file.\nPATHS: src/lib.rs, tests/new.rs\nLOCATION: inside the working directory";
        let exp = parse_reply(reply);
        assert_eq!(exp.summary, "Writes a new test file.");
        assert_eq!(exp.affected_paths, vec!["src/lib.rs", "tests/new.rs"]);
        assert_eq!(exp.location_note, "inside the working directory");
    }

    #[test]
    fn none_paths_are_dropped() {
        let exp = parse_reply("SUMMARY: Lists files.\nPATHS: none\nLOCATION: inside");
        assert!(exp.affected_paths.is_empty());

        let exp = parse_reply("SUMMARY: s\nPATHS: NONE, src/a.rs, None\nLOCATION: inside");
        assert_eq!(exp.affected_paths, vec!["src/a.rs"]);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let exp = parse_reply("something unstructured entirely");
        assert_eq!(exp.summary, PLACEHOLDER_SUMMARY);
        assert!(exp.affected_paths.is_empty());
        assert_eq!(exp.location_note, "location unknown");
    }

    #[test]
    fn prefix_matching_tolerates_indentation() {
        let exp = parse_reply("  SUMMARY: indented reply\n  PATHS: a.txt\n  LOCATION: parent directory");
        assert_eq!(exp.summary, "indented reply");
        assert_eq!(exp.affected_paths, vec!["a.txt"]);
    }

    #[test]
    fn paths_keep_oracle_order() {
        let exp = parse_reply("SUMMARY: s\nPATHS: z.rs, a.rs, m.rs\nLOCATION: inside");
        assert_eq!(exp.affected_paths, vec!["z.rs", "a.rs", "m.rs"]);
    }
}
