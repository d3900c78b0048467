//! Env file format used by the remote configuration object.
//!
//! One `NAME="VALUE"` assignment per line. Surrounding whitespace and blank lines are
//! ignored, anything else is rejected.

use std::sync::OnceLock;

use regex::Regex;

use super::environment::EnvironmentMap;
use super::error::EnvFileError;

const ASSIGNMENT_REGEX: &str = r#"^\s*([A-Za-z_][A-Za-z0-9_]*)="(.*)"\s*$"#;

fn assignment() -> &'static Regex {
    static ASSIGNMENT: OnceLock<Regex> = OnceLock::new();
    ASSIGNMENT.get_or_init(|| Regex::new(ASSIGNMENT_REGEX).expect("assignment regex is valid"))
}

/// Parses the raw content of an env file.
///
/// When a name is assigned more than once the last assignment wins.
pub fn parse(content: &[u8]) -> Result<EnvironmentMap, EnvFileError> {
    let content =
        std::str::from_utf8(content).map_err(|e| EnvFileError::NotUtf8(e.to_string()))?;

    let mut env = EnvironmentMap::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let captures = assignment()
            .captures(line)
            .ok_or_else(|| EnvFileError::InvalidLine {
                line: idx + 1,
                content: line.to_string(),
            })?;
        env.insert(&captures[1], &captures[2]);
    }
    Ok(env)
}

/// Renders variables back to the env file format, sorted by name.
pub fn render(env: &EnvironmentMap) -> String {
    env.iter()
        .map(|(name, value)| format!("{name}=\"{value}\"\n"))
        .collect()
}

/// Merges the remote variables under the ambient ones: a variable already present in the
/// ambient environment is never replaced by the remote configuration.
pub fn merge(ambient: EnvironmentMap, remote: EnvironmentMap) -> EnvironmentMap {
    ambient.overlay(remote)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    #[test]
    fn parse_assignments() {
        let content = b"NODE_EXPORTER_PATH_ROOTFS=\"/mnt/root\"\nNODE_EXPORTER_LOG_LEVEL=\"debug\"\n";

        let env = parse(content).unwrap();

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("NODE_EXPORTER_PATH_ROOTFS"), Some("/mnt/root"));
        assert_eq!(env.get("NODE_EXPORTER_LOG_LEVEL"), Some("debug"));
    }

    #[test]
    fn parse_ignores_surrounding_whitespace_and_blank_lines() {
        // Objects uploaded by the image tests indent every assignment by one space
        let content = b" NODE_EXPORTER_PATH_SYSFS=\"/mnt/sys\"\n\n   \n NODE_EXPORTER_PATH_PROCFS=\"/mnt/proc\"\r\n";

        let env = parse(content).unwrap();

        assert_eq!(env.get("NODE_EXPORTER_PATH_SYSFS"), Some("/mnt/sys"));
        assert_eq!(env.get("NODE_EXPORTER_PATH_PROCFS"), Some("/mnt/proc"));
    }

    #[test]
    fn parse_empty_content() {
        assert!(parse(b"").unwrap().is_empty());
        assert!(parse(b"\n\n").unwrap().is_empty());
    }

    #[test]
    fn parse_empty_and_quoted_values() {
        let env = parse(b"EMPTY=\"\"\nQUOTED=\"say \"hi\"\"\nPATTERN=\"^/(dev|proc)($|/)\"").unwrap();

        assert_eq!(env.get("EMPTY"), Some(""));
        assert_eq!(env.get("QUOTED"), Some("say \"hi\""));
        assert_eq!(env.get("PATTERN"), Some("^/(dev|proc)($|/)"));
    }

    #[test]
    fn parse_last_assignment_wins() {
        let env = parse(b"LEVEL=\"info\"\nLEVEL=\"debug\"").unwrap();

        assert_eq!(env.get("LEVEL"), Some("debug"));
    }

    #[rstest]
    #[case::unquoted("NAME=value")]
    #[case::missing_value("NAME")]
    #[case::single_quotes("NAME='value'")]
    #[case::unterminated("NAME=\"value")]
    #[case::starts_with_digit("9NAME=\"value\"")]
    #[case::contains_dash("NAME-X=\"value\"")]
    #[case::space_before_equals("NAME =\"value\"")]
    #[case::export_prefix("export NAME=\"value\"")]
    #[case::comment("# NAME=\"value\"")]
    #[case::trailing_garbage("NAME=\"value\" extra")]
    fn parse_rejects_invalid_lines(#[case] line: &str) {
        let content = format!("VALID=\"ok\"\n{line}\n");

        let err = parse(content.as_bytes()).unwrap_err();

        assert_matches!(err, EnvFileError::InvalidLine { line: 2, content } => {
            assert_eq!(content, line);
        });
    }

    #[test]
    fn parse_rejects_non_utf8() {
        assert_matches!(parse(b"NAME=\"\xff\""), Err(EnvFileError::NotUtf8(_)));
    }

    #[test]
    fn render_then_parse_preserves_variables() {
        let env: EnvironmentMap = [
            ("NODE_EXPORTER_LOG_FORMAT", "logfmt"),
            ("EMPTY", ""),
            ("WITH_SPACES", "  padded value "),
            ("PATTERN", "^/(dev|proc|run)($|/)"),
        ]
        .into_iter()
        .collect();

        let rendered = render(&env);

        assert_eq!(parse(rendered.as_bytes()).unwrap(), env);
    }

    #[test]
    fn render_is_sorted_by_name() {
        let env: EnvironmentMap = [("B", "2"), ("A", "1")].into_iter().collect();

        assert_eq!(render(&env), "A=\"1\"\nB=\"2\"\n");
    }

    #[test]
    fn merge_prefers_ambient_values() {
        let ambient: EnvironmentMap = [("NODE_EXPORTER_LOG_LEVEL", "warn")].into_iter().collect();
        let remote = parse(b"NODE_EXPORTER_LOG_LEVEL=\"debug\"\nNODE_EXPORTER_LOG_FORMAT=\"logfmt\"")
            .unwrap();

        let merged = merge(ambient, remote);

        assert_eq!(merged.get("NODE_EXPORTER_LOG_LEVEL"), Some("warn"));
        assert_eq!(merged.get("NODE_EXPORTER_LOG_FORMAT"), Some("logfmt"));
    }
}
