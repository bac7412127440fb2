//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code; timelines wait on their own deadlines
//! - No blocking I/O inside the async driver and host
//! - The core library stays renderer-agnostic
//!
//! The helpers below locate workspace sources and strip test modules and
//! comments so the checks only see production code.

use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace this crate lives in
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Production lines of a source file as `(line_number, code)`
///
/// Stops at the first `#[cfg(test)]` and drops `//` comments.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, String)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            (idx + 1, code.to_string())
        })
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// Scan production code under each of `dirs` for any of `patterns`
///
/// Returns one `path:line - code` entry per offending line.
#[must_use]
pub fn find_violations(dirs: &[&str], patterns: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();

    for dir in dirs {
        for path in rust_files(dir) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };

            for (line_number, code) in production_lines(&content) {
                if patterns.iter().any(|pattern| code.contains(pattern)) {
                    violations.push(format!(
                        "{}:{} - {}",
                        path.display(),
                        line_number,
                        code.trim()
                    ));
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_skip_tests_and_comments() {
        let source = "fn a() {}\n// sleep(1)\nlet x = 1; // trailing\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(source);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (1, "fn a() {}".to_string()));
        assert_eq!(lines[1].0, 3);
        assert!(!lines[1].1.contains("trailing"));
    }

    #[test]
    fn test_workspace_root_contains_core() {
        assert!(workspace_root().join("onboarding/core/Cargo.toml").exists());
        assert!(!rust_files("onboarding/core/src").is_empty());
    }
}
