//! Best-effort evidence extraction from free-form task descriptions.
//!
//! These heuristics only guess at what a description refers to. They decide
//! what gets looked at, never what counts as proof.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::Task;

static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[./\w-]+\.[A-Za-z]\w*").expect("file path pattern is valid")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:class|function|method|component|module)\s+(\w+)")
        .expect("reference pattern is valid")
});

/// Word pairs that cannot both describe the same behavior.
const CONTRADICTIONS: &[(&str, &str, &str)] = &[
    (
        r"(?i)\basync(?:hronous)?\b",
        r"(?i)\bsynchronous\b",
        "Task claims both async and synchronous behavior",
    ),
    (
        r"(?i)\bstateless\b",
        r"(?i)\bstateful\b",
        "Task claims both stateless and stateful behavior",
    ),
    (
        r"(?i)\bmutable\b",
        r"(?i)\bimmutable\b",
        "Task claims both mutable and immutable data",
    ),
];

static CONTRADICTION_PATTERNS: LazyLock<Vec<(Regex, Regex, &'static str)>> = LazyLock::new(|| {
    CONTRADICTIONS
        .iter()
        .map(|(a, b, description)| {
            (
                Regex::new(a).expect("contradiction pattern is valid"),
                Regex::new(b).expect("contradiction pattern is valid"),
                *description,
            )
        })
        .collect()
});

/// Path-like tokens with an extension, in order of first appearance.
///
/// Dotfiles, protocol-relative fragments and abbreviations such as `e.g`
/// are skipped.
pub fn file_paths(description: &str) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    FILE_PATH
        .find_iter(description)
        .map(|m| m.as_str())
        .filter(|token| !token.starts_with('.') && !token.starts_with("//"))
        .filter(|token| {
            token.contains('/') || token.rsplit_once('.').is_some_and(|(stem, _)| stem.len() > 1)
        })
        .filter(|token| seen.insert(*token))
        .map(PathBuf::from)
        .collect()
}

/// Files mentioned in the description followed by the declared ones, without duplicates.
pub fn referenced_files(task: &Task) -> Vec<PathBuf> {
    let mut files = file_paths(&task.description);
    for declared in &task.files {
        if !files.contains(declared) {
            files.push(declared.clone());
        }
    }
    files
}

/// Names introduced by `class`, `function`, `method`, `component` or `module`.
pub fn references(description: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    REFERENCE
        .captures_iter(description)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Descriptions of contradictory claims found in the text.
pub fn contradictions(description: &str) -> Vec<String> {
    CONTRADICTION_PATTERNS
        .iter()
        .filter(|(a, b, _)| a.is_match(description) && b.is_match(description))
        .map(|(_, _, description)| (*description).to_string())
        .collect()
}

/// Whether a file name looks like a test file.
pub fn is_test_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();
    name.contains(".test.")
        || name.contains(".spec.")
        || name.starts_with("test_")
        || name
            .rsplit_once('.')
            .is_some_and(|(stem, _)| stem.ends_with("_test") || stem.ends_with("_spec"))
}

/// The file stem used to pair a source file with its tests (`src/foo.js` -> `foo`).
pub fn source_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}
