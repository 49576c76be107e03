//! Hygiene: source-level rules for the library crate.
//!
//! The scene core sits under an interactive loop, so library code may not
//! abort the process, drop errors on the floor, or print. Each rule has a
//! budget of zero. Test files (`*_test.rs`, `tests/`) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

struct SourceFile {
    path: PathBuf,
    content: String,
}

struct Rule {
    pattern: &'static str,
    max: usize,
    why: &'static str,
}

/// Aborts the process.
const PANICS: &[Rule] = &[
    Rule { pattern: ".unwrap()", max: 0, why: "propagate with ? or fall back with unwrap_or" },
    Rule { pattern: ".expect(", max: 0, why: "propagate with ?" },
    Rule { pattern: "panic!(", max: 0, why: "return a SceneError" },
    Rule { pattern: "unreachable!(", max: 0, why: "make the match total" },
    Rule { pattern: "todo!(", max: 0, why: "finish the stub" },
    Rule { pattern: "unimplemented!(", max: 0, why: "finish the stub" },
];

/// Loses an error or a diagnostic.
const DISCARDS: &[Rule] = &[
    Rule { pattern: "let _ =", max: 0, why: "inspect the result" },
    Rule { pattern: ".ok()", max: 0, why: "inspect the error" },
    Rule { pattern: "println!(", max: 0, why: "log through tracing" },
    Rule { pattern: "eprintln!(", max: 0, why: "log through tracing" },
    Rule { pattern: "dbg!(", max: 0, why: "remove debugging output" },
];

const STRUCTURE: &[Rule] = &[Rule { pattern: "#[allow(dead_code)]", max: 0, why: "delete unused code" }];

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new(env!("CARGO_MANIFEST_DIR")).join("src").as_path(), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") && !path.to_string_lossy().ends_with("_test.rs") {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path, content });
            }
        }
    }
}

/// Offending lines per file for `pattern`.
fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .map(|f| (f.path.display().to_string(), f.content.lines().filter(|l| l.contains(pattern)).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

fn check(rules: &[Rule]) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found under src/");
    let mut failures = Vec::new();
    for rule in rules {
        let found = hits(&files, rule.pattern);
        let count: usize = found.iter().map(|(_, n)| n).sum();
        if count > rule.max {
            let detail: Vec<String> = found.iter().map(|(p, n)| format!("    {p}: {n}")).collect();
            failures.push(format!("`{}` found {count}, max {} ({})\n{}", rule.pattern, rule.max, rule.why, detail.join("\n")));
        }
    }
    assert!(failures.is_empty(), "hygiene budget exceeded:\n{}", failures.join("\n"));
}

#[test]
fn no_panicking_calls() {
    check(PANICS);
}

#[test]
fn no_discarded_results_or_prints() {
    check(DISCARDS);
}

#[test]
fn no_dead_code_allowances() {
    check(STRUCTURE);
}

/// Every module with a `#[path = "x_test.rs"]` attachment has that file.
#[test]
fn attached_test_files_exist() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    for file in source_files() {
        for line in file.content.lines() {
            let Some(rest) = line.trim().strip_prefix("#[path = \"") else {
                continue;
            };
            let name = rest.trim_end_matches("\")]");
            assert!(src.join(name).is_file(), "{} attaches missing test file {name}", file.path.display());
        }
    }
}
