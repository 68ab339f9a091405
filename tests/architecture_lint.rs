//! Architecture enforcement tests.
//!
//! The library layers (`tracker`, `analysis`, `core`, `secrets`) return
//! typed errors and never touch the terminal; only `cli` and `ui` do. These
//! tests keep that layering from eroding.
//!
//! # Test Categories
//!
//! 1. **Terminal Output** - Library layers must not print
//! 2. **Layer Direction** - Library layers must not import `cli` or `ui`
//! 3. **Error Types** - Library layers must not use `anyhow`
//! 4. **HTTP Boundary** - Only the two service clients use `reqwest`
//! 5. **Credential Flow** - Commands must not read the environment directly

use std::fs;
use std::path::{Path, PathBuf};

/// Modules that form the library layer.
const LIBRARY_LAYERS: &[&str] = &["src/tracker", "src/analysis", "src/core", "src/secrets"];

/// The only files allowed to speak HTTP.
const HTTP_CLIENTS: &[&str] = &["src/tracker/jira.rs", "src/analysis/anthropic.rs"];

/// Collect every `.rs` file under `dir`, recursively.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).unwrap_or_else(|_| panic!("Failed to read {}", dir.display())) {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Source lines outside the test module, with comments dropped.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    content
        .lines()
        .take_while(|line| !line.contains("#[cfg(test)]"))
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

/// Report every production line in `files` containing any of `needles`.
fn find_violations(files: &[PathBuf], needles: &[&str], reason: &str) -> Vec<String> {
    let mut violations = Vec::new();
    for path in files {
        for (number, line) in production_lines(path) {
            if needles.iter().any(|needle| line.contains(needle)) {
                violations.push(format!(
                    "{}:{}: {} ({})",
                    path.display(),
                    number,
                    line.trim(),
                    reason
                ));
            }
        }
    }
    violations
}

fn library_files() -> Vec<PathBuf> {
    LIBRARY_LAYERS
        .iter()
        .flat_map(|dir| rust_files(Path::new(dir)))
        .collect()
}

fn assert_clean(violations: Vec<String>, what: &str) {
    assert!(
        violations.is_empty(),
        "{} violations found:\n  {}",
        what,
        violations.join("\n  ")
    );
}

#[test]
fn library_layers_do_not_print() {
    let violations = find_violations(
        &library_files(),
        &["println!", "eprintln!", "print!(", "eprint!(", "dbg!("],
        "terminal output belongs in ui::output",
    );
    assert_clean(violations, "Terminal output");
}

#[test]
fn library_layers_do_not_depend_on_cli_or_ui() {
    let violations = find_violations(
        &library_files(),
        &["crate::cli", "crate::ui"],
        "library layers must not depend on presentation",
    );
    assert_clean(violations, "Layer direction");
}

#[test]
fn library_layers_use_typed_errors() {
    let violations = find_violations(
        &library_files(),
        &["anyhow"],
        "return a thiserror enum instead",
    );
    assert_clean(violations, "Error type");
}

#[test]
fn only_service_clients_use_http() {
    let files: Vec<PathBuf> = rust_files(Path::new("src"))
        .into_iter()
        .filter(|path| !HTTP_CLIENTS.iter().any(|allowed| path == Path::new(allowed)))
        .collect();
    let violations = find_violations(
        &files,
        &["reqwest"],
        "HTTP belongs in the tracker or model client",
    );
    assert_clean(violations, "HTTP boundary");
}

#[test]
fn commands_resolve_credentials_through_resolver() {
    let violations = find_violations(
        &rust_files(Path::new("src/cli/commands")),
        &["env::var", "std::env"],
        "use CredentialResolver or Config",
    );
    assert_clean(violations, "Credential flow");
}

#[test]
fn all_expected_modules_exist() {
    for path in [
        "src/tracker/retrieval.rs",
        "src/tracker/mapper.rs",
        "src/analysis/prompt.rs",
        "src/analysis/normalize.rs",
        "src/core/report.rs",
        "src/core/credentials.rs",
        "src/ui/render.rs",
    ] {
        assert!(Path::new(path).exists(), "missing {}", path);
    }
    for path in HTTP_CLIENTS {
        assert!(Path::new(path).exists(), "missing {}", path);
    }
}
