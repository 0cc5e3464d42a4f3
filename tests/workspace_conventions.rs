//! ---
//! claw_section: "15-testing-qa-runbook"
//! claw_subsection: "integration-tests"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Integration and validation tests for the Claw control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..")
}

fn files_under(dir: &Path, min_depth: usize, max_depth: usize) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(min_depth)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

#[test]
fn sources_carry_frontmatter_header() {
    let root = workspace_root();
    let sources: Vec<PathBuf> = ["crates", "bin", "tests"]
        .iter()
        .flat_map(|dir| files_under(&root.join(dir), 1, usize::MAX))
        .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    assert!(!sources.is_empty());
    for source in sources {
        let content = fs::read_to_string(&source).unwrap();
        assert!(
            content.starts_with("//! ---\n//! claw_section:"),
            "{} must include frontmatter header",
            source.display()
        );
    }
}

#[test]
fn manifests_carry_frontmatter_header() {
    let root = workspace_root();
    let mut manifests = vec![root.join("Cargo.toml"), root.join("tests/Cargo.toml")];
    for dir in ["crates", "bin"] {
        manifests.extend(
            files_under(&root.join(dir), 2, 2)
                .into_iter()
                .filter(|path| path.file_name().is_some_and(|name| name == "Cargo.toml")),
        );
    }
    assert!(manifests.len() > 2);
    for manifest in manifests {
        let content = fs::read_to_string(&manifest).unwrap();
        assert!(
            content.starts_with("# ---"),
            "{} must include frontmatter header",
            manifest.display()
        );
    }
}
