//! Workspace manifests stay consistent: every member inherits the workspace
//! version and depends on its siblings through workspace entries.

use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .unwrap()
        .to_path_buf()
}

fn manifest(path: &Path) -> toml::Value {
    let text = std::fs::read_to_string(path.join("Cargo.toml")).unwrap();
    text.parse().unwrap()
}

fn members() -> Vec<String> {
    let root = manifest(&workspace_root());
    root["workspace"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn members_inherit_workspace_version() {
    for member in members() {
        let doc = manifest(&workspace_root().join(&member));
        let inherited = doc["package"]["version"]
            .get("workspace")
            .and_then(toml::Value::as_bool);
        assert_eq!(
            inherited,
            Some(true),
            "{member} should use version.workspace = true"
        );
    }
}

#[test]
fn internal_dependencies_use_workspace_entries() {
    for member in members() {
        let doc = manifest(&workspace_root().join(&member));
        let Some(deps) = doc.get("dependencies").and_then(toml::Value::as_table) else {
            continue;
        };
        for (name, entry) in deps.iter().filter(|(name, _)| name.starts_with("dbfixture-")) {
            assert_eq!(
                entry.get("workspace").and_then(toml::Value::as_bool),
                Some(true),
                "{member} should depend on {name} with workspace = true"
            );
        }
    }
}

#[test]
fn version_constant_matches_workspace() {
    let root = manifest(&workspace_root());
    let version = root["workspace"]["package"]["version"].as_str().unwrap();
    assert_eq!(dbfixture_core::VERSION, version);
}
