//! Works out which project a finished task belongs to.
//!
//! Sources are tried in order: `package.json` name, `Cargo.toml` package
//! name, the repository name of the `origin` git remote, and finally the
//! directory name.

use figment::{
    providers::{Format, Json, Toml},
    Figment,
};
use regex::Regex;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Used when no source yields a name.
pub const UNKNOWN_PROJECT: &str = "unknown project";

/// Detects the project name for `dir`.
pub async fn detect_project_name(dir: &Path) -> String {
    if let Some(name) = manifest_name(dir) {
        return name;
    }
    if let Some(name) = git_repository_name(dir).await {
        debug!(name = %name, "Project name from git remote");
        return name;
    }
    match dir.file_name().and_then(|name| name.to_str()) {
        Some(name) if !name.is_empty() => {
            debug!(name = %name, "Project name from directory");
            name.to_string()
        }
        _ => UNKNOWN_PROJECT.to_string(),
    }
}

/// Reads the project name from a `package.json` or `Cargo.toml` in `dir`.
pub fn manifest_name(dir: &Path) -> Option<String> {
    let package_json = dir.join("package.json");
    if package_json.is_file() {
        let name = Figment::from(Json::file(&package_json))
            .extract_inner::<String>("name")
            .ok()
            .and_then(non_empty);
        if let Some(name) = name {
            debug!(name = %name, "Project name from package.json");
            return Some(name);
        }
    }

    let cargo_toml = dir.join("Cargo.toml");
    if cargo_toml.is_file() {
        let name = Figment::from(Toml::file(&cargo_toml))
            .extract_inner::<String>("package.name")
            .ok()
            .and_then(non_empty);
        if let Some(name) = name {
            debug!(name = %name, "Project name from Cargo.toml");
            return Some(name);
        }
    }
    None
}

async fn git_repository_name(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .current_dir(dir)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    repository_name_from_remote(String::from_utf8_lossy(&output.stdout).trim())
}

/// Extracts `repo` from remotes such as `git@host:owner/repo.git` or
/// `https://host/owner/repo`.
pub fn repository_name_from_remote(remote: &str) -> Option<String> {
    let pattern = Regex::new(r"[/:]([^/:]+?)(?:\.git)?/?$").ok()?;
    pattern
        .captures(remote.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| non_empty(m.as_str().to_string()))
}

fn non_empty(name: String) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
