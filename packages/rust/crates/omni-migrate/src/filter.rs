//! Path filter: which files a migration may touch at all.
//!
//! Pure path inspection; nothing is read from disk.

use std::path::{Component, Path};

use thiserror::Error;

/// Why a path must not be rewritten.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Only `.py` sources are rewritten.
    #[error("Not a Python file")]
    NotPython,

    /// Build or packaging configuration.
    #[error("Configuration file: {0}")]
    ConfigurationFile(String),

    /// Test-runner configuration.
    #[error("Test configuration file")]
    TestConfiguration,

    /// Inside a virtualenv, cache, build or VCS directory.
    #[error("Forbidden directory: {0}")]
    ForbiddenDirectory(String),

    /// Vendored or generated code.
    #[error("Forbidden pattern: {0}")]
    ForbiddenPattern(String),

    /// Module whose name suggests runtime configuration.
    #[error("Possible configuration file")]
    PossibleConfiguration,
}

const CONFIGURATION_FILES: &[&str] = &["setup.py", "__manifest__.py", "noxfile.py", "fabfile.py"];

const FORBIDDEN_DIRECTORIES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".nox",
    ".venv",
    "venv",
    "env",
    "virtualenv",
    "node_modules",
    "build",
    "dist",
    ".idea",
    ".vscode",
];

const FORBIDDEN_PATTERNS: &[&str] = &[
    "site-packages/",
    "dist-packages/",
    "lib/python",
    "/migrations/",
    "/alembic/",
    "vendor/",
    "third_party/",
    "external/",
];

const FRAMEWORK_MARKERS: &[&str] = &["django", "flask"];

/// Check whether `path` may be rewritten.
///
/// # Errors
///
/// The first [`SkipReason`] that applies.
pub fn is_safe_to_modify(path: &Path) -> Result<(), SkipReason> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("py") {
        return Err(SkipReason::NotPython);
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if file_name == "conftest.py" {
        return Err(SkipReason::TestConfiguration);
    }
    if CONFIGURATION_FILES.contains(&file_name.as_str()) {
        return Err(SkipReason::ConfigurationFile(file_name));
    }

    for component in path.components() {
        if let Component::Normal(part) = component {
            let part = part.to_string_lossy();
            if FORBIDDEN_DIRECTORIES.contains(&part.as_ref()) || part.ends_with(".egg-info") {
                return Err(SkipReason::ForbiddenDirectory(part.into_owned()));
            }
        }
    }

    let normalized = path.to_string_lossy().replace('\\', "/");
    let lowered = normalized.to_lowercase();
    if let Some(pattern) = FORBIDDEN_PATTERNS.iter().find(|pattern| lowered.contains(*pattern)) {
        return Err(SkipReason::ForbiddenPattern((*pattern).to_string()));
    }

    let looks_like_config = ["config", "settings", "conf"]
        .iter()
        .any(|hint| file_name.contains(hint));
    if looks_like_config && !FRAMEWORK_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Err(SkipReason::PossibleConfiguration);
    }

    Ok(())
}
