//! Settings infrastructure for as3lsp.
//!
//! Settings live in an `as3lsp.toml` file found near the workspace root. They
//! point the server at the project snapshot exported by the compiler and tune
//! how files and definitions are classified.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::AnalysisOptions;

pub const SETTINGS_FILE: &str = "as3lsp.toml";

/// Root settings structure loaded from `as3lsp.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub project: Option<ProjectSettings>,
    pub markup: Option<ExtensionSettings>,
    pub library: Option<ExtensionSettings>,
    pub rename: Option<RenameSettings>,
    pub log: Option<LogSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectSettings {
    /// Project snapshot (JSON) written by the compiler front end.
    /// Relative paths are resolved against the settings directory.
    pub snapshot: Option<PathBuf>,
}

/// A list of file extensions, without the leading dot.
#[derive(Debug, Default, Deserialize)]
pub struct ExtensionSettings {
    pub extensions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameSettings {
    /// Propose renaming the file when its main definition is renamed (default: true).
    pub file_rename: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSettings {
    /// A `tracing` filter directive, e.g. `info` or `as3lsp=debug`.
    pub level: Option<String>,
}

impl Settings {
    /// Options for the analysis core, falling back to defaults for unset keys.
    pub fn analysis_options(&self) -> AnalysisOptions {
        let mut options = AnalysisOptions::default();
        if let Some(markup) = &self.markup {
            options.markup_extensions = normalize_extensions(&markup.extensions);
        }
        if let Some(library) = &self.library {
            options.library_extensions = normalize_extensions(&library.extensions);
        }
        if let Some(file_rename) = self.rename.as_ref().and_then(|r| r.file_rename) {
            options.propose_file_rename = file_rename;
        }
        options
    }

    /// Absolute path of the configured project snapshot.
    pub fn snapshot_path(&self, settings_dir: &Path) -> Option<PathBuf> {
        let path = self.project.as_ref()?.snapshot.as_ref()?;
        if path.is_absolute() {
            Some(path.clone())
        } else {
            Some(settings_dir.join(path))
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log.as_ref()?.level.as_deref()
    }
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Load settings from a settings file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to parse settings: {}", e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover `as3lsp.toml` by searching up the directory tree, then direct children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found file (used for resolving relative paths).
/// If not found, returns `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join(SETTINGS_FILE);
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}
