//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_AUTHOR, DEFAULT_CHRONOMETRY_CHARACTERS, DEFAULT_CHRONOMETRY_SECONDS,
    DEFAULT_LINES_PER_PAGE, DEFAULT_UNDO_LIMIT, REDB_FILE_NAME,
};
use crate::text::normalize_optional_nonempty;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Characters-based duration estimate: `characters` of text last `seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Chronometry {
    pub characters: usize,
    pub seconds: f64,
}

impl Default for Chronometry {
    fn default() -> Self {
        Self {
            characters: DEFAULT_CHRONOMETRY_CHARACTERS,
            seconds: DEFAULT_CHRONOMETRY_SECONDS,
        }
    }
}

impl Chronometry {
    /// Estimated screen time, in seconds, for `char_count` characters.
    pub fn duration_for(&self, char_count: usize) -> f64 {
        if self.characters == 0 {
            return 0.0;
        }
        char_count as f64 * self.seconds / self.characters as f64
    }
}

/// Runtime configuration for scriptsync.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub author: String,
    pub undo_limit: usize,
    pub correct_character_names: bool,
    pub correct_page_breaks: bool,
    pub lines_per_page: usize,
    pub chronometry: Chronometry,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

/// Resolve the author name stamped on history records.
///
/// Prefers `SCRIPTSYNC_AUTHOR`, then the login name (`USER`/`USERNAME`).
pub fn resolve_author() -> String {
    ["SCRIPTSYNC_AUTHOR", "USER", "USERNAME"]
        .iter()
        .find_map(|name| normalize_optional_nonempty(env::var(name).ok()))
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        let defaults = Chronometry::default();
        Self {
            db_path: env::var("SCRIPTSYNC_DB_PATH")
                .map(expand_tilde)
                .unwrap_or_else(|_| {
                    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
                    let cache_dir = home.join(".cache").join("scriptsync");
                    cache_dir.join(REDB_FILE_NAME).to_string_lossy().to_string()
                }),
            author: resolve_author(),
            undo_limit: env_parsed("SCRIPTSYNC_UNDO_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_UNDO_LIMIT),
            correct_character_names: env_flag_enabled("SCRIPTSYNC_CORRECT_CHARACTER_NAMES"),
            correct_page_breaks: env_flag_enabled("SCRIPTSYNC_CORRECT_PAGE_BREAKS"),
            lines_per_page: env_parsed("SCRIPTSYNC_LINES_PER_PAGE")
                .filter(|lines| *lines >= 2)
                .unwrap_or(DEFAULT_LINES_PER_PAGE),
            chronometry: Chronometry {
                characters: env_parsed("SCRIPTSYNC_CHRONOMETRY_CHARACTERS")
                    .filter(|chars| *chars > 0)
                    .unwrap_or(defaults.characters),
                seconds: env_parsed("SCRIPTSYNC_CHRONOMETRY_SECONDS")
                    .unwrap_or(defaults.seconds),
            },
        }
    }
}
