//! Environment-variable configuration.
//!
//! Three variables are consulted: a master toggle, a JSON theme override,
//! and the `NO_COLOR` convention. Boolean values accept a fixed word table;
//! anything outside the table falls back to the caller's default rather
//! than erroring.

use std::env;

use crate::theme::{Theme, ThemeOverrides};

/// Master toggle for installing the hook from the environment.
pub const TOGGLE_VAR: &str = "PRETTY_TRACEBACK";

/// JSON theme overrides, merged over the default theme.
pub const THEME_VAR: &str = "PRETTY_TRACEBACK_THEME";

/// Any non-empty value disables styling (https://no-color.org convention).
pub const NO_COLOR_VAR: &str = "NO_COLOR";

const FALSE_WORDS: &[&str] = &["0", "false", "off", "disable", "no", "n"];
const TRUE_WORDS: &[&str] = &["1", "true", "on", "enable", "yes", "y"];

/// Interpret a boolean word. Unrecognized words resolve to `default`.
pub fn parse_bool(word: &str, default: bool) -> bool {
    let word = word.trim().to_ascii_lowercase();
    if FALSE_WORDS.contains(&word.as_str()) {
        false
    } else if TRUE_WORDS.contains(&word.as_str()) {
        true
    } else {
        default
    }
}

/// Read a boolean variable, falling back to `default` when unset or
/// unrecognized.
pub fn env_bool(var: &str, default: bool) -> bool {
    match env::var(var) {
        Ok(value) => parse_bool(&value, default),
        Err(_) => default,
    }
}

/// Whether styling is permitted at all for this process.
pub fn color_allowed() -> bool {
    !env::var(NO_COLOR_VAR).is_ok_and(|v| !v.is_empty())
}

/// The default theme with any environment overrides merged in. Malformed
/// JSON keeps the default and logs a warning.
pub fn theme_from_env() -> Theme {
    let mut theme = Theme::default();
    if let Ok(json) = env::var(THEME_VAR) {
        match serde_json::from_str::<ThemeOverrides>(&json) {
            Ok(overrides) => theme.merge(&overrides),
            Err(err) => log::warn!("ignoring malformed {THEME_VAR}: {err}"),
        }
    }
    theme
}
