// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Theme preference persisted in a local key/value file.

use serde::{Deserialize, Serialize};

use crate::preferences::{PreferenceError, Preferences};

/// Key the theme mode is stored under.
pub const THEME_KEY: &str = "@mewscore_theme";

/// Colour scheme selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    /// Follow the operating system setting
    System,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            "system" => Some(ThemeMode::System),
            _ => None,
        }
    }

    pub fn is_dark(self, system_is_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system_is_dark,
        }
    }
}

/// Theme mode loaded once at startup and persisted on change.
#[derive(Debug)]
pub struct ThemeSettings {
    preferences: Preferences,
    mode: ThemeMode,
}

impl ThemeSettings {
    /// Load the stored mode. Missing, unreadable or unknown values give the
    /// default mode.
    pub async fn load(preferences: Preferences) -> Self {
        let mode = match preferences.get(THEME_KEY).await {
            Ok(Some(value)) => ThemeMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown stored theme mode");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load theme preference");
                ThemeMode::default()
            }
        };

        Self { preferences, mode }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn is_dark(&self, system_is_dark: bool) -> bool {
        self.mode.is_dark(system_is_dark)
    }

    /// Switch mode. The in-memory mode changes even if persisting fails.
    pub async fn set_mode(&mut self, mode: ThemeMode) -> Result<(), PreferenceError> {
        self.mode = mode;
        self.preferences.set(THEME_KEY, mode.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_dark_resolves_system() {
        assert!(!ThemeMode::Light.is_dark(true));
        assert!(ThemeMode::Dark.is_dark(false));
        assert!(ThemeMode::System.is_dark(true));
        assert!(!ThemeMode::System.is_dark(false));
    }

    #[test]
    fn test_parse_matches_as_str() {
        for mode in [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System] {
            assert_eq!(ThemeMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(ThemeMode::parse("sepia"), None);
    }
}
