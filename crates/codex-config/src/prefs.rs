use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{ConfigError, config_dir};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

/// User preferences stored in `prefs.json`.
///
/// Each missing key falls back to its own default and unknown keys are
/// ignored, so files written by older or newer versions still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prefs {
    pub theme: Theme,
    pub code_style: String,
    pub accent_color: String,
    pub tab_size: usize,
    pub sidebar_width: u32,
    pub show_code_overlay: bool,
    pub code_word_wrap: bool,
    pub default_maximized: bool,
    pub first_use: bool,
    pub pdf_break_on_h1: bool,
    pub pdf_dark_mode: bool,
    #[serde(rename = "openPDFonExport")]
    pub open_pdf_on_export: bool,
    pub data_dir: Option<PathBuf>,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            code_style: "atom-one-dark".to_string(),
            accent_color: "#5c7cfa".to_string(),
            tab_size: 4,
            sidebar_width: 300,
            show_code_overlay: true,
            code_word_wrap: false,
            default_maximized: false,
            first_use: true,
            pdf_break_on_h1: false,
            pdf_dark_mode: false,
            open_pdf_on_export: true,
            data_dir: None,
        }
    }
}

impl Prefs {
    pub fn prefs_path() -> PathBuf {
        config_dir().join("prefs.json")
    }

    /// Load preferences, returning the defaults when the file is missing.
    pub fn load_from_path<P: AsRef<Path>>(prefs_path: P) -> Result<Self, ConfigError> {
        let prefs_path = prefs_path.as_ref();
        if !prefs_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(prefs_path).map_err(|source| ConfigError::ConfigReadError {
                config_path: prefs_path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::PrefsParseError {
            prefs_path: prefs_path.to_path_buf(),
            source,
        })
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Self::prefs_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, prefs_path: P) -> anyhow::Result<()> {
        let prefs_path = prefs_path.as_ref();
        if let Some(parent) = prefs_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(prefs_path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::prefs_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_keys_default_individually() {
        let prefs: Prefs = serde_json::from_str(r#"{"tabSize": 2, "theme": "dark"}"#).unwrap();
        assert_eq!(prefs.tab_size, 2);
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.code_style, Prefs::default().code_style);
        assert!(prefs.first_use);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let prefs: Prefs = serde_json::from_str(r#"{"somethingNew": [1, 2], "codeWordWrap": true}"#).unwrap();
        assert!(prefs.code_word_wrap);
    }

    #[test]
    fn test_json_key_names() {
        let json = serde_json::to_value(Prefs::default()).unwrap();
        for key in [
            "theme",
            "codeStyle",
            "accentColor",
            "tabSize",
            "sidebarWidth",
            "showCodeOverlay",
            "codeWordWrap",
            "defaultMaximized",
            "firstUse",
            "pdfBreakOnH1",
            "pdfDarkMode",
            "openPDFonExport",
            "dataDir",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = Prefs::load_from_path(temp_dir.path().join("prefs.json")).unwrap();
        assert_eq!(prefs, Prefs::default());
    }

    #[test]
    fn test_save_and_load_prefs() {
        let temp_dir = TempDir::new().unwrap();
        let prefs_file = temp_dir.path().join("prefs.json");
        let prefs = Prefs {
            tab_size: 8,
            data_dir: Some(PathBuf::from("/data")),
            ..Prefs::default()
        };
        prefs.save_to_path(&prefs_file).unwrap();
        assert_eq!(Prefs::load_from_path(&prefs_file).unwrap(), prefs);
    }

    #[test]
    fn test_malformed_prefs_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let prefs_file = temp_dir.path().join("prefs.json");
        std::fs::write(&prefs_file, "{tabSize").unwrap();
        assert!(matches!(
            Prefs::load_from_path(&prefs_file),
            Err(ConfigError::PrefsParseError { .. })
        ));
    }
}
