use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::DEFAULT_COLOR_DISTANCE_THRESHOLD;
use crate::consensus::DEFAULT_MIN_PAGE_COUNT;
use crate::units::DEFAULT_BASE_FONT_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "token-consensus";
const APP_CONFIG_FILE: &str = "config.json";

/// Thresholds for one normalization run, read from `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizationOptions {
    /// Distinct pages a token needs before it counts as a standard.
    pub min_page_threshold: usize,
    pub base_font_size: f64,
    pub color_distance_threshold: f64,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        Self {
            min_page_threshold: DEFAULT_MIN_PAGE_COUNT,
            base_font_size: DEFAULT_BASE_FONT_SIZE,
            color_distance_threshold: DEFAULT_COLOR_DISTANCE_THRESHOLD,
        }
    }
}

impl NormalizationOptions {
    /// Replace values that cannot drive a run with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut options = self;
        if !options.base_font_size.is_finite() || options.base_font_size <= 0.0 {
            tracing::warn!(
                value = options.base_font_size,
                "invalid baseFontSize; using default"
            );
            options.base_font_size = defaults.base_font_size;
        }
        if !options.color_distance_threshold.is_finite() || options.color_distance_threshold < 0.0
        {
            tracing::warn!(
                value = options.color_distance_threshold,
                "invalid colorDistanceThreshold; using default"
            );
            options.color_distance_threshold = defaults.color_distance_threshold;
        }
        options
    }
}

pub fn load_options() -> NormalizationOptions {
    let (xdg_config_home, home) = config_env_dirs();
    load_options_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_options_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> NormalizationOptions {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return NormalizationOptions::default(),
    };
    if !path.exists() {
        return NormalizationOptions::default();
    }
    let options = match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            NormalizationOptions::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            NormalizationOptions::default()
        }
    };
    options.sanitized()
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("token-consensus-config-{pid}-{nanos}"));
        path
    }

    fn with_config_file<F: FnOnce(&Path)>(contents: &str, f: F) {
        let root = fixture_root();
        let path = app_config_path(APP_DIR, APP_CONFIG_FILE, Some(root.as_path()), None)
            .expect("path should resolve");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        f(&root);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            APP_DIR,
            APP_CONFIG_FILE,
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/config-root/token-consensus/config.json")
        );
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path(APP_DIR, APP_CONFIG_FILE, None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/home/.config/token-consensus/config.json")
        );
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path(APP_DIR, APP_CONFIG_FILE, None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let root = fixture_root();
        let options = load_options_with(Some(root.as_path()), None);
        assert_eq!(options, NormalizationOptions::default());
        assert_eq!(options.min_page_threshold, 3);
        assert_eq!(options.base_font_size, 16.0);
        assert_eq!(options.color_distance_threshold, 2.3);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        with_config_file(r#"{ "minPageThreshold": 5 }"#, |root| {
            let options = load_options_with(Some(root), None);
            assert_eq!(options.min_page_threshold, 5);
            assert_eq!(options.base_font_size, 16.0);
            assert_eq!(options.color_distance_threshold, 2.3);
        });
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        with_config_file("{ invalid ", |root| {
            let options = load_options_with(Some(root), None);
            assert_eq!(options, NormalizationOptions::default());
        });
    }

    #[test]
    fn invalid_values_are_sanitized() {
        with_config_file(
            r#"{ "baseFontSize": 0, "colorDistanceThreshold": -1.0, "minPageThreshold": 2 }"#,
            |root| {
                let options = load_options_with(Some(root), None);
                assert_eq!(options.base_font_size, 16.0);
                assert_eq!(options.color_distance_threshold, 2.3);
                assert_eq!(options.min_page_threshold, 2);
            },
        );
    }
}
