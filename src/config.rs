use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Script Launcher";
pub const DEFAULT_THEME: &str = "nord";
pub const DEFAULT_TICK_RATE_MS: u64 = 200;

pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Unable to determine home directory")?;
        Self::in_dir(home.join(".local/script-launcher"))
    }

    pub fn in_dir(config_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating {}", config_dir.display()))?;
        Ok(Self {
            settings_file: config_dir.join("settings.json"),
            log_file: config_dir.join("launcher.log"),
            config_dir,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub theme: String,
    pub tick_rate_ms: u64,
    /// Wait for Enter after a script before redrawing the launcher.
    pub pause_after_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.into(),
            theme: DEFAULT_THEME.into(),
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            pause_after_run: false,
            root: None,
            log_level: None,
        }
    }
}

impl Settings {
    /// Reads `path`, writing the defaults there first if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let parsed: Settings = serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(parsed)
        } else {
            let default = Self::default();
            default.save(path)?;
            Ok(default)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn tick_rate(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_rate_ms.clamp(16, 2000))
    }
}

/// Install root: explicit override, else a `scripts/` folder next to or above the
/// working directory, else the directory holding the executable.
pub fn resolve_root(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    if cwd.join("..").join("scripts").is_dir() {
        if let Some(parent) = cwd.parent() {
            return Ok(parent.to_path_buf());
        }
    }
    if cwd.join("scripts").is_dir() {
        return Ok(cwd.to_path_buf());
    }
    let exe = env::current_exe().context("locating the launcher executable")?;
    let exe = fs::canonicalize(&exe).unwrap_or(exe);
    exe.parent()
        .map(Path::to_path_buf)
        .context("executable has no parent directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_are_written_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(dir.path().join("cfg")).unwrap();
        let settings = Settings::load(&paths.settings_file).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(paths.settings_file.exists());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "title": "Ops", "pause_after_run": true }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.title, "Ops");
        assert!(settings.pause_after_run);
        assert_eq!(settings.tick_rate_ms, DEFAULT_TICK_RATE_MS);
    }

    #[test]
    fn malformed_settings_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn root_prefers_sibling_scripts_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();

        assert_eq!(resolve_root(None, &bin).unwrap(), dir.path());
        assert_eq!(resolve_root(None, dir.path()).unwrap(), dir.path());
        assert_eq!(
            resolve_root(Some(Path::new("/opt/tools")), dir.path()).unwrap(),
            Path::new("/opt/tools")
        );
    }
}
