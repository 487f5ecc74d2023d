//! Per-user application settings and the workspace they point at.

use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "config.txt";
pub const COUNTER_FILE: &str = "invoice_number.txt";
pub const OUTPUT_DIR: &str = "invoices";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub data_root: String,
}

impl AppSettings {
    pub fn workspace(&self) -> Workspace {
        Workspace::new(expand_home_dir(&self.data_root))
    }
}

/// Location of `settings.toml` in the platform config directory.
pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "invoicegen", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

/// Reads settings from `path`. A missing file yields `None`.
pub fn load(path: &Path) -> Result<Option<AppSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

pub fn save(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let toml_str = toml::to_string_pretty(settings).map_err(|e| Error::Settings {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, toml_str).map_err(|e| Error::io(path, e))
}

pub fn expand_home_dir(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let rest = rest.trim_start_matches(['/', '\\']);
            return base_dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

/// Every file the tool reads or writes, derived from one data root.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub counter_file: PathBuf,
    pub output_dir: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_file: root.join(CONFIG_FILE),
            counter_file: root.join(COUNTER_FILE),
            output_dir: root.join(OUTPUT_DIR),
            root,
        }
    }
}
