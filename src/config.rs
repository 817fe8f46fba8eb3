use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::log::{Config, Error, Result, Value, log_config};

/// Section read by [`ConfigFile::log_config`] when none is given.
pub const DEFAULT_SECTION: &str = "Logging";

/// INI-style settings file: `[section]` headers, `key = value` lines, `#`/`;`
/// comments. Keys before the first header are globals.
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl ConfigFile {
    /// # Errors
    /// [`Error::ConfigRead`] when the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                current_section = Some(name.to_string());
                continue;
            }

            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        ConfigFile { globals, sections }
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    /// Builds a validated logger [`Config`] from `section`.
    ///
    /// Recognized keys: `label`, `level`, `save_path` (`~` expands to the home
    /// directory), `log_dir` (daily file in that directory, used when `save_path` is
    /// absent) and `lock_on_write`. Every other key is kept as a string extension
    /// value. A missing section yields the defaults.
    ///
    /// # Errors
    /// The first validation error, naming the offending key.
    pub fn log_config(&self, section: &str) -> Result<Config> {
        let mut cfg = match self.get_non_empty(section, "log_dir") {
            Some(dir) => Config::in_dir(expand_path(dir)),
            None => Config::default(),
        };

        let Some(entries) = self.sections.get(section) else {
            return Ok(cfg);
        };

        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        for key in keys {
            let raw = entries[key].as_str();
            match key.as_str() {
                "log_dir" => {}
                "save_path" => {
                    cfg.set_save_path(expand_path(raw))?;
                }
                log_config::KEY_LOCK_ON_WRITE => {
                    let lock = parse_bool(raw).ok_or_else(|| Error::InvalidLockOnWrite {
                        found: format!("{raw:?}"),
                    })?;
                    cfg.set_lock_on_write(lock);
                }
                other => {
                    cfg.set(other, Value::from(raw))?;
                }
            }
        }
        Ok(cfg)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expands tilde (`~`) in file paths to the user's home directory.
pub fn expand_path(path_str: &str) -> PathBuf {
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);

        if let Some(mut home_path) = home {
            if path_str == "~" {
                return home_path;
            }
            if path_str.starts_with("~/") || path_str.starts_with("~\\") {
                home_path.push(&path_str[2..]);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}
