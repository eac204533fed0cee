use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory `check` walks when no files are given.
    pub sources_dir: PathBuf,
    /// Extension of source files inside `sources_dir`, without the dot.
    pub extension: String,
    pub format: OutputFormat,
    pub log_level: String,
    #[serde(skip)]
    pub env_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources_dir: PathBuf::from("./programs"),
            extension: String::from("blk"),
            format: OutputFormat::Text,
            log_level: String::from("warn"),
            env_name: env_name(),
        }
    }
}

fn env_name() -> String {
    env::var("BLOCKC_ENV").unwrap_or_else(|_| String::from("default"))
}

impl Config {
    /// Reads the config file for the current environment, falling back to the
    /// defaults when it does not exist, then applies `BLOCKC_*` overrides.
    pub fn load() -> Result<Self, CompilerError> {
        let mut config = Self::load_from(&Self::get_config_path())?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, CompilerError> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents).map_err(|source| CompilerError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.env_name = env_name();
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("BLOCKC_SOURCES_DIR") {
            self.sources_dir = PathBuf::from(dir);
        }
        if let Some(format) = lookup("BLOCKC_FORMAT") {
            match OutputFormat::from_str(&format, true) {
                Ok(format) => self.format = format,
                Err(_) => debug!("ignoring unknown BLOCKC_FORMAT {:?}", format),
            }
        }
        if let Some(level) = lookup("BLOCKC_LOG") {
            self.log_level = level;
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CompilerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        let home = if cfg!(windows) {
            env::var("USERPROFILE")
        } else {
            env::var("HOME")
        };
        PathBuf::from(home.unwrap_or_else(|_| String::from(".")))
            .join(".blockc")
            .join(env_name())
            .join("config.json")
    }

    /// The configured level, or `Warn` when it does not name one.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }

    /// Source files under `sources_dir` with the configured extension, sorted.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, CompilerError> {
        if !self.sources_dir.is_dir() {
            return Err(CompilerError::FileNotFound(self.sources_dir.clone()));
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(&self.sources_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(self.extension.as_str()) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.extension, "blk");
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            sources_dir: PathBuf::from("/tmp/programs"),
            format: OutputFormat::Json,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "extension": "alan" }"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.extension, "alan");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CompilerError::Config { .. })));
    }

    #[test]
    fn environment_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BLOCKC_SOURCES_DIR", "elsewhere"),
            ("BLOCKC_FORMAT", "JSON"),
            ("BLOCKC_LOG", "trace"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.sources_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn source_files_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.blk"), "{}$").unwrap();
        fs::write(dir.path().join("a.blk"), "{}$").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let config = Config {
            sources_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let names: Vec<String> = config
            .source_files()
            .unwrap()
            .iter()
            .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.blk", "b.blk"]);
    }
}
