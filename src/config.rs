use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::log::{
    console_sink::DEFAULT_MAX_LEN,
    log_error::ConfigError,
    log_state::{DEFAULT_CHUNK_SIZE, DEFAULT_LINE_OFFSET, DEFAULT_TAG_WIDTH},
};

/// Section holding every logger key.
pub const LOGGING_SECTION: &str = "Logging";

/// Default capacity of the file sink queue.
pub const DEFAULT_FILE_QUEUE: usize = 1_024;

/// Minimal INI file: `[section]` headers, `key = value` pairs and `#`
/// comments. Pairs before the first header are globals.
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Parses INI text. Lines that are neither headers nor pairs are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

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
        Config { globals, sections }
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

    /// Parses a non-empty value of `section.key`, or returns `default` when
    /// the key is missing or empty.
    pub fn parse_or<T: FromStr>(
        &self,
        section: &str,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        match self.get_non_empty(section, key) {
            Some(raw) => raw.parse().map_err(|_| invalid(key, raw)),
            None => Ok(default),
        }
    }

    /// Like [`parse_or`](Self::parse_or) for booleans, also accepting
    /// `yes`/`no`, `on`/`off` and `1`/`0`.
    pub fn flag_or(&self, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get_non_empty(section, key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid(key, raw)),
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

/// Logger settings read from the `[Logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub enabled: bool,
    pub stamp: Option<String>,
    pub boxed: bool,
    pub chunk_size: usize,
    pub tag_width: usize,
    pub line_offset: usize,
    pub console: bool,
    pub console_max_len: usize,
    pub resolve_call_site: bool,
    pub error_traces: bool,
    /// Directory of the log file; no file sink when unset.
    pub file_path: Option<PathBuf>,
    pub file_name: Option<String>,
    pub file_queue: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stamp: None,
            boxed: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            tag_width: DEFAULT_TAG_WIDTH,
            line_offset: DEFAULT_LINE_OFFSET,
            console: true,
            console_max_len: DEFAULT_MAX_LEN,
            resolve_call_site: true,
            error_traces: true,
            file_path: None,
            file_name: None,
            file_queue: DEFAULT_FILE_QUEUE,
        }
    }
}

impl LogConfig {
    /// Reads `[Logging]`, falling back to defaults for missing keys. A
    /// `stamp` before the first section applies when `[Logging]` has none.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let d = Self::default();
        let s = LOGGING_SECTION;

        let chunk_size = config.parse_or(s, "chunk_size", d.chunk_size)?;
        if chunk_size == 0 {
            return Err(invalid("chunk_size", "0"));
        }

        Ok(Self {
            enabled: config.flag_or(s, "enabled", d.enabled)?,
            stamp: Some(config.get_or_default(s, "stamp", ""))
                .filter(|v| !v.is_empty())
                .map(str::to_owned),
            boxed: config.flag_or(s, "boxed", d.boxed)?,
            chunk_size,
            tag_width: config.parse_or(s, "tag_width", d.tag_width)?,
            line_offset: config.parse_or(s, "line_offset", d.line_offset)?,
            console: config.flag_or(s, "console", d.console)?,
            console_max_len: config.parse_or(s, "console_max_len", d.console_max_len)?,
            resolve_call_site: config.flag_or(s, "resolve_call_site", d.resolve_call_site)?,
            error_traces: config.flag_or(s, "error_traces", d.error_traces)?,
            file_path: config.get_non_empty(s, "file_path").map(expand_path),
            file_name: config.get_non_empty(s, "file_name").map(str::to_owned),
            file_queue: config.parse_or(s, "file_queue", d.file_queue)?.max(1),
        })
    }

    /// Loads an INI file and reads its `[Logging]` section.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_config(&Config::load(path)?)
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
            if let Some(rest) = path_str
                .strip_prefix("~/")
                .or_else(|| path_str.strip_prefix("~\\"))
            {
                home_path.push(rest);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
# shared
stamp = global-stamp

[Logging]
enabled = yes
stamp = "build-42"
boxed = false
chunk_size = 1200
file_name = app
"#;

    #[test]
    fn parses_sections_globals_and_quotes() {
        let config = Config::parse(SAMPLE);
        assert_eq!(config.get_global("stamp"), Some("global-stamp"));
        assert_eq!(config.get("Logging", "stamp"), Some("build-42"));
        assert_eq!(config.get_or_default("Other", "stamp", "x"), "global-stamp");
        assert_eq!(config.get_or_default("Other", "nope", "x"), "x");
    }

    #[test]
    fn log_config_reads_logging_section() {
        let log = LogConfig::from_config(&Config::parse(SAMPLE)).unwrap();
        assert!(log.enabled);
        assert!(!log.boxed);
        assert_eq!(log.stamp.as_deref(), Some("build-42"));
        assert_eq!(log.chunk_size, 1200);
        assert_eq!(log.tag_width, DEFAULT_TAG_WIDTH);
        assert_eq!(log.file_name.as_deref(), Some("app"));
        assert!(log.file_path.is_none());
    }

    #[test]
    fn empty_config_gives_defaults() {
        assert_eq!(LogConfig::from_config(&Config::default()).unwrap(), LogConfig::default());
    }

    #[test]
    fn global_stamp_backs_the_logging_section() {
        let config = Config::parse("stamp = shared\n[Logging]\nboxed = no\n");
        let log = LogConfig::from_config(&config).unwrap();
        assert_eq!(log.stamp.as_deref(), Some("shared"));

        let config = Config::parse("stamp = shared\n[Logging]\nstamp = own\n");
        let log = LogConfig::from_config(&config).unwrap();
        assert_eq!(log.stamp.as_deref(), Some("own"));
    }

    #[test]
    fn bad_values_are_reported() {
        let config = Config::parse("[Logging]\nchunk_size = lots\n");
        match LogConfig::from_config(&config) {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "chunk_size");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }

        let config = Config::parse("[Logging]\nboxed = maybe\n");
        assert!(LogConfig::from_config(&config).is_err());

        let config = Config::parse("[Logging]\nchunk_size = 0\n");
        assert!(LogConfig::from_config(&config).is_err());
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[Logging]\ntag_width = 12").unwrap();
        let log = LogConfig::load(file.path()).unwrap();
        assert_eq!(log.tag_width, 12);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            LogConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn expand_path_leaves_plain_paths() {
        assert_eq!(expand_path("/var/log"), PathBuf::from("/var/log"));
    }
}
