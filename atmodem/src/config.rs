//! JSON configuration for the emulator.
//!
//! Looked up at `$ATMODEM_CONFIG`, then `$HOME/.config/atmodem/config.json`.
//! Every key is optional; a missing file means defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use atmodem_core::{ModemInfo, Registers};
use serde::Deserialize;

use crate::error::{Error, Result};

const CONFIG_ENV: &str = "ATMODEM_CONFIG";

/// Which backend carries calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiallerKind {
    #[default]
    Tcp,
    Loopback,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub dialler: DiallerKind,
    /// Poll timeout driving the escape guard-time check.
    pub tick_ms: u64,
    /// Turn LF from the terminal into the carriage-return register value.
    pub translate_lf: bool,
    /// Text appended to `CONNECT`, e.g. `"9600"`.
    pub connect_rate: String,
    pub identity: String,
    pub version: String,
    pub url: String,
    pub escape_char: u8,
    /// Escape guard time in hundredths of a second.
    pub guard_time_cs: u32,
    pub echo: bool,
    pub verbose: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        let info = ModemInfo::default();
        let registers = Registers::default();

        Self {
            dialler: DiallerKind::default(),
            tick_ms: 100,
            translate_lf: true,
            connect_rate: String::new(),
            identity: info.identity,
            version: info.version,
            url: info.url,
            escape_char: registers.escape(),
            guard_time_cs: 100,
            echo: true,
            verbose: true,
        }
    }
}

impl ModemConfig {
    /// Load the configuration, falling back to defaults when it is broken.
    pub fn load() -> Self {
        let path = config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to load config, using defaults: {err}");
                Self::default()
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("no config at {}", path.display());
                return Ok(Self::default());
            },
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Poll timeout, never shorter than a millisecond.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn info(&self) -> ModemInfo {
        ModemInfo {
            identity: self.identity.clone(),
            version: self.version.clone(),
            url: self.url.clone(),
        }
    }

    pub fn registers(&self) -> Registers {
        Registers::default()
            .with_escape(self.escape_char)
            .with_guard_time(self.guard_time_cs)
    }
}

fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("atmodem")
            .join("config.json");
    }
    std::env::temp_dir().join("atmodem").join("config.json")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config: ModemConfig =
            serde_json::from_str("{}").expect("should deserialize");
        assert_eq!(config, ModemConfig::default());
        assert_eq!(config.info(), ModemInfo::default());
        assert_eq!(config.registers(), Registers::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let json = serde_json::json!({
            "dialler": "loopback",
            "connect_rate": "9600",
            "escape_char": 35,
            "guard_time_cs": 50,
            "echo": false
        });

        let config: ModemConfig =
            serde_json::from_value(json).expect("should deserialize");
        assert_eq!(config.dialler, DiallerKind::Loopback);
        assert_eq!(config.connect_rate, "9600");
        assert!(!config.echo);
        assert!(config.verbose);
        assert!(config.translate_lf);

        let registers = config.registers();
        assert_eq!(registers.escape(), b'#');
        assert_eq!(registers.guard_time(), Duration::from_millis(500));
    }

    #[test]
    fn unknown_dialler_is_rejected() {
        let result =
            serde_json::from_str::<ModemConfig>(r#"{"dialler": "serial"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir()
            .join("atmodem-config-test")
            .join("does-not-exist.json");
        let config = ModemConfig::load_from(&path).expect("should load");
        assert_eq!(config, ModemConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = std::env::temp_dir()
            .join(format!("atmodem-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").expect("write config");

        let result = ModemConfig::load_from(&path);
        assert!(matches!(result, Err(Error::Config { .. })));

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn tick_is_never_zero() {
        let config = ModemConfig {
            tick_ms: 0,
            ..ModemConfig::default()
        };
        assert_eq!(config.tick(), Duration::from_millis(1));
    }
}
