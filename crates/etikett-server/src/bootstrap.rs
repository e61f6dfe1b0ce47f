// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process bootstrap: data directory, configuration file, environment
// overrides.
//
// Lookup order for the configuration file:
//   1. $ETIKETT_CONFIG
//   2. <data dir>/config.json
// A missing file means defaults.  A file that exists but does not parse is
// fatal.  $ETIKETT_BIND and $ETIKETT_DB then override the listen address
// and the database path.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use etikett_core::config::ServiceConfig;
use etikett_core::error::{EtikettError, Result};

/// Configuration file name inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Default database file name inside the data directory.
pub const DB_FILE: &str = "print_queue.db";

pub const ENV_CONFIG: &str = "ETIKETT_CONFIG";
pub const ENV_BIND: &str = "ETIKETT_BIND";
pub const ENV_DB: &str = "ETIKETT_DB";

/// Return the service data directory, creating it if needed.
///
/// `$XDG_DATA_HOME/etikett`, else `~/.local/share/etikett`, else
/// `/tmp/etikett`.
pub fn data_dir() -> Result<PathBuf> {
    let dir = data_base().join("etikett");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn data_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

/// Read a configuration file.  `Ok(None)` if it does not exist.
pub fn read_config(path: &Path) -> Result<Option<ServiceConfig>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| EtikettError::Config(format!("{}: {e}", path.display())))
}

/// Apply `ETIKETT_BIND` / `ETIKETT_DB` style overrides.
pub fn apply_overrides(mut config: ServiceConfig, bind: Option<String>, db: Option<PathBuf>) -> ServiceConfig {
    if let Some(bind) = bind {
        config.http_bind = bind;
    }
    if let Some(db) = db {
        config.database_path = Some(db);
    }
    config
}

/// Load, override, validate.  The returned config always has a database
/// path.
pub fn load_config(data_dir: &Path) -> Result<ServiceConfig> {
    let path = std::env::var_os(ENV_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE));

    let config = match read_config(&path)? {
        Some(config) => {
            info!(path = %path.display(), "configuration loaded");
            config
        }
        None => {
            warn!(path = %path.display(), "no configuration file, using defaults");
            ServiceConfig::default()
        }
    };

    let mut config = apply_overrides(
        config,
        std::env::var(ENV_BIND).ok(),
        std::env::var_os(ENV_DB).map(PathBuf::from),
    );
    if config.database_path.is_none() {
        config.database_path = Some(data_dir.join(DB_FILE));
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use etikett_core::config::OutputConfig;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(&dir.path().join(CONFIG_FILE)).unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_config(&path), Err(EtikettError::Config(_))));
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{ "worker_count": 2, "output": { "kind": "device", "path": "/dev/usb/lp0", "timeout_secs": 5 } }"#,
        )
        .unwrap();

        let config = read_config(&path).unwrap().unwrap();
        assert_eq!(config.worker_count, Some(2));
        assert!(matches!(config.output, OutputConfig::Device { .. }));
    }

    #[test]
    fn overrides_win_over_file() {
        let config = apply_overrides(
            ServiceConfig::default(),
            Some("127.0.0.1:9000".into()),
            Some(PathBuf::from("/var/lib/etikett/q.db")),
        );
        assert_eq!(config.http_bind, "127.0.0.1:9000");
        assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/etikett/q.db")));
    }

    #[test]
    fn no_overrides_keep_file_values() {
        let config = apply_overrides(ServiceConfig::default(), None, None);
        assert_eq!(config, ServiceConfig::default());
    }
}
