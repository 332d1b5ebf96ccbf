//! Path utilities for tickbridge
//!
//! Handles XDG Base Directory locations for config and state, and the
//! port discovery file that lets the controller find the bridge.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::{BridgeError, Result};

/// Application identifier for XDG directories
const APP_NAME: &str = "tickbridge";

/// Default name of the port discovery file inside the project directory
pub const DEFAULT_PORT_FILE_NAME: &str = "bridge-port.txt";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/tickbridge` or `~/.config/tickbridge`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".config").join(APP_NAME))
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/tickbridge/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/tickbridge` or `~/.local/state/tickbridge`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| home_dir().join(".local").join("state").join(APP_NAME))
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/tickbridge/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Resolve the port discovery file for a project
///
/// A missing `project_dir` means the process working directory.
pub fn port_file_path(project_dir: Option<&Path>, file_name: &str) -> PathBuf {
    let base = project_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(file_name)
}

/// Publish the bridge port as bare decimal digits
///
/// The file is written next to its final location and renamed into place so
/// a reader never observes a partially written port.
pub fn write_port_file(path: &Path, port: u16) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BridgeError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, port.to_string()).map_err(|e| BridgeError::FileWrite {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| BridgeError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a published port
///
/// Returns `None` when the file is missing or does not hold a valid port.
pub fn read_port_file(path: &Path) -> Option<u16> {
    let content = std::fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u16>().ok().filter(|port| *port != 0)
}

/// Remove a published port, ignoring a file that is already gone
pub fn remove_port_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BridgeError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
