//! Startup commands read from an rc file.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use thiserror::Error;

use super::{Settings, SettingsError};
use crate::usertypes::types::{expand_user, tildify};

#[derive(Debug, Error)]
pub enum RcFileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("No read permission for rc file: {0}")]
    Permission(String),
    #[error("Can't read rc file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: Unknown command: {command}")]
    UnknownCommand {
        path: String,
        line: usize,
        command: String,
    },
    #[error("{path}:{line}: Usage: set <NAME> <VALUE>")]
    Usage { path: String, line: usize },
    #[error("{path}:{line}: {source}")]
    Setting {
        path: String,
        line: usize,
        #[source]
        source: SettingsError,
    },
}

/// One non-empty, non-comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcLine {
    pub number: usize,
    pub text: String,
}

/// Read command lines from `path`.
///
/// A missing file is only an error when it isn't `default`.
pub fn read(path: &Path, default: Option<&Path>) -> Result<Vec<RcLine>, RcFileError> {
    let path = expand_user(path);
    debug!("Reading rc file: {}", path.display());
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if default.map(expand_user).as_deref() == Some(path.as_path()) {
                return Ok(Vec::new());
            }
            return Err(RcFileError::NotFound(tildify(&path)));
        }
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            return Err(RcFileError::Permission(tildify(&path)));
        }
        Err(source) => {
            return Err(RcFileError::Read {
                path: tildify(&path),
                source,
            })
        }
    };
    Ok(parse(&contents))
}

pub fn parse(contents: &str) -> Vec<RcLine> {
    contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, text)| RcLine {
            number,
            text: text.to_string(),
        })
        .collect()
}

/// Run `set` commands against `settings`. Stops at the first failing line.
pub async fn apply(settings: &mut Settings, path: &Path, lines: &[RcLine]) -> Result<usize, RcFileError> {
    let shown = tildify(path);
    for line in lines {
        let mut words = line.text.splitn(2, char::is_whitespace);
        let command = words.next().unwrap_or_default();
        if command != "set" {
            return Err(RcFileError::UnknownCommand {
                path: shown,
                line: line.number,
                command: command.to_string(),
            });
        }
        let rest = words.next().unwrap_or_default().trim();
        let Some((name, value)) = rest.split_once(char::is_whitespace) else {
            return Err(RcFileError::Usage {
                path: shown,
                line: line.number,
            });
        };
        settings
            .set(name, value.trim())
            .await
            .map_err(|source| RcFileError::Setting {
                path: shown.clone(),
                line: line.number,
                source,
            })?;
    }
    if !lines.is_empty() {
        debug!("Applied {} commands from {}", lines.len(), shown);
    }
    Ok(lines.len())
}

/// Read and apply `path`, falling back to `default` when no path was given.
pub async fn load(
    settings: &mut Settings,
    path: Option<&Path>,
    default: Option<PathBuf>,
) -> Result<usize, RcFileError> {
    let Some(path) = path.map(Path::to_path_buf).or_else(|| default.clone()) else {
        warn!("No rc file location available");
        return Ok(0);
    };
    let lines = read(&path, default.as_deref())?;
    apply(settings, &path, &lines).await
}
