//! Environment sources and credential lookup

use crate::error::{Error, Result};
use crate::types::StringMap;
use secrecy::SecretString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Env file read when `load_env_vars` is set and no path is given
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Snapshot of the env file and the process environment.
///
/// Lookups prefer the process value over the file value.
#[derive(Clone, Default)]
pub struct EnvSource {
    file: StringMap,
    process: StringMap,
    path: Option<PathBuf>,
}

// Values are never printed; both maps routinely hold API keys.
impl std::fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSource")
            .field("path", &self.path)
            .field("file_vars", &self.file.len())
            .field("process_vars", &self.process.len())
            .finish()
    }
}

impl EnvSource {
    /// An environment with no variables
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit maps
    pub fn from_parts(file: StringMap, process: StringMap) -> Self {
        Self {
            file,
            process,
            path: None,
        }
    }

    /// Read `path` and snapshot the current process environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_process(path, std::env::vars().collect())
    }

    /// Read `path` and pair it with the given process variables
    pub fn load_with_process(path: impl AsRef<Path>, process: StringMap) -> Result<Self> {
        let path = path.as_ref();
        let file = read_env_file(path)?;
        tracing::debug!(
            path = %path.display(),
            file_vars = file.len(),
            "Loaded environment"
        );
        Ok(Self {
            file,
            process,
            path: Some(path.to_path_buf()),
        })
    }

    /// Look up a variable: process first, then file. Empty values count as unset.
    ///
    /// Each source is tried with the name as given and in lower case,
    /// so `HTTP_PROXY` also finds `http_proxy`.
    pub fn get(&self, name: &str) -> Option<&str> {
        lookup(&self.process, name).or_else(|| lookup(&self.file, name))
    }

    /// Whether neither source holds any variable
    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.process.is_empty()
    }

    /// Path of the env file this snapshot was read from
    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Variables read from the env file
    pub fn file_vars(&self) -> &StringMap {
        &self.file
    }
}

fn lookup<'a>(vars: &'a StringMap, name: &str) -> Option<&'a str> {
    [name.to_string(), name.to_lowercase()]
        .iter()
        .find_map(|key| vars.get(key).map(String::as_str).filter(|v| !v.is_empty()))
}

fn read_env_file(path: &Path) -> Result<StringMap> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(StringMap::new()),
        Err(e) => return Err(env_file_error(path, &e)),
    };

    iter.map(|item| item.map_err(|e| env_file_error(path, &e)))
        .collect()
}

fn env_file_error(path: &Path, e: &dotenvy::Error) -> Error {
    Error::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Named secrets supplied as constructor arguments.
///
/// Values are held as [`SecretString`] so they never show up in `Debug`
/// output or log records.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    entries: HashMap<String, SecretString>,
}

impl Credentials {
    /// Create an empty credential set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a credential
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(name.into(), SecretString::from(value.into()));
    }

    /// Explicitly supplied credential
    pub fn get(&self, name: &str) -> Option<&SecretString> {
        self.entries.get(name)
    }

    /// Names of the explicitly supplied credentials
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolve a credential: argument, then process env, then env file
    pub fn resolve(&self, name: &str, env: &EnvSource) -> Option<SecretString> {
        self.entries
            .get(name)
            .cloned()
            .or_else(|| env.get(name).map(|v| SecretString::from(v.to_string())))
    }

    /// Like [`Credentials::resolve`], failing when nothing supplies the value
    pub fn require(&self, name: &str, env: &EnvSource) -> Result<SecretString> {
        self.resolve(name, env)
            .ok_or_else(|| Error::missing_credential(name))
    }
}
