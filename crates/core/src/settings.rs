//! The settings boundary: where the API key and the model live.

use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

/// Key of the persisted API key.
pub const API_KEY: &str = "agent.apikey";
/// Key of the persisted model identifier.
pub const MODEL: &str = "agent.model";
/// The model used until the user picks one.
pub const DEFAULT_MODEL: &str = "anthropic/claude-4-5-sonnet";

/// Error type for settings stores.
#[derive(Debug)]
pub enum Error {
    /// Reading or writing the backing file failed.
    Io(io::Error),
    /// The backing file is not valid TOML.
    Decode(toml::de::Error),
    /// The settings could not be encoded.
    Encode(toml::ser::Error),
    /// The key is not of the form `section.field`.
    InvalidKey(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "settings I/O error: {err}"),
            Error::Decode(err) => write!(f, "invalid settings file: {err}"),
            Error::Encode(err) => write!(f, "cannot encode settings: {err}"),
            Error::InvalidKey(key) => write!(f, "invalid settings key: {key}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Decode(err) => Some(err),
            Error::Encode(err) => Some(err),
            Error::InvalidKey(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// A persistent key-value store for user settings.
pub trait SettingsStore: Send + 'static {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

/// A store that forgets everything when dropped.
#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding an API key.
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        let mut store = Self::new();
        store.values.insert(API_KEY.to_owned(), api_key.into());
        store
    }
}

impl SettingsStore for MemorySettings {
    #[inline]
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    #[inline]
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A store backed by a TOML file.
///
/// A dotted key `section.field` maps to `field` in the `[section]` table.
/// Every `set` writes the whole file back.
#[derive(Debug)]
pub struct TomlSettings {
    path: PathBuf,
    table: Table,
}

impl TomlSettings {
    /// Opens the store at `path`. A missing file is an empty store; it is
    /// created on the first `set`.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, Error> {
        let path = path.into();
        let table = match fs::read_to_string(&path) {
            Ok(text) => text.parse::<Table>().map_err(Error::Decode)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Table::new(),
            Err(err) => return Err(err.into()),
        };
        debug!("loaded settings from {}", path.display());
        Ok(Self { path, table })
    }

    /// Returns the path of the backing file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), Error> {
        let text = toml::to_string_pretty(&self.table).map_err(Error::Encode)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl SettingsStore for TomlSettings {
    fn get(&self, key: &str) -> Option<String> {
        let (section, field) = key.split_once('.')?;
        self.table
            .get(section)?
            .get(field)?
            .as_str()
            .map(ToOwned::to_owned)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let Some((section, field)) = key.split_once('.') else {
            return Err(Error::InvalidKey(key.to_owned()));
        };
        let entry = self
            .table
            .entry(section)
            .or_insert_with(|| Value::Table(Table::new()));
        let Value::Table(table) = entry else {
            return Err(Error::InvalidKey(key.to_owned()));
        };
        table.insert(field.to_owned(), Value::String(value.to_owned()));
        self.save()
    }
}

/// The settings the conversation manager needs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AgentSettings {
    /// Credential for the model provider.
    pub api_key: String,
    /// Model identifier, e.g. `anthropic/claude-4-5-sonnet`.
    pub model: String,
}

impl AgentSettings {
    /// Reads the settings, falling back to an empty key and the default
    /// model.
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self {
            api_key: store.get(API_KEY).unwrap_or_default(),
            model: store
                .get(MODEL)
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        }
    }

    /// Persists both keys.
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), Error> {
        store.set(API_KEY, &self.api_key)?;
        store.set(MODEL, &self.model)
    }

    /// Returns whether an API key has been set up.
    #[inline]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }
}

impl Debug for AgentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("AgentSettings")
            .field("api_key", &api_key)
            .field("model", &self.model)
            .finish()
    }
}
