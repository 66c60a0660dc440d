//! Client-local key/value storage shared by the session
//! gate, the signup flow, and user preferences

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

// ===== Well-known keys =====

/// UI theme ("light" | "dark")
pub const KEY_THEME: &str = "theme";

/// Email staged for the onboarding flow to consume
pub const KEY_EMAIL: &str = "email";

/// Transient onboarding-complete marker, value "1"
pub const KEY_ONBOARDING_COMPLETE: &str
  = "onboardingComplete";

/// Opaque auth token, cleared on logout
pub const KEY_TOKEN: &str = "token";

/// Opaque serialized user, cleared on logout
pub const KEY_USER: &str = "user";

/// Value written for presence-style flags
pub const FLAG_SET: &str = "1";

// ===== Errors =====

/// Storage backend failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError
{   pub message: String
}

impl StorageError
{   pub fn new(message: String) -> Self
    {   StorageError
        {   message
        }
    }
}

impl fmt::Display for StorageError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   write!(f, "Storage error: {}", self.message)
    }
}

impl std::error::Error for StorageError {}

// ===== Storage trait =====

/// Key/value storage seam. Consumers that must stay
/// usable without storage (the session gate) swallow
/// errors and treat them as absent values.
pub trait ClientStorage: Send
{   fn get(&self, key: &str)
      -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str)
      -> Result<(), StorageError>;

    fn remove(&self, key: &str)
      -> Result<(), StorageError>;
}

// ===== In-memory backend =====

/// Volatile storage, mostly for tests and short sessions
pub struct MemoryStorage
{   entries: Mutex<HashMap<String, String>>
}

impl MemoryStorage
{   pub fn new() -> Self
    {   MemoryStorage
        {   entries: Mutex::new(HashMap::new())
        }
    }
}

impl Default for MemoryStorage
{   fn default() -> Self
    {   MemoryStorage::new()
    }
}

impl ClientStorage for MemoryStorage
{   fn get(&self, key: &str)
      -> Result<Option<String>, StorageError>
    {   let entries = self.entries.lock().map_err(|_| {
          StorageError::new("Lock poisoned".to_string())
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str)
      -> Result<(), StorageError>
    {   let mut entries
          = self.entries.lock().map_err(|_| {
              StorageError::new("Lock poisoned".to_string())
            })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str)
      -> Result<(), StorageError>
    {   let mut entries
          = self.entries.lock().map_err(|_| {
              StorageError::new("Lock poisoned".to_string())
            })?;
        entries.remove(key);
        Ok(())
    }
}

// ===== File backend =====

/// Storage persisted as one JSON object on disk. Each
/// mutation is a read-modify-write; a missing or corrupt
/// file reads as empty.
pub struct FileStorage
{   path: PathBuf
}

impl FileStorage
{   pub fn new(path: PathBuf) -> Self
    {   debug!("FileStorage at {}", path.display());
        FileStorage
        {   path
        }
    }

    fn read_map(&self) -> HashMap<String, String>
    {   let raw = match fs::read_to_string(&self.path)
        {   Ok(raw) => raw
          , Err(_) => return HashMap::new()
        };

        match serde_json::from_str(&raw)
        {   Ok(map) => map
          , Err(e) => {
              warn!(
                "Corrupt storage file {}; starting empty: {}",
                self.path.display(),
                e
              );
              HashMap::new()
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>)
      -> Result<(), StorageError>
    {   let raw = serde_json::to_string_pretty(map)
          .map_err(|e| {
            StorageError::new(format!(
              "Failed to serialize storage: {}", e
            ))
          })?;

        fs::write(&self.path, raw).map_err(|e| {
          StorageError::new(format!(
            "Failed to write {}: {}",
            self.path.display(),
            e
          ))
        })
    }
}

impl ClientStorage for FileStorage
{   fn get(&self, key: &str)
      -> Result<Option<String>, StorageError>
    {   Ok(self.read_map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str)
      -> Result<(), StorageError>
    {   let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str)
      -> Result<(), StorageError>
    {   let mut map = self.read_map();
        if map.remove(key).is_some()
        {   return self.write_map(&map);
        }
        Ok(())
    }
}

// ===== Theme =====

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme
{   Light
  , Dark
}

impl Theme
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Theme::Light => "light"
          , Theme::Dark => "dark"
        }
    }

    pub fn parse(value: &str) -> Option<Theme>
    {   match value
        {   "light" => Some(Theme::Light)
          , "dark" => Some(Theme::Dark)
          , _ => None
        }
    }
}

/// Read the stored theme; anything unreadable or unknown
/// falls back to dark
pub fn load_theme(storage: &dyn ClientStorage) -> Theme
{   match storage.get(KEY_THEME)
    {   Ok(Some(value)) => {
          Theme::parse(&value).unwrap_or(Theme::Dark)
        }
      , Ok(None) => Theme::Dark
      , Err(e) => {
          warn!("Failed to read theme: {}", e);
          Theme::Dark
        }
    }
}

/// Persist the theme preference
pub fn save_theme(
  storage: &dyn ClientStorage
, theme: Theme
) -> Result<(), StorageError>
{   debug!("Saving theme: {}", theme.as_str());
    storage.set(KEY_THEME, theme.as_str())
}

/// Drop stored auth material on logout
pub fn clear_auth(storage: &dyn ClientStorage)
  -> Result<(), StorageError>
{   debug!("Clearing stored auth material");
    storage.remove(KEY_TOKEN)?;
    storage.remove(KEY_USER)
}
