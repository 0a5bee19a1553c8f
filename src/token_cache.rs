//! Key-value storage for session tokens.
//!
//! Failures are logged and swallowed: a cache that cannot be read behaves
//! like an empty cache, and a failed write leaves the user signed out the
//! next time the app starts.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Stores string values by string key.
pub trait TokenCache: Send + Sync {
    /// Get the value stored under `key`, if any.
    fn get_token(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn save_token(&self, key: &str, value: &str);

    /// Remove the value stored under `key`.
    fn remove_token(&self, key: &str);
}

/// A token cache that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryTokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenCache for MemoryTokenCache {
    fn get_token(&self, key: &str) -> Option<String> {
        match self.tokens.lock() {
            Ok(tokens) => tokens.get(key).cloned(),
            Err(error) => {
                tracing::error!("Could not acquire the token cache lock: {error}");
                None
            }
        }
    }

    fn save_token(&self, key: &str, value: &str) {
        match self.tokens.lock() {
            Ok(mut tokens) => {
                tokens.insert(key.to_owned(), value.to_owned());
            }
            Err(error) => tracing::error!("Could not acquire the token cache lock: {error}"),
        }
    }

    fn remove_token(&self, key: &str) {
        match self.tokens.lock() {
            Ok(mut tokens) => {
                tokens.remove(key);
            }
            Err(error) => tracing::error!("Could not acquire the token cache lock: {error}"),
        }
    }
}

/// A token cache backed by a JSON file holding a single object of strings.
#[derive(Debug)]
pub struct FileTokenCache {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file within this process.
    lock: Mutex<()>,
}

impl FileTokenCache {
    /// Create a cache that reads and writes `path`.
    ///
    /// The file does not need to exist yet; it is created on the first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
            lock: Mutex::new(()),
        }
    }

    /// The file this cache is stored in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HashMap<String, String>, String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|error| error.to_string()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(error) => Err(error.to_string()),
        }
    }

    fn write(&self, tokens: &HashMap<String, String>) -> Result<(), String> {
        let text = serde_json::to_string_pretty(tokens).map_err(|error| error.to_string())?;
        fs::write(&self.path, text).map_err(|error| error.to_string())
    }

    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>)) {
        let Ok(_guard) = self.lock.lock() else {
            tracing::error!("Could not acquire the token cache lock");
            return;
        };

        let mut tokens = match self.read() {
            Ok(tokens) => tokens,
            Err(error) => {
                tracing::error!(
                    "Could not read token cache {}, starting afresh: {error}",
                    self.path.display()
                );
                HashMap::new()
            }
        };

        change(&mut tokens);

        if let Err(error) = self.write(&tokens) {
            tracing::error!("Could not write token cache {}: {error}", self.path.display());
        }
    }
}

impl TokenCache for FileTokenCache {
    fn get_token(&self, key: &str) -> Option<String> {
        let Ok(_guard) = self.lock.lock() else {
            tracing::error!("Could not acquire the token cache lock");
            return None;
        };

        match self.read() {
            Ok(mut tokens) => tokens.remove(key),
            Err(error) => {
                tracing::error!("Could not read token cache {}: {error}", self.path.display());
                None
            }
        }
    }

    fn save_token(&self, key: &str, value: &str) {
        self.update(|tokens| {
            tokens.insert(key.to_owned(), value.to_owned());
        });
    }

    fn remove_token(&self, key: &str) {
        self.update(|tokens| {
            tokens.remove(key);
        });
    }
}
