//! Defines the durable store for the bearer token and its file-backed
//! implementation.
//!
//! The store is a single named slot: the token survives restarts, and an
//! empty slot means the session starts anonymous.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// The file name of the token slot inside the data directory.
pub const TOKEN_FILE_NAME: &str = "access_token";

/// A single durable slot holding the raw bearer token string.
pub trait TokenStore {
    /// The saved token, if one exists.
    fn read(&self) -> Option<String>;

    /// Save `token`, replacing any previous value.
    fn write(&self, token: &str) -> io::Result<()>;

    /// Empty the slot. Clearing an empty slot is fine.
    fn clear(&self) -> io::Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn read(&self) -> Option<String> {
        (**self).read()
    }

    fn write(&self, token: &str) -> io::Result<()> {
        (**self).write(token)
    }

    fn clear(&self) -> io::Result<()> {
        (**self).clear()
    }
}

/// A token slot backed by a file in the client's data directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store whose slot lives at `data_dir`/`access_token`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TOKEN_FILE_NAME),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Option<String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                tracing::warn!("could not read the token file {:?}: {error}", self.path);
                return None;
            }
        };

        let token = contents.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_owned())
        }
    }

    fn write(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}

/// A token slot that lives only as long as the process.
///
/// Useful for sessions that should not leave a token on disk, and as the
/// store for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty in-memory slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot already holding `token`, as if it had been saved by an
    /// earlier run.
    pub fn holding(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_owned())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn write(&self, token: &str) -> io::Result<()> {
        *self.token.lock().unwrap() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}
