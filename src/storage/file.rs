use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use super::KeyValueStore;
use crate::error::Error;

type Items = BTreeMap<String, String>;

/// Store kept as a single JSON object on disk.
///
/// Every write rewrites the whole document through a temporary file and a
/// rename. A missing file reads as an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_items(&self) -> Result<Items, Error> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Items::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Items::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// A corrupt document is replaced rather than blocking every later write.
    async fn read_items_for_update(&self) -> Result<Items, Error> {
        match self.read_items().await {
            Err(Error::Json(err)) => {
                warn!("Discarding unreadable store {}: {}", self.path.display(), err);
                Ok(Items::new())
            }
            other => other,
        }
    }

    async fn write_items(&self, items: &Items) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(items)?).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} keys to {}", items.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let mut items = self.read_items().await?;
        Ok(items.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_items_for_update().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_items_for_update().await?;
        if items.remove(key).is_some() {
            self.write_items(&items).await?;
        }
        Ok(())
    }
}
