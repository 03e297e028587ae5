//! Light/dark theme preference

use log::debug;

use crate::observable::{Observable, Subscription};
use crate::storage::StorageService;
use crate::types::Theme;

pub struct ThemeToggle {
    storage: StorageService,
    theme: Observable<Theme>,
}

impl ThemeToggle {
    /// Starts on the default theme until [`load`](Self::load) runs.
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage,
            theme: Observable::new(Theme::default()),
        }
    }

    pub async fn load(&self) -> Theme {
        let saved = self.storage.get_theme().await;
        self.theme.set(saved);
        saved
    }

    pub fn get(&self) -> Theme {
        self.theme.get()
    }

    pub fn is_dark(&self) -> bool {
        self.get().is_dark()
    }

    /// Flips the theme. Observers are notified before the new value is
    /// written to the store.
    pub async fn toggle(&self) -> Theme {
        let next = self.theme.update(|current| current.toggled());
        debug!("Theme switched to {}", next);
        self.storage.set_theme(next).await;
        next
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Theme) + Send + Sync + 'static,
    {
        self.theme.subscribe(listener)
    }
}
