use std::sync::Arc;

use crate::config::{Settings, SettingsStore};
use crate::page::Page;

/// State shared by every component of a notifier: the settings and the page
/// the widget renders into.
pub struct Context {
    pub settings: SettingsStore,
    pub page: Arc<dyn Page>,
}

impl Context {
    #[must_use]
    pub fn new(page: Arc<dyn Page>, settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            settings: SettingsStore::new(settings),
            page,
        })
    }
}
