//! services/learner/src/workspace/preferences.rs
//!
//! UI-preference flags persisted in the key-value store as `"true"`/`"false"`.

use std::sync::Arc;

use learning_core::domain::TopicId;
use learning_core::ports::{KeyValueStore, PortResult};
use tracing::warn;

pub const SIDEBAR_TOPICS_KEY: &str = "sidebar-topics-expanded";
pub const SIDEBAR_MATERIALS_KEY: &str = "sidebar-materials-expanded";

pub fn objectives_key(topic_id: &TopicId) -> String {
    format!("objectives-expanded-{}", topic_id)
}

/// Reads a boolean flag, falling back to `default` when absent or unparsable.
pub fn read_flag(store: &dyn KeyValueStore, key: &str, default: bool) -> bool {
    match store.get(key).as_deref() {
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            warn!("Ignoring unexpected value '{}' for preference {}", other, key);
            default
        }
        None => default,
    }
}

pub fn write_flag(store: &dyn KeyValueStore, key: &str, value: bool) -> PortResult<()> {
    store.set(key, if value { "true" } else { "false" })
}

/// Expanded state of the two course-page sidebar sections.
///
/// Read once when the page mounts; every toggle writes through.
pub struct SidebarPrefs {
    store: Arc<dyn KeyValueStore>,
    topics_expanded: bool,
    materials_expanded: bool,
}

impl SidebarPrefs {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let topics_expanded = read_flag(store.as_ref(), SIDEBAR_TOPICS_KEY, true);
        let materials_expanded = read_flag(store.as_ref(), SIDEBAR_MATERIALS_KEY, true);
        Self {
            store,
            topics_expanded,
            materials_expanded,
        }
    }

    pub fn topics_expanded(&self) -> bool {
        self.topics_expanded
    }

    pub fn materials_expanded(&self) -> bool {
        self.materials_expanded
    }

    pub fn toggle_topics(&mut self) -> PortResult<bool> {
        self.topics_expanded = !self.topics_expanded;
        write_flag(self.store.as_ref(), SIDEBAR_TOPICS_KEY, self.topics_expanded)?;
        Ok(self.topics_expanded)
    }

    pub fn toggle_materials(&mut self) -> PortResult<bool> {
        self.materials_expanded = !self.materials_expanded;
        write_flag(
            self.store.as_ref(),
            SIDEBAR_MATERIALS_KEY,
            self.materials_expanded,
        )?;
        Ok(self.materials_expanded)
    }
}
