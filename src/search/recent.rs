use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::PortalError;
use crate::data::{SearchHit, SearchKind};
use crate::storage::{KeyValueStore, keys, read_json, write_json};

/// A search result the user opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub url: String,
}

impl From<&SearchHit> for RecentSearch {
    fn from(hit: &SearchHit) -> Self {
        Self {
            id: hit.id.clone(),
            name: hit.name.clone(),
            kind: hit.kind,
            url: hit.url.clone(),
        }
    }
}

/// Most-recently-used selections in tab storage, newest first, unique by id.
pub struct RecentSearches {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl RecentSearches {
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self { store, capacity }
    }

    /// A missing or unreadable list is empty.
    pub fn list(&self) -> Vec<RecentSearch> {
        match read_json::<Vec<RecentSearch>>(self.store.as_ref(), keys::RECENT_SEARCHES) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                log::warn!(
                    target: "campusgate",
                    "msg=\"ignoring unreadable recent searches\", error=\"{e}\""
                );
                Vec::new()
            }
        }
    }

    /// Moves `item` to the front, dropping any older entry with the same id
    /// and anything past capacity.
    pub fn record(&self, item: RecentSearch) -> Result<Vec<RecentSearch>, PortalError> {
        let mut list = self.list();
        list.retain(|existing| existing.id != item.id);
        list.insert(0, item);
        list.truncate(self.capacity);

        write_json(self.store.as_ref(), keys::RECENT_SEARCHES, &list)?;
        Ok(list)
    }

    pub fn clear(&self) -> Result<(), PortalError> {
        self.store.remove(keys::RECENT_SEARCHES)
    }
}
