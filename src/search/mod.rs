//! Global search: keyboard shortcut, debounced queries, ranked results and
//! a recent-selection history.
//!
//! Typing schedules a search after a quiet period; every keystroke cancels
//! the pending timer and bumps a request id. Requests already sent are left
//! to finish, but only the latest id's results are published. Subscribers
//! observe a [`SearchView`] through a `watch` channel.
//!
//! ```rust,ignore
//! let search = GlobalSearch::new(data, &storage, &config.search);
//! let mut view = search.subscribe();
//!
//! search.handle_key(&KeyPress::ctrl("k"));
//! search.input("rah");
//! view.changed().await?;
//! ```

mod ranking;
mod recent;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use ranking::rank;
pub use recent::{RecentSearch, RecentSearches};

use crate::PortalError;
use crate::config::SearchConfig;
use crate::data::{DataService, SearchHit};
use crate::storage::BrowserStorage;

/// What the search panel should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchView {
    Closed,
    /// Open with a short or empty query.
    Recent(Vec<RecentSearch>),
    Searching { query: String },
    /// Ranked hits for `query`; empty means "no results".
    Results { query: String, hits: Vec<SearchHit> },
}

/// A key event from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
}

impl KeyPress {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
        }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn meta(key: impl Into<String>) -> Self {
        Self {
            meta: true,
            ..Self::plain(key)
        }
    }
}

struct State {
    open: bool,
    query: String,
    latest_request: u64,
    pending: Option<JoinHandle<()>>,
}

struct Inner {
    data: Arc<DataService>,
    recent: RecentSearches,
    config: SearchConfig,
    state: Mutex<State>,
    view: watch::Sender<SearchView>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>, request_id: u64, query: String) {
        let result = self.data.search_global(&query).await;

        let state = self.lock_state();
        if state.latest_request != request_id || !state.open {
            log::debug!(
                target: "campusgate",
                "msg=\"discarding stale search results\", request_id={request_id}, latest={}",
                state.latest_request
            );
            return;
        }

        let hits = rank(&query, result.data.unwrap_or_default());
        log::debug!(
            target: "campusgate",
            "msg=\"search results\", request_id={request_id}, hits={}, mock={}",
            hits.len(),
            result.is_mock
        );
        self.view.send_replace(SearchView::Results { query, hits });
    }
}

/// The search panel's controller. One per page.
pub struct GlobalSearch {
    inner: Arc<Inner>,
}

impl GlobalSearch {
    pub fn new(data: Arc<DataService>, storage: &BrowserStorage, config: &SearchConfig) -> Self {
        let (view, _) = watch::channel(SearchView::Closed);
        Self {
            inner: Arc::new(Inner {
                data,
                recent: RecentSearches::new(Arc::clone(&storage.tab), config.recent_capacity),
                config: config.clone(),
                state: Mutex::new(State {
                    open: false,
                    query: String::new(),
                    latest_request: 0,
                    pending: None,
                }),
                view,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.view.subscribe()
    }

    pub fn view(&self) -> SearchView {
        self.inner.view.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock_state().open
    }

    pub fn query(&self) -> String {
        self.inner.lock_state().query.clone()
    }

    /// Ctrl+K or Cmd+K opens the panel; Escape closes it. Returns `true`
    /// when the key was consumed and the page's default action should be
    /// suppressed.
    pub fn handle_key(&self, key: &KeyPress) -> bool {
        if (key.ctrl || key.meta) && key.key.eq_ignore_ascii_case("k") {
            self.open();
            return true;
        }

        if key.key == "Escape" && self.is_open() {
            self.close();
            return true;
        }

        false
    }

    pub fn open(&self) {
        let mut state = self.inner.lock_state();
        state.open = true;
        if self.is_short(&state.query) {
            self.inner.view.send_replace(SearchView::Recent(self.inner.recent.list()));
        }
    }

    /// Hides the panel, clears the input and drops any pending or in-flight
    /// search.
    pub fn close(&self) {
        let mut state = self.inner.lock_state();
        state.open = false;
        state.query.clear();
        state.latest_request += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        self.inner.view.send_replace(SearchView::Closed);
    }

    /// Handles the input field changing to `query`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&self, query: &str) {
        let mut state = self.inner.lock_state();
        state.open = true;
        state.query = query.to_owned();
        state.latest_request += 1;
        let request_id = state.latest_request;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        if self.is_short(query) {
            self.inner.view.send_replace(SearchView::Recent(self.inner.recent.list()));
            return;
        }

        let query = query.trim().to_owned();
        self.inner.view.send_replace(SearchView::Searching {
            query: query.clone(),
        });

        let inner = Arc::clone(&self.inner);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            // detached so that a later keystroke cancels only the timer
            tokio::spawn(inner.run(request_id, query));
        }));
    }

    /// Records `hit` in the recent list, closes the panel and returns the
    /// page to navigate to.
    pub fn select(&self, hit: &SearchHit) -> Result<String, PortalError> {
        self.inner.recent.record(RecentSearch::from(hit))?;
        self.close();

        log::info!(
            target: "campusgate",
            "msg=\"search result selected\", kind={:?}, id=\"{}\"",
            hit.kind,
            hit.id
        );
        Ok(hit.url.clone())
    }

    pub fn recent(&self) -> Vec<RecentSearch> {
        self.inner.recent.list()
    }

    pub fn clear_recent(&self) -> Result<(), PortalError> {
        self.inner.recent.clear()?;
        let state = self.inner.lock_state();
        if state.open && self.is_short(&state.query) {
            self.inner.view.send_replace(SearchView::Recent(Vec::new()));
        }
        Ok(())
    }

    fn is_short(&self, query: &str) -> bool {
        query.trim().chars().count() < self.inner.config.min_query_len
    }
}

impl Drop for GlobalSearch {
    fn drop(&mut self) {
        if let Some(pending) = self.inner.lock_state().pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::backend::{MockTableClient, tables};
    use crate::config::BackendConfig;
    use crate::data::SearchKind;
    use crate::events::EventRegistry;
    use crate::testing::ManualClock;

    struct Fixture {
        search: GlobalSearch,
        client: Arc<MockTableClient>,
        storage: BrowserStorage,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(
            MockTableClient::new()
                .with_rows(
                    tables::STUDENTS,
                    vec![
                        json!({"id": 1, "name": "Abhay Rao", "class": "7C", "roll_number": 3}),
                        json!({"id": 2, "name": "Kabir Abcde", "class": "9A", "roll_number": 11}),
                    ],
                )
                .with_rows(
                    tables::TEACHERS,
                    vec![json!({"id": "T1", "name": "Mr. Abc Teacher", "department": "Music"})],
                ),
        );
        let data = Arc::new(DataService::new(
            &BackendConfig::new("https://abc.supabase.co", "anon-key"),
            client.clone(),
            Arc::new(EventRegistry::new()),
            Arc::new(ManualClock::default()),
        ));
        let storage = BrowserStorage::in_memory();
        let search = GlobalSearch::new(data, &storage, &SearchConfig::default());

        Fixture {
            search,
            client,
            storage,
        }
    }

    fn select_calls(client: &MockTableClient) -> Vec<(String, String)> {
        client
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                crate::backend::RecordedCall::Select(q) => Some((q.table, q.filters[0].value.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_shortcuts() {
        let f = fixture();

        assert!(!f.search.handle_key(&KeyPress::plain("k")));
        assert!(!f.search.handle_key(&KeyPress::plain("Escape")));

        assert!(f.search.handle_key(&KeyPress::ctrl("k")));
        assert!(f.search.is_open());
        assert_eq!(f.search.view(), SearchView::Recent(Vec::new()));

        assert!(f.search.handle_key(&KeyPress::plain("Escape")));
        assert!(!f.search.is_open());
        assert_eq!(f.search.view(), SearchView::Closed);

        assert!(f.search.handle_key(&KeyPress::meta("K")));
        assert!(f.search.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_sends_only_last_query() {
        let f = fixture();
        let mut view = f.search.subscribe();

        f.search.input("a");
        tokio::time::sleep(Duration::from_millis(100)).await;
        f.search.input("ab");
        tokio::time::sleep(Duration::from_millis(100)).await;
        f.search.input("abc");

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(f.client.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        while !matches!(*view.borrow_and_update(), SearchView::Results { .. }) {
            view.changed().await.unwrap();
        }

        assert_eq!(
            select_calls(&f.client),
            vec![
                ("students".to_owned(), "%abc%".to_owned()),
                ("teachers".to_owned(), "%abc%".to_owned()),
            ]
        );

        let SearchView::Results { query, hits } = f.search.view() else {
            panic!("expected results");
        };
        assert_eq!(query, "abc");
        let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Kabir Abcde", "Mr. Abc Teacher"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let f = fixture();
        f.client.set_latency(tables::STUDENTS, Duration::from_millis(1_000));

        f.search.input("abh");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(f.client.calls().len(), 2);

        // the first request is in flight; a newer one supersedes it
        f.client.set_latency(tables::STUDENTS, Duration::from_millis(0));
        f.search.input("kab");
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        let SearchView::Results { query, hits } = f.search.view() else {
            panic!("expected results");
        };
        assert_eq!(query, "kab");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Kabir Abcde");
        assert_eq!(f.client.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_shows_recent() {
        let f = fixture();
        let hit = SearchHit {
            id: "S001".to_owned(),
            kind: SearchKind::Student,
            name: "Rishu Kumar".to_owned(),
            description: "12th Science".to_owned(),
            url: "../4 P-S_View/index.html".to_owned(),
        };

        let url = f.search.select(&hit).unwrap();
        assert_eq!(url, "../4 P-S_View/index.html");
        assert!(!f.search.is_open());

        f.search.input("r");
        let SearchView::Recent(recent) = f.search.view() else {
            panic!("expected recent list");
        };
        assert_eq!(recent[0].id, "S001");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(f.client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_clears_input_and_drops_pending() {
        let f = fixture();

        f.search.input("abc");
        assert!(f.search.handle_key(&KeyPress::plain("Escape")));
        assert_eq!(f.search.query(), "");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(f.client.calls().is_empty());
        assert_eq!(f.search.view(), SearchView::Closed);
    }

    #[tokio::test]
    async fn test_clear_recent() {
        let f = fixture();
        let hit = SearchHit {
            id: "P001".to_owned(),
            kind: SearchKind::Page,
            name: "Dashboard".to_owned(),
            description: "Go to Dashboard".to_owned(),
            url: "../index.html".to_owned(),
        };
        f.search.select(&hit).unwrap();
        f.search.open();

        f.search.clear_recent().unwrap();

        assert!(f.search.recent().is_empty());
        assert_eq!(f.search.view(), SearchView::Recent(Vec::new()));
        assert_eq!(f.storage.tab.get(crate::storage::keys::RECENT_SEARCHES).unwrap(), None);
    }
}
