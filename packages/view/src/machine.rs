//! The per-dataset fetch/cache state machine.
//!
//! Slot transitions happen under a short-lived mutex that is never held
//! across an await. The fetch itself runs on a spawned task, so it always
//! settles the slot even when every caller waiting on it has gone away.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use quake_map_source::{EventSource, FetchError};
use tokio::sync::watch;

use crate::state::{DatasetView, ViewState, ViewStatus};
use crate::{Dataset, View, ViewError};

/// Fetch timeout used by [`ViewStateMachine::new`].
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

type Settled = Result<Arc<DatasetView>, Arc<FetchError>>;

enum Slot {
    NotFetched,
    Fetching {
        generation: u64,
        rx: watch::Receiver<Option<Settled>>,
    },
    Ready(Arc<DatasetView>),
    Failed(Arc<FetchError>),
}

enum Begin {
    Settled(Settled),
    Wait {
        generation: u64,
        rx: watch::Receiver<Option<Settled>>,
    },
}

struct Inner {
    source: Arc<dyn EventSource>,
    timeout: Option<Duration>,
    slots: Mutex<BTreeMap<Dataset, Slot>>,
    active_view: Mutex<View>,
    next_generation: AtomicU64,
}

/// Shared handle to the view state of every [`Dataset`].
///
/// Cloning is cheap; all clones observe and drive the same state.
#[derive(Clone)]
pub struct ViewStateMachine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ViewStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewStateMachine")
            .field("source", &self.inner.source.id())
            .field("timeout", &self.inner.timeout)
            .field("active_view", &self.active_view())
            .finish_non_exhaustive()
    }
}

impl ViewStateMachine {
    /// Creates a state machine over `source` with [`DEFAULT_FETCH_TIMEOUT`].
    #[must_use]
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self::with_timeout(source, Some(DEFAULT_FETCH_TIMEOUT))
    }

    /// Creates a state machine over `source`. A `None` timeout lets
    /// fetches run for as long as the source takes.
    #[must_use]
    pub fn with_timeout(source: Arc<dyn EventSource>, timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                timeout,
                slots: Mutex::new(BTreeMap::new()),
                active_view: Mutex::new(View::default()),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Identifier of the underlying event source.
    #[must_use]
    pub fn source_id(&self) -> &str {
        self.inner.source.id()
    }

    /// Returns the data for `dataset`, fetching it if nothing is cached.
    ///
    /// * `Ready` → the cached view, no fetch.
    /// * `Fetching` → waits for the in-flight fetch, no new fetch.
    /// * `NotFetched` → starts one fetch and waits for it.
    /// * `Failed` → the stored error, no retry. Use [`Self::refresh`].
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// * [`ViewError::Fetch`] if the fetch failed or timed out
    /// * [`ViewError::Abandoned`] if the fetch task died without settling
    pub async fn request(&self, dataset: Dataset) -> Result<Arc<DatasetView>, ViewError> {
        let (generation, mut rx) = match self.begin(dataset) {
            Begin::Settled(settled) => return settled.map_err(ViewError::Fetch),
            Begin::Wait { generation, rx } => (generation, rx),
        };

        let settled = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };

        match settled {
            Some(Ok(view)) => Ok(view),
            Some(Err(err)) => Err(ViewError::Fetch(err)),
            None => {
                self.inner.abandon(dataset, generation);
                Err(ViewError::Abandoned { dataset })
            }
        }
    }

    /// Makes `view` the active view and requests its dataset.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn switch_view(&self, view: View) -> Result<Arc<DatasetView>, ViewError> {
        {
            let mut active = self
                .inner
                .active_view
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *active != view {
                log::info!("Switching view {} -> {view}", *active);
            }
            *active = view;
        }
        self.request(view.dataset()).await
    }

    /// The most recently selected view.
    #[must_use]
    pub fn active_view(&self) -> View {
        *self
            .inner
            .active_view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-arms a `Ready` or `Failed` dataset to `NotFetched`.
    ///
    /// Returns `false` (and changes nothing) while the dataset is
    /// `Fetching` or already `NotFetched`.
    pub fn invalidate(&self, dataset: Dataset) -> bool {
        let mut slots = self.inner.lock_slots();
        match slots.get(&dataset) {
            Some(Slot::Ready(_) | Slot::Failed(_)) => {
                slots.insert(dataset, Slot::NotFetched);
                log::info!("Invalidated {dataset} dataset");
                true
            }
            Some(Slot::Fetching { .. }) => {
                log::debug!("Not invalidating {dataset} dataset: fetch in flight");
                false
            }
            Some(Slot::NotFetched) | None => false,
        }
    }

    /// Invalidates `dataset` and requests it again.
    ///
    /// While a fetch is already in flight this joins it instead of
    /// starting another.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn refresh(&self, dataset: Dataset) -> Result<Arc<DatasetView>, ViewError> {
        self.invalidate(dataset);
        self.request(dataset).await
    }

    /// Requests every dataset concurrently.
    pub async fn prefetch_all(&self) -> Vec<(Dataset, Result<Arc<DatasetView>, ViewError>)> {
        let results = join_all(Dataset::all().iter().map(|&dataset| self.request(dataset))).await;
        Dataset::all().iter().copied().zip(results).collect()
    }

    /// Snapshot of `dataset`'s current state.
    #[must_use]
    pub fn get_view_state(&self, dataset: Dataset) -> ViewState {
        let slots = self.inner.lock_slots();
        match slots.get(&dataset) {
            None | Some(Slot::NotFetched) => ViewState::new(dataset, ViewStatus::NotFetched),
            Some(Slot::Fetching { .. }) => ViewState::new(dataset, ViewStatus::Fetching),
            Some(Slot::Ready(view)) => ViewState {
                data: Some(Arc::clone(view)),
                ..ViewState::new(dataset, ViewStatus::Ready)
            },
            Some(Slot::Failed(err)) => ViewState {
                error: Some(err.to_string()),
                ..ViewState::new(dataset, ViewStatus::Failed)
            },
        }
    }

    fn begin(&self, dataset: Dataset) -> Begin {
        let mut slots = self.inner.lock_slots();

        match slots.get(&dataset) {
            Some(Slot::Ready(view)) => {
                log::debug!("Serving cached {dataset} dataset");
                return Begin::Settled(Ok(Arc::clone(view)));
            }
            Some(Slot::Failed(err)) => {
                log::debug!("Serving stored {dataset} failure");
                return Begin::Settled(Err(Arc::clone(err)));
            }
            Some(Slot::Fetching { generation, rx }) => {
                log::debug!("Joining in-flight {dataset} fetch (generation {generation})");
                return Begin::Wait {
                    generation: *generation,
                    rx: rx.clone(),
                };
            }
            Some(Slot::NotFetched) | None => {}
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        slots.insert(
            dataset,
            Slot::Fetching {
                generation,
                rx: rx.clone(),
            },
        );
        drop(slots);

        log::info!(
            "Fetching {dataset} dataset from {} (generation {generation})",
            self.inner.source.id()
        );

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let settled = inner.compute(dataset).await;
            inner.settle(dataset, generation, &settled);
            tx.send_replace(Some(settled));
        });

        Begin::Wait { generation, rx }
    }
}

impl Inner {
    fn lock_slots(&self) -> MutexGuard<'_, BTreeMap<Dataset, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn compute(&self, dataset: Dataset) -> Settled {
        let feed = dataset.feed();
        let fetch = self.source.fetch_events(feed);

        let result = match self.timeout {
            Some(after) => tokio::time::timeout(after, fetch)
                .await
                .unwrap_or(Err(FetchError::Timeout { feed, after })),
            None => fetch.await,
        };

        match result {
            Ok(events) => {
                let view = DatasetView::build(dataset, events, Utc::now());
                log::info!(
                    "{dataset} dataset ready: {} events, {} regions",
                    view.events.len(),
                    view.ranked.len()
                );
                Ok(Arc::new(view))
            }
            Err(err) => {
                log::warn!("{dataset} dataset failed: {err}");
                Err(Arc::new(err))
            }
        }
    }

    fn settle(&self, dataset: Dataset, generation: u64, settled: &Settled) {
        let mut slots = self.lock_slots();
        let current = matches!(
            slots.get(&dataset),
            Some(Slot::Fetching { generation: current, .. }) if *current == generation
        );
        if !current {
            log::debug!("Discarding stale {dataset} result (generation {generation})");
            return;
        }

        let slot = match settled {
            Ok(view) => Slot::Ready(Arc::clone(view)),
            Err(err) => Slot::Failed(Arc::clone(err)),
        };
        slots.insert(dataset, slot);
    }

    fn abandon(&self, dataset: Dataset, generation: u64) {
        let mut slots = self.lock_slots();
        if matches!(
            slots.get(&dataset),
            Some(Slot::Fetching { generation: current, .. }) if *current == generation
        ) {
            log::error!("{dataset} fetch (generation {generation}) abandoned; re-arming");
            slots.insert(dataset, Slot::NotFetched);
        }
    }
}

#[cfg(test)]
mod tests {
    use quake_map_event_models::{Event, Feed};
    use quake_map_source::memory::StaticSource;

    use super::*;

    fn realtime_events() -> Vec<Event> {
        vec![
            Event::new(Some("5km N of Reno, Nevada"), -119.8, 39.5, Some(4.2)),
            Event::new(Some("10km S of Reno, Nevada"), -119.7, 39.3, Some(5.1)),
            Event::new(Some("Tokyo, Japan"), 139.7, 35.7, Some(3.0)),
        ]
    }

    fn source() -> StaticSource {
        StaticSource::new()
            .with_events(Feed::Realtime, realtime_events())
            .with_events(
                Feed::HistoricalMonth,
                vec![Event::new(Some("Off the coast, Chile"), -72.0, -33.0, Some(6.1))],
            )
    }

    #[tokio::test]
    async fn starts_not_fetched() {
        let machine = ViewStateMachine::new(Arc::new(source()));
        for &dataset in Dataset::all() {
            let state = machine.get_view_state(dataset);
            assert_eq!(state.status, ViewStatus::NotFetched);
            assert!(state.data.is_none());
            assert!(state.error.is_none());
        }
        assert_eq!(machine.active_view(), View::Map);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_fetch() {
        let source = Arc::new(source().with_delay(Duration::from_millis(50)));
        let machine = ViewStateMachine::new(source.clone());

        let (a, b, c) = tokio::join!(
            machine.request(Dataset::Aggregated),
            machine.request(Dataset::Aggregated),
            machine.request(Dataset::Aggregated),
        );

        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(source.fetch_count(Feed::Realtime), 1);
        assert_eq!(
            machine.get_view_state(Dataset::Aggregated).status,
            ViewStatus::Ready
        );
    }

    #[tokio::test]
    async fn ready_dataset_is_reused() {
        let source = Arc::new(source());
        let machine = ViewStateMachine::new(source.clone());

        let first = machine.request(Dataset::Aggregated).await.unwrap();
        let second = machine.request(Dataset::Aggregated).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetch_count(Feed::Realtime), 1);
        assert_eq!(first.ranked[0].region_key, "Nevada");
    }

    #[tokio::test]
    async fn failure_is_terminal_until_refresh() {
        let source = Arc::new(StaticSource::new().with_failure(Feed::Realtime, "feed offline"));
        let machine = ViewStateMachine::new(source.clone());

        let err = machine.request(Dataset::Aggregated).await.unwrap_err();
        assert!(matches!(
            err.fetch_error(),
            Some(FetchError::Upstream { message }) if message == "feed offline"
        ));

        assert!(machine.request(Dataset::Aggregated).await.is_err());
        assert_eq!(source.fetch_count(Feed::Realtime), 1);

        let state = machine.get_view_state(Dataset::Aggregated);
        assert_eq!(state.status, ViewStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Upstream error: feed offline"));

        assert!(machine.refresh(Dataset::Aggregated).await.is_err());
        assert_eq!(source.fetch_count(Feed::Realtime), 2);
    }

    #[tokio::test]
    async fn failure_does_not_leak_into_other_datasets() {
        let source = Arc::new(
            StaticSource::new()
                .with_events(Feed::Realtime, realtime_events())
                .with_failure(Feed::HistoricalMonth, "archive unavailable"),
        );
        let machine = ViewStateMachine::new(source);

        let results = machine.prefetch_all().await;
        assert_eq!(results.len(), 3);
        for (dataset, result) in &results {
            match dataset {
                Dataset::HistoricalAggregated => assert!(result.is_err()),
                Dataset::Realtime | Dataset::Aggregated => assert!(result.is_ok()),
            }
        }

        assert_eq!(
            machine.get_view_state(Dataset::Aggregated).status,
            ViewStatus::Ready
        );
        assert_eq!(
            machine.get_view_state(Dataset::HistoricalAggregated).status,
            ViewStatus::Failed
        );
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let source = Arc::new(source().with_delay(Duration::from_millis(500)));
        let machine = ViewStateMachine::with_timeout(source, Some(Duration::from_millis(20)));

        let err = machine.request(Dataset::Realtime).await.unwrap_err();
        assert!(matches!(
            err.fetch_error(),
            Some(FetchError::Timeout { feed: Feed::Realtime, .. })
        ));
        assert_eq!(
            machine.get_view_state(Dataset::Realtime).status,
            ViewStatus::Failed
        );
    }

    #[tokio::test]
    async fn fetch_settles_after_caller_goes_away() {
        let source = Arc::new(source().with_delay(Duration::from_millis(30)));
        let machine = ViewStateMachine::new(source.clone());

        let waiter = {
            let machine = machine.clone();
            tokio::spawn(async move { machine.request(Dataset::Aggregated).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        waiter.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            machine.get_view_state(Dataset::Aggregated).status,
            ViewStatus::Ready
        );
        machine.request(Dataset::Aggregated).await.unwrap();
        assert_eq!(source.fetch_count(Feed::Realtime), 1);
    }

    #[tokio::test]
    async fn invalidate_is_ignored_while_fetching() {
        let source = Arc::new(source().with_delay(Duration::from_millis(30)));
        let machine = ViewStateMachine::new(source.clone());

        let pending = {
            let machine = machine.clone();
            tokio::spawn(async move { machine.request(Dataset::Realtime).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(
            machine.get_view_state(Dataset::Realtime).status,
            ViewStatus::Fetching
        );
        assert!(!machine.invalidate(Dataset::Realtime));
        assert!(machine.refresh(Dataset::Realtime).await.is_ok());
        assert!(pending.await.unwrap().is_ok());
        assert_eq!(source.fetch_count(Feed::Realtime), 1);

        assert!(machine.invalidate(Dataset::Realtime));
        assert!(!machine.invalidate(Dataset::Realtime));
        assert_eq!(
            machine.get_view_state(Dataset::Realtime).status,
            ViewStatus::NotFetched
        );
    }

    #[tokio::test]
    async fn switching_view_requests_bound_dataset() {
        let source = Arc::new(source());
        let machine = ViewStateMachine::new(source.clone());

        let view = machine.switch_view(View::Predictive).await.unwrap();
        assert_eq!(view.dataset, Dataset::HistoricalAggregated);
        assert_eq!(view.ranked[0].region_key, "Chile");
        assert_eq!(machine.active_view(), View::Predictive);
        assert_eq!(source.fetch_count(Feed::HistoricalMonth), 1);
        assert_eq!(source.fetch_count(Feed::Realtime), 0);
        assert_eq!(
            machine.get_view_state(Dataset::Aggregated).status,
            ViewStatus::NotFetched
        );

        machine.switch_view(View::Map).await.unwrap();
        machine.switch_view(View::Predictive).await.unwrap();
        assert_eq!(source.fetch_count(Feed::HistoricalMonth), 1);
    }
}
