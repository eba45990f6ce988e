//! Value suggestions for data entry.
//!
//! The engine mines the store for the projects, formats and data types in
//! use, canonicalizes them, counts them and answers prefix queries from an
//! immutable snapshot. A refresh builds a whole new snapshot and swaps it in;
//! queries during a refresh keep reading the previous one.

mod canonical;

pub use canonical::{canonicalize, SuggestField};

use crate::cancel::CancellationToken;
use crate::error::{CatalogError, Result};
use crate::record::Record;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Lifecycle of the suggestion snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// No snapshot has been built yet.
    Empty,
    /// A refresh is running.
    Loading,
    /// A snapshot is available and no refresh is running.
    Ready,
}

/// Canonical values and how often each occurs, per field.
#[derive(Debug, Clone, Default)]
pub struct SuggestionCache {
    counts: HashMap<SuggestField, HashMap<String, usize>>,
}

impl SuggestionCache {
    /// Count every value of every record.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut cache = Self::default();
        for record in records {
            cache.add(record);
        }
        cache
    }

    pub fn add(&mut self, record: &Record) {
        let values = [
            (SuggestField::Project, record.used_in_projects.iter().collect::<Vec<_>>()),
            (SuggestField::Type, record.data_types.iter().collect()),
            (SuggestField::Format, vec![&record.file_format]),
        ];

        for (field, raw_values) in values {
            for raw in raw_values {
                if raw.trim().is_empty() {
                    continue;
                }
                let value = canonicalize(field, raw);
                *self.counts.entry(field).or_default().entry(value).or_insert(0) += 1;
            }
        }
    }

    /// Occurrences of `value` (in canonical form) for `field`.
    pub fn count(&self, field: SuggestField, value: &str) -> usize {
        self.counts
            .get(&field)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(0)
    }

    /// Ranked suggestions for `prefix`.
    ///
    /// Values starting with `prefix` come first, then values containing it
    /// elsewhere; each group is ordered by descending frequency, then by
    /// value. An empty prefix lists every value by frequency. Matching is
    /// case-insensitive.
    pub fn suggest(&self, field: SuggestField, prefix: &str, limit: usize) -> Vec<String> {
        let Some(values) = self.counts.get(&field) else {
            return Vec::new();
        };
        let needle = prefix.trim().to_lowercase();

        let mut ranked: Vec<(u8, usize, &str)> = values
            .iter()
            .filter_map(|(value, &count)| {
                let folded = value.to_lowercase();
                let group = if folded.starts_with(&needle) {
                    0
                } else if folded.contains(&needle) {
                    1
                } else {
                    return None;
                };
                Some((group, count, value.as_str()))
            })
            .collect();

        ranked.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(b.2)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, value)| value.to_string())
            .collect()
    }
}

/// Wake-ups shared between the engine and its refresh loop.
#[derive(Default)]
struct LoopSignals {
    refresh: Notify,
    shutdown: Notify,
    stopped: CancellationToken,
}

/// Owns the suggestion snapshot and its refresh lifecycle.
///
/// Create one per catalog, call [`init`](Self::init) to start periodic
/// refreshes and [`shutdown`](Self::shutdown) to stop them.
pub struct AutocompleteEngine {
    store: Arc<RecordStore>,
    snapshot: RwLock<Option<Arc<SuggestionCache>>>,
    phase: RwLock<EnginePhase>,
    refresh_lock: Mutex<()>,
    interval: Duration,
    signals: Arc<LoopSignals>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AutocompleteEngine {
    pub fn new(store: Arc<RecordStore>, interval: Duration) -> Self {
        Self {
            store,
            snapshot: RwLock::new(None),
            phase: RwLock::new(EnginePhase::Empty),
            refresh_lock: Mutex::new(()),
            interval,
            signals: Arc::new(LoopSignals::default()),
            task: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        *self.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: EnginePhase) {
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    /// The current snapshot, if one has been built.
    pub fn snapshot(&self) -> Option<Arc<SuggestionCache>> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Suggestions for `field` from the latest snapshot. Never blocks on a
    /// running refresh; before the first refresh the answer is empty.
    pub fn suggest(&self, field: SuggestField, prefix: &str, limit: usize) -> Vec<String> {
        match self.snapshot() {
            Some(cache) => cache.suggest(field, prefix, limit),
            None => Vec::new(),
        }
    }

    /// Rebuild the snapshot from the store now.
    ///
    /// Concurrent calls run one after the other. On failure the previous
    /// snapshot stays in place.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().map_err(|_| CatalogError::Store {
            message: "Failed to acquire autocomplete refresh lock".to_string(),
            source: None,
        })?;

        let start = Instant::now();
        self.set_phase(EnginePhase::Loading);

        match self.build_cache() {
            Ok(cache) => {
                *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(cache));
                self.set_phase(EnginePhase::Ready);
                info!(
                    "Refreshed autocomplete suggestions in {:.2}ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
                Ok(())
            }
            Err(e) => {
                let fallback = if self.snapshot().is_some() {
                    EnginePhase::Ready
                } else {
                    EnginePhase::Empty
                };
                self.set_phase(fallback);
                Err(e)
            }
        }
    }

    fn build_cache(&self) -> Result<SuggestionCache> {
        let mut cache = SuggestionCache::default();
        for item in self.store.list_all() {
            match item {
                Ok(record) => cache.add(&record),
                Err(e @ (CatalogError::Validation { .. } | CatalogError::Json { .. })) => {
                    warn!("Skipping unreadable dataset in autocomplete refresh: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(cache)
    }

    /// Ask the refresh loop to rebuild soon. Does nothing before `init`.
    pub fn request_refresh(&self) {
        self.signals.refresh.notify_one();
    }

    /// Start the background refresh loop on the current tokio runtime.
    ///
    /// The loop refreshes every `interval` and whenever a refresh is
    /// requested. Calling `init` again while the loop runs does nothing.
    pub fn init(self: &Arc<Self>) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return;
        }

        let weak = Arc::downgrade(self);
        let signals = Arc::clone(&self.signals);
        let interval = self.interval;
        *task = Some(tokio::spawn(refresh_loop(weak, signals, interval)));
        debug!("Started autocomplete refresh loop ({:?} interval)", interval);
    }

    /// Stop the refresh loop and wait for it to exit.
    pub async fn shutdown(&self) {
        self.signals.stopped.cancel();
        self.signals.shutdown.notify_one();

        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Autocomplete refresh loop ended abnormally: {}", e);
            }
            debug!("Stopped autocomplete refresh loop");
        }
    }
}

impl Drop for AutocompleteEngine {
    fn drop(&mut self) {
        self.signals.stopped.cancel();
        self.signals.shutdown.notify_one();
    }
}

async fn refresh_loop(engine: Weak<AutocompleteEngine>, signals: Arc<LoopSignals>, interval: Duration) {
    // The engine refreshes once on startup, so the first tick is one interval out.
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = signals.refresh.notified() => {}
            _ = signals.shutdown.notified() => {}
        }

        if signals.stopped.is_cancelled() {
            break;
        }
        let Some(engine) = engine.upgrade() else {
            break;
        };

        match tokio::task::spawn_blocking(move || engine.refresh()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Autocomplete refresh failed: {}", e),
            Err(e) => error!("Autocomplete refresh task panicked: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldWeights;
    use crate::db::CatalogDb;
    use crate::index::SearchIndex;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(projects: &[&str], types: &[&str], format: &str) -> Record {
        Record::draft("n", "d", "s", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_projects(projects.iter().copied())
            .with_data_types(types.iter().copied())
            .with_file_format(format)
    }

    fn create_test_engine() -> (Arc<AutocompleteEngine>, Arc<RecordStore>, TempDir) {
        let temp = TempDir::new().unwrap();
        let db = Arc::new(CatalogDb::open(temp.path()).unwrap());
        let index = Arc::new(SearchIndex::new(db, FieldWeights::default()));
        let store = Arc::new(RecordStore::new(index));
        let engine = Arc::new(AutocompleteEngine::new(
            Arc::clone(&store),
            Duration::from_secs(3600),
        ));
        (engine, store, temp)
    }

    #[test]
    fn test_prefix_matches_before_substring_matches() {
        let records = vec![
            record(&["healthcare-climate"], &[], ""),
            record(&["healthcare-climate"], &[], ""),
            record(&["healthcare-climate"], &[], ""),
            record(&["climate-ml"], &[], ""),
            record(&["climate-analysis", "climate-ml"], &[], ""),
        ];
        let cache = SuggestionCache::from_records(&records);

        assert_eq!(
            cache.suggest(SuggestField::Project, "clim", 10),
            vec!["climate-ml", "climate-analysis", "healthcare-climate"]
        );
        assert_eq!(cache.suggest(SuggestField::Project, "CLIM", 2).len(), 2);
    }

    #[test]
    fn test_empty_prefix_lists_by_frequency_then_value() {
        let records = vec![
            record(&["b", "a"], &[], ""),
            record(&["c"], &[], ""),
            record(&["c"], &[], ""),
        ];
        let cache = SuggestionCache::from_records(&records);
        assert_eq!(cache.suggest(SuggestField::Project, "", 10), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_values_are_canonicalized_and_counted() {
        let records = vec![
            record(&[], &["timeseries", "Time Series"], "csv"),
            record(&[], &["time_series"], "CSV"),
            record(&[], &["audio"], ""),
        ];
        let cache = SuggestionCache::from_records(&records);

        assert_eq!(cache.count(SuggestField::Type, "time-series"), 3);
        assert_eq!(cache.count(SuggestField::Format, "CSV"), 2);
        assert_eq!(cache.count(SuggestField::Type, "audio"), 1);
        assert_eq!(cache.suggest(SuggestField::Format, "", 10), vec!["CSV"]);
        assert!(cache.suggest(SuggestField::Type, "zzz", 10).is_empty());
    }

    #[test]
    fn test_engine_lifecycle() {
        let (engine, store, _temp) = create_test_engine();
        assert_eq!(engine.phase(), EnginePhase::Empty);
        assert!(engine.suggest(SuggestField::Project, "", 10).is_empty());

        store.put("a", &record(&["Gideon"], &[], "")).unwrap();
        engine.refresh().unwrap();
        assert_eq!(engine.phase(), EnginePhase::Ready);
        assert_eq!(engine.suggest(SuggestField::Project, "gid", 10), vec!["Gideon"]);

        // Counters start over on every refresh.
        store.put("b", &record(&["Gideon"], &[], "")).unwrap();
        engine.refresh().unwrap();
        engine.refresh().unwrap();
        let cache = engine.snapshot().unwrap();
        assert_eq!(cache.count(SuggestField::Project, "Gideon"), 2);
    }

    #[test]
    fn test_snapshot_survives_until_next_refresh() {
        let (engine, store, _temp) = create_test_engine();
        store.put("a", &record(&["Alpha"], &[], "")).unwrap();
        engine.refresh().unwrap();

        store.delete("a").unwrap();
        assert_eq!(engine.suggest(SuggestField::Project, "", 10), vec!["Alpha"]);

        engine.refresh().unwrap();
        assert!(engine.suggest(SuggestField::Project, "", 10).is_empty());
    }

    #[tokio::test]
    async fn test_refresh_loop_reacts_to_requests() {
        let (engine, store, _temp) = create_test_engine();
        engine.refresh().unwrap();
        engine.init();

        store.put("a", &record(&["Gideon"], &[], "")).unwrap();
        engine.request_refresh();

        let deadline = Instant::now() + Duration::from_secs(10);
        while engine.suggest(SuggestField::Project, "", 10).is_empty() {
            assert!(Instant::now() < deadline, "refresh loop never ran");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        engine.shutdown().await;
        assert_eq!(engine.phase(), EnginePhase::Ready);
    }
}
