// src/question_store.rs
use log::{info, warn};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::error::LogSink;
use crate::loader::{self, LoadOptions};
use crate::record::{Category, Record, RecordId};

/// One complete, immutable view of the loaded questions.
///
/// Every id listed under a category is present in `by_id` and every record in
/// `by_id` is listed under exactly its own category.
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    by_id: HashMap<RecordId, Arc<Record>>,
    by_category: BTreeMap<Category, Vec<RecordId>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() || self.by_category.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.by_category.len()
    }

    pub fn get(&self, id: &RecordId) -> Option<Arc<Record>> {
        self.by_id.get(id).cloned()
    }

    /// Alphabetical.
    pub fn categories(&self) -> Vec<Category> {
        self.by_category.keys().cloned().collect()
    }

    pub fn ids_in(&self, category: &Category) -> &[RecordId] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Picks uniformly among all ids in the allowed categories, so a category
    /// holding more questions is proportionally more likely to be drawn.
    ///
    /// An empty `allowed` list means every category. Unknown categories are
    /// ignored and repeats count once.
    pub fn random_id<R: Rng + ?Sized>(
        &self,
        allowed: &[Category],
        rng: &mut R,
    ) -> Option<RecordId> {
        let pools: Vec<&[RecordId]> = if allowed.is_empty() {
            self.by_category.values().map(Vec::as_slice).collect()
        } else {
            allowed
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter_map(|c| self.by_category.get(c).map(Vec::as_slice))
                .collect()
        };

        let total: usize = pools.iter().map(|ids| ids.len()).sum();
        if total == 0 {
            return None;
        }

        let mut index = rng.random_range(0..total);
        for ids in pools {
            if index < ids.len() {
                return Some(ids[index].clone());
            }
            index -= ids.len();
        }

        None
    }

    /// Records grouped by category (alphabetical), then in index order.
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.by_category
            .values()
            .flatten()
            .filter_map(|id| self.by_id.get(id).map(Arc::as_ref))
    }
}

/// Accumulates records during a load pass. Consumed by [`SnapshotBuilder::build`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    by_id: HashMap<RecordId, Arc<Record>>,
    by_category: BTreeMap<Category, Vec<RecordId>>,
}

impl SnapshotBuilder {
    /// Returns the id of the inserted record, or `Err(id)` when an identical
    /// record was already added in this pass.
    pub fn insert(&mut self, record: Record) -> Result<RecordId, RecordId> {
        let id = record.id();
        if self.by_id.contains_key(&id) {
            return Err(id);
        }

        self.by_category
            .entry(record.category.clone())
            .or_default()
            .push(id.clone());
        self.by_id.insert(id.clone(), Arc::new(record));
        Ok(id)
    }

    pub fn build(mut self) -> Snapshot {
        for ids in self.by_category.values_mut() {
            ids.sort();
        }

        Snapshot {
            generation: 0,
            by_id: self.by_id,
            by_category: self.by_category,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReloadSummary {
    pub records: usize,
    pub categories: usize,
    pub diagnostics: usize,
    pub generation: u64,
    pub elapsed: Duration,
}

/// Holds the current snapshot and swaps in new ones.
///
/// Readers only hold the read lock long enough to clone the `Arc`; reloads
/// build off to the side and take the write lock for the swap alone.
pub struct QuestionStore {
    options: LoadOptions,
    current: RwLock<Arc<Snapshot>>,
    // Serialises builds so an older build is never published over a newer one.
    build_lock: Mutex<()>,
}

impl QuestionStore {
    pub fn new(options: LoadOptions) -> Self {
        info!("Initializing QuestionStore with {} path(s)", options.paths().len());
        let store = QuestionStore::empty(options);

        info!("Performing initial load of questions from disk...");
        store.reload();
        store
    }

    /// A store that answers every query with "nothing loaded" until reloaded.
    pub fn empty(options: LoadOptions) -> Self {
        QuestionStore {
            options,
            current: RwLock::new(Arc::new(Snapshot::empty())),
            build_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn reload(&self) -> ReloadSummary {
        self.reload_with(&self.options)
    }

    /// Rebuilds from `options` and publishes the result.
    ///
    /// Queries that already captured a snapshot keep using it; every query
    /// started after this returns sees the new one.
    pub fn reload_with(&self, options: &LoadOptions) -> ReloadSummary {
        let _building = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();

        let mut sink = LogSink::default();
        let mut next = loader::load(options, &mut sink);
        next.generation = self.snapshot().generation + 1;

        if next.is_empty() {
            warn!("No supported files found.");
        }

        let summary = ReloadSummary {
            records: next.len(),
            categories: next.category_count(),
            diagnostics: sink.reported,
            generation: next.generation,
            elapsed: started.elapsed(),
        };

        self.publish(next);

        info!(
            "Loaded {} questions across {} categories in {:?} ({} skipped entries)",
            summary.records, summary.categories, summary.elapsed, summary.diagnostics
        );
        summary
    }

    fn publish(&self, next: Snapshot) {
        let next = Arc::new(next);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = next;
    }

    /// The currently published snapshot. Hold on to it to answer several
    /// queries against one consistent view.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn random_id(&self, allowed: &[Category]) -> Option<RecordId> {
        self.snapshot().random_id(allowed, &mut rand::rng())
    }

    pub fn get(&self, id: &RecordId) -> Option<Arc<Record>> {
        self.snapshot().get(id)
    }

    pub fn list_categories(&self) -> Vec<Category> {
        self.snapshot().categories()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn snapshot_of(lines: &[(&str, &str, &str)]) -> Snapshot {
        let mut builder = SnapshotBuilder::default();
        for (q, a, c) in lines {
            let _ = builder.insert(Record::new(*q, *a, Category::from(*c)));
        }
        builder.build()
    }

    #[test]
    fn builder_drops_duplicates() {
        let mut builder = SnapshotBuilder::default();
        let first = builder.insert(Record::new("Q", "A", Category::from("C")));
        let second = builder.insert(Record::new("Q", "A", Category::from("C")));

        assert!(first.is_ok());
        assert_eq!(second, Err(first.unwrap()));
        let snapshot = builder.build();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.ids_in(&Category::from("C")).len(), 1);
    }

    #[test]
    fn category_ids_are_sorted() {
        let snapshot = snapshot_of(&[("a", "1", "X"), ("b", "2", "X"), ("c", "3", "X"), ("d", "4", "X")]);
        let ids = snapshot.ids_in(&Category::from("X"));
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn random_id_on_empty_snapshot_is_none() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Snapshot::empty().random_id(&[], &mut rng), None);
        assert_eq!(Snapshot::empty().random_id(&[Category::from("X")], &mut rng), None);
    }

    #[test]
    fn random_id_respects_allowed_categories() {
        let snapshot = snapshot_of(&[("a", "1", "X"), ("b", "2", "Y"), ("c", "3", "Y")]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let id = snapshot.random_id(&[Category::from("X")], &mut rng).unwrap();
            assert_eq!(snapshot.get(&id).unwrap().category.as_str(), "X");
        }

        assert_eq!(snapshot.random_id(&[Category::from("Nope")], &mut rng), None);
    }

    #[test]
    fn repeated_categories_do_not_skew_selection() {
        let snapshot = snapshot_of(&[("a", "1", "X"), ("b", "2", "Y")]);
        let mut rng = StdRng::seed_from_u64(3);
        let allowed = [Category::from("X"), Category::from("X"), Category::from("X"), Category::from("Y")];

        let hits = (0..4000)
            .filter(|_| {
                let id = snapshot.random_id(&allowed, &mut rng).unwrap();
                snapshot.get(&id).unwrap().category.as_str() == "X"
            })
            .count();

        assert!((1700..2300).contains(&hits), "X drawn {} times", hits);
    }

    #[test]
    fn records_follow_category_order() {
        let snapshot = snapshot_of(&[("q1", "a", "Zoology"), ("q2", "a", "Art")]);
        let categories: Vec<&str> = snapshot.records().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Art", "Zoology"]);
    }

    #[test]
    fn empty_store_answers_with_sentinels() {
        let options = LoadOptions::new(vec![PathBuf::from("/does/not/exist")]).unwrap();
        let store = QuestionStore::empty(options);

        assert_eq!(store.random_id(&[]), None);
        assert!(store.get(&RecordId::from(RecordId::NIL)).is_none());
        assert!(store.list_categories().is_empty());
    }

    #[test]
    fn reload_of_missing_path_yields_empty_snapshot() {
        let options = LoadOptions::new(vec![PathBuf::from("/does/not/exist")]).unwrap();
        let store = QuestionStore::empty(options);

        let summary = store.reload();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.categories, 0);
        assert_eq!(summary.diagnostics, 1);
        assert_eq!(summary.generation, 1);
        assert!(store.snapshot().is_empty());
    }
}
