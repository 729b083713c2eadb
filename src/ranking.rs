//! Canonical ranking of one artist snapshot.
//!
//! Records are stored once, in fetch order, and never move. Canonical order is
//! a list of handles (storage indices) sorted descending by the active metric.
//! Views over the collection hold handles too, so a record's `rank` is always
//! the one the canonical order assigned.

use rustc_hash::FxHashMap;

use crate::error::EngineError;
use crate::models::{Metric, StreamRecord};

/// Index of a record in a collection's storage.
pub type RecordHandle = usize;

/// Stable descending sort of `handles` by `metric`.
///
/// Equal keys keep their current relative order, so sorting an already
/// sorted slice never reshuffles ties.
pub fn sort_handles(handles: &mut [RecordHandle], records: &[StreamRecord], metric: Metric) {
    handles.sort_by(|&a, &b| metric.value(&records[b]).cmp(&metric.value(&records[a])));
}

// ============================================================================
// Ranked Collection
// ============================================================================

#[derive(Debug, Clone)]
pub struct RankedCollection {
    records: Vec<StreamRecord>,
    order: Vec<RecordHandle>,
    index: FxHashMap<String, RecordHandle>,
    metric: Metric,
}

impl RankedCollection {
    /// Sort `records` by `metric` and assign ranks 1..N.
    ///
    /// Ties keep fetch order. A repeated `music_id` keeps its first occurrence.
    /// An empty input is a valid collection with no ranks.
    pub fn initialize(records: Vec<StreamRecord>, metric: Metric) -> Self {
        let mut index = FxHashMap::default();
        let mut storage = Vec::with_capacity(records.len());

        for record in records {
            if index.contains_key(&record.music_id) {
                log::warn!("[ranking] dropping duplicate record id {}", record.music_id);
                continue;
            }
            index.insert(record.music_id.clone(), storage.len());
            storage.push(record);
        }

        let mut collection = Self {
            order: (0..storage.len()).collect(),
            records: storage,
            index,
            metric,
        };
        collection.sort_and_rank();
        collection
    }

    /// Same as `initialize`, for callers whose policy rejects an empty result.
    pub fn initialize_non_empty(
        records: Vec<StreamRecord>,
        metric: Metric,
        artist: &str,
    ) -> Result<Self, EngineError> {
        if records.is_empty() {
            return Err(EngineError::EmptyInput {
                artist: artist.to_string(),
            });
        }
        Ok(Self::initialize(records, metric))
    }

    /// Re-sort by `metric` and reassign ranks. Returns false, leaving order and
    /// ranks untouched, when `metric` is already active.
    pub fn reorder(&mut self, metric: Metric) -> bool {
        if metric == self.metric {
            return false;
        }
        self.metric = metric;
        self.sort_and_rank();
        true
    }

    fn sort_and_rank(&mut self) {
        sort_handles(&mut self.order, &self.records, self.metric);
        for (position, &handle) in self.order.iter().enumerate() {
            self.records[handle].rank = position as u32 + 1;
        }
    }

    /// Read-only view of the canonical order.
    pub fn snapshot(&self) -> RecordView<'_> {
        RecordView::new(&self.records, &self.order)
    }

    /// View of an arbitrary handle list over this collection's storage.
    pub fn view<'a>(&'a self, handles: &'a [RecordHandle]) -> RecordView<'a> {
        RecordView::new(&self.records, handles)
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, music_id: &str) -> Option<&StreamRecord> {
        self.index.get(music_id).map(|&h| &self.records[h])
    }

    pub fn record(&self, handle: RecordHandle) -> &StreamRecord {
        &self.records[handle]
    }

    pub fn records(&self) -> &[StreamRecord] {
        &self.records
    }

    pub fn order(&self) -> &[RecordHandle] {
        &self.order
    }

    /// True when ranks follow canonical position exactly (1..N, no gaps).
    pub fn ranks_are_dense(&self) -> bool {
        self.order
            .iter()
            .enumerate()
            .all(|(position, &h)| self.records[h].rank as usize == position + 1)
    }
}

// ============================================================================
// Record View
// ============================================================================

/// Borrowed, ordered list of records from one collection.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    records: &'a [StreamRecord],
    handles: &'a [RecordHandle],
}

impl<'a> RecordView<'a> {
    fn new(records: &'a [StreamRecord], handles: &'a [RecordHandle]) -> Self {
        Self { records, handles }
    }

    /// View over nothing, for the state before any snapshot is loaded.
    pub fn empty() -> Self {
        Self {
            records: &[],
            handles: &[],
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&'a StreamRecord> {
        self.handles.get(position).map(|&h| &self.records[h])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a StreamRecord> + 'a {
        let (records, handles) = (self.records, self.handles);
        handles.iter().map(move |&h| &records[h])
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.iter().map(|r| r.music_id.as_str()).collect()
    }

    pub fn ranks(&self) -> Vec<u32> {
        self.iter().map(|r| r.rank).collect()
    }

    pub fn to_vec(&self) -> Vec<StreamRecord> {
        self.iter().cloned().collect()
    }
}

impl PartialEq for RecordView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

// ============================================================================
// TESTS
// ============================================================================
