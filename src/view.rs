//! Displayed list for one artist view.
//!
//! `ViewState` derives what the user sees from the canonical
//! [`RankedCollection`] and the current search term, and routes each intent
//! to the right target:
//!
//! - search changes touch only the displayed list,
//! - metric changes always re-rank the canonical order, then either re-sort
//!   the filtered subset in place or mirror the new canonical order,
//! - fetch completions replace the whole snapshot, gated by a generation
//!   counter so a slow, superseded fetch cannot overwrite a newer one.

use std::fmt;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{ArtistInfo, Metric, StreamSnapshot};
use crate::normalize::SearchQuery;
use crate::ranking::{sort_handles, RankedCollection, RecordHandle, RecordView};

/// What the presentation layer has to redraw after an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repaint {
    Nothing,
    /// Only the list rows (order, membership or ranks).
    Displayed,
    /// Header and list: a snapshot was loaded or discarded.
    Everything,
}

/// Proof that a fetch was started. Only the latest ticket can land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// User-facing notice for a fetch that produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub artist: String,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No stream data available for {}", self.artist)
    }
}

#[derive(Debug)]
pub struct ViewState {
    config: EngineConfig,
    metric: Metric,
    collection: Option<RankedCollection>,
    displayed: Vec<RecordHandle>,
    search_term: String,
    artist: Option<ArtistInfo>,
    date: Option<String>,
    generation: u64,
}

impl ViewState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            metric: config.default_metric,
            collection: None,
            displayed: Vec::new(),
            search_term: String::new(),
            artist: None,
            date: None,
            generation: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Fetch lifecycle
    // ------------------------------------------------------------------------

    /// Start a fetch. Any ticket handed out earlier becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    fn check_ticket(&self, ticket: FetchTicket) -> Result<(), EngineError> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            Err(EngineError::StaleFetchIgnored {
                generation: ticket.generation,
                latest: self.generation,
            })
        }
    }

    /// Replace the snapshot unconditionally, ranked by `metric`.
    ///
    /// Also supersedes every fetch still in flight.
    pub fn on_fetch_completed(
        &mut self,
        snapshot: StreamSnapshot,
        metric: Metric,
    ) -> Result<Repaint, EngineError> {
        self.generation += 1;
        self.apply_snapshot(snapshot, metric)
    }

    /// Land the result of the fetch behind `ticket`, ranked by the metric
    /// selected at the time it lands.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        snapshot: StreamSnapshot,
    ) -> Result<Repaint, EngineError> {
        self.check_ticket(ticket)?;
        self.apply_snapshot(snapshot, self.metric)
    }

    /// Record that the fetch behind `ticket` failed. The current snapshot, if
    /// any, stays on screen.
    pub fn fail_fetch(&self, ticket: FetchTicket, artist: &str) -> Result<FetchFailure, EngineError> {
        self.check_ticket(ticket)?;
        log::info!("[view] fetch for {} failed, keeping previous snapshot", artist);
        Ok(FetchFailure {
            artist: artist.to_string(),
        })
    }

    fn apply_snapshot(
        &mut self,
        snapshot: StreamSnapshot,
        metric: Metric,
    ) -> Result<Repaint, EngineError> {
        let StreamSnapshot {
            artist_info,
            date,
            stream_data,
        } = snapshot;

        // Build fully before swapping so a rejected snapshot changes nothing.
        let collection = if self.config.require_non_empty {
            RankedCollection::initialize_non_empty(stream_data, metric, &artist_info.name)?
        } else {
            RankedCollection::initialize(stream_data, metric)
        };

        log::debug!(
            "[view] loaded {} records for {} ({}) by {}",
            collection.len(),
            artist_info.name,
            date,
            metric
        );

        self.displayed = collection.order().to_vec();
        self.collection = Some(collection);
        self.metric = metric;
        self.search_term.clear();
        self.artist = Some(artist_info);
        self.date = Some(date);
        Ok(Repaint::Everything)
    }

    /// Discard the snapshot, e.g. when the artist search box is cleared.
    pub fn on_artist_cleared(&mut self) -> Repaint {
        self.generation += 1;
        self.collection = None;
        self.displayed.clear();
        self.search_term.clear();
        self.artist = None;
        self.date = None;
        Repaint::Everything
    }

    // ------------------------------------------------------------------------
    // User intents
    // ------------------------------------------------------------------------

    pub fn on_search_term_changed(&mut self, term: &str) -> Repaint {
        self.search_term = term.to_string();
        let Some(collection) = &self.collection else {
            return Repaint::Nothing;
        };

        self.displayed = if term.is_empty() {
            collection.order().to_vec()
        } else {
            let query = SearchQuery::new(term);
            collection
                .order()
                .iter()
                .copied()
                .filter(|&h| query.matches(collection.record(h)))
                .collect()
        };
        Repaint::Displayed
    }

    pub fn on_metric_changed(&mut self, metric: Metric) -> Repaint {
        self.metric = metric;
        let filtering = self.is_filtering();
        let Some(collection) = self.collection.as_mut() else {
            return Repaint::Nothing;
        };
        // Collection metric follows the selection even when empty.
        if !collection.reorder(metric) || collection.is_empty() {
            return Repaint::Nothing;
        }

        if filtering {
            // Membership stays, only the order changes.
            sort_handles(&mut self.displayed, collection.records(), metric);
        } else {
            self.displayed = collection.order().to_vec();
        }
        Repaint::Displayed
    }

    /// Metric change by name, as sent by a picker. Unknown names are ignored.
    pub fn on_metric_named(&mut self, name: &str) -> Repaint {
        match Metric::parse(name) {
            Some(metric) => self.on_metric_changed(metric),
            None => {
                log::debug!("[view] ignoring unknown metric '{}'", name);
                Repaint::Nothing
            }
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn displayed(&self) -> RecordView<'_> {
        match &self.collection {
            Some(collection) => collection.view(&self.displayed),
            None => RecordView::empty(),
        }
    }

    pub fn collection(&self) -> Option<&RankedCollection> {
        self.collection.as_ref()
    }

    /// Canonical view, or `NoSnapshot` before the first load.
    pub fn canonical(&self) -> Result<RecordView<'_>, EngineError> {
        self.collection
            .as_ref()
            .map(RankedCollection::snapshot)
            .ok_or(EngineError::NoSnapshot)
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn is_filtering(&self) -> bool {
        !self.search_term.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.collection.is_some()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn artist(&self) -> Option<&ArtistInfo> {
        self.artist.as_ref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamRecord;

    fn snapshot(records: Vec<StreamRecord>) -> StreamSnapshot {
        StreamSnapshot {
            artist_info: ArtistInfo {
                name: "Olivia Rodrigo".to_string(),
                image: None,
            },
            date: "2024/07/08".to_string(),
            stream_data: records,
        }
    }

    fn two_records() -> Vec<StreamRecord> {
        vec![
            StreamRecord::new("a", "a", 100, 900),
            StreamRecord::new("b", "b", 300, 100),
        ]
    }

    fn olivia() -> Vec<StreamRecord> {
        vec![
            StreamRecord::new("1", "vampire", 1_187_757, 1_032_236_462).with_album("GUTS"),
            StreamRecord::new("2", "traitor", 1_034_829, 1_591_547_413).with_album("SOUR"),
            StreamRecord::new("3", "deja vu", 997_879, 1_632_762_778).with_album("SOUR"),
            StreamRecord::new("4", "drivers license", 947_586, 2_208_462_492).with_album("SOUR"),
            StreamRecord::new("5", "obsessed", 650_436, 152_151_402).with_album("GUTS (spilled)"),
            StreamRecord::new("6", "bad idea right?", 556_500, 449_903_949).with_album("GUTS"),
        ]
    }

    fn loaded(records: Vec<StreamRecord>, metric: Metric) -> ViewState {
        let mut view = ViewState::default();
        view.on_fetch_completed(snapshot(records), metric).unwrap();
        view
    }

    #[test]
    fn test_scenario_filter_then_switch_metric() {
        let mut view = loaded(two_records(), Metric::Daily);
        assert_eq!(view.displayed().ids(), vec!["b", "a"]);
        assert_eq!(view.displayed().ranks(), vec![1, 2]);

        assert_eq!(view.on_search_term_changed("a"), Repaint::Displayed);
        assert_eq!(view.displayed().ids(), vec!["a"]);
        assert_eq!(view.displayed().ranks(), vec![2]);
        assert_eq!(view.canonical().unwrap().ids(), vec!["b", "a"]);

        assert_eq!(view.on_metric_changed(Metric::Total), Repaint::Displayed);
        assert_eq!(view.canonical().unwrap().ids(), vec!["a", "b"]);
        assert_eq!(view.canonical().unwrap().ranks(), vec![1, 2]);
        assert_eq!(view.displayed().ids(), vec!["a"]);
        assert_eq!(view.displayed().ranks(), vec![1]);

        view.on_search_term_changed("");
        assert!(!view.is_filtering());
        assert_eq!(view.displayed().ids(), vec!["a", "b"]);
        assert_eq!(view.displayed().ranks(), vec![1, 2]);
    }

    #[test]
    fn test_filter_keeps_canonical_ranks() {
        let mut view = loaded(olivia(), Metric::Daily);
        view.on_search_term_changed("sour");
        assert!(view.is_filtering());
        assert_eq!(view.displayed().ids(), vec!["2", "3", "4"]);
        assert_eq!(view.displayed().ranks(), vec![2, 3, 4]);
    }

    #[test]
    fn test_filter_matches_album_and_name() {
        let mut view = loaded(olivia(), Metric::Daily);
        view.on_search_term_changed("GUTS");
        assert_eq!(view.displayed().ids(), vec!["1", "5", "6"]);

        view.on_search_term_changed("Vamp");
        assert_eq!(view.displayed().ids(), vec!["1"]);
    }

    #[test]
    fn test_filter_no_match_is_empty_not_error() {
        let mut view = loaded(olivia(), Metric::Daily);
        assert_eq!(view.on_search_term_changed("zzz"), Repaint::Displayed);
        assert!(view.displayed().is_empty());
        assert!(view.is_filtering());
        assert_eq!(view.canonical().unwrap().len(), 6);
    }

    #[test]
    fn test_clear_restores_canonical() {
        let mut view = loaded(olivia(), Metric::Daily);
        view.on_search_term_changed("s");
        view.on_metric_changed(Metric::Total);
        view.on_search_term_changed("");
        assert!(view.displayed() == view.canonical().unwrap());
        assert_eq!(view.displayed().ids(), vec!["4", "3", "2", "1", "6", "5"]);
    }

    #[test]
    fn test_metric_switch_while_filtering_keeps_membership() {
        let mut view = loaded(olivia(), Metric::Daily);
        view.on_search_term_changed("guts");
        let mut before: Vec<String> = view.displayed().ids().into_iter().map(String::from).collect();
        view.on_metric_changed(Metric::Total);
        let mut after: Vec<String> = view.displayed().ids().into_iter().map(String::from).collect();
        assert_eq!(after, vec!["1", "6", "5"]);
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_repeated_metric_is_idempotent() {
        let mut view = loaded(olivia(), Metric::Daily);
        view.on_metric_changed(Metric::Total);
        let once = view.displayed().to_vec();
        assert_eq!(view.on_metric_changed(Metric::Total), Repaint::Nothing);
        assert_eq!(view.displayed().to_vec(), once);
    }

    #[test]
    fn test_unknown_metric_name_is_noop() {
        let mut view = loaded(olivia(), Metric::Daily);
        let before = view.displayed().to_vec();
        assert_eq!(view.on_metric_named("weekly"), Repaint::Nothing);
        assert_eq!(view.displayed().to_vec(), before);
        assert_eq!(view.metric(), Metric::Daily);

        assert_eq!(view.on_metric_named("Total"), Repaint::Displayed);
        assert_eq!(view.metric(), Metric::Total);
    }

    #[test]
    fn test_intents_before_load_are_noops() {
        let mut view = ViewState::default();
        assert_eq!(view.on_metric_changed(Metric::Total), Repaint::Nothing);
        assert_eq!(view.on_search_term_changed("x"), Repaint::Nothing);
        assert!(view.displayed().is_empty());
        assert!(matches!(view.canonical(), Err(EngineError::NoSnapshot)));
        // The selection is remembered for the first fetch
        assert_eq!(view.metric(), Metric::Total);
    }

    #[test]
    fn test_new_fetch_resets_search() {
        let mut view = loaded(olivia(), Metric::Daily);
        view.on_search_term_changed("guts");
        assert_eq!(
            view.on_fetch_completed(snapshot(two_records()), Metric::Total).unwrap(),
            Repaint::Everything
        );
        assert!(!view.is_filtering());
        assert_eq!(view.search_term(), "");
        assert_eq!(view.displayed().ids(), vec!["a", "b"]);
        assert_eq!(view.artist().unwrap().name, "Olivia Rodrigo");
        assert_eq!(view.date(), Some("2024/07/08"));
    }

    #[test]
    fn test_stale_fetch_is_ignored() {
        let mut view = ViewState::default();
        let first = view.begin_fetch();
        let second = view.begin_fetch();

        view.complete_fetch(second, snapshot(two_records())).unwrap();
        let result = view.complete_fetch(first, snapshot(olivia()));
        assert!(matches!(
            result,
            Err(EngineError::StaleFetchIgnored { generation: 1, latest: 2 })
        ));
        assert_eq!(view.displayed().ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_complete_fetch_uses_selected_metric() {
        let mut view = ViewState::default();
        let ticket = view.begin_fetch();
        view.on_metric_changed(Metric::Total);
        view.complete_fetch(ticket, snapshot(two_records())).unwrap();
        assert_eq!(view.displayed().ids(), vec!["a", "b"]);
        assert_eq!(view.collection().unwrap().metric(), Metric::Total);
    }

    #[test]
    fn test_failed_fetch_keeps_snapshot() {
        let mut view = loaded(olivia(), Metric::Daily);
        let ticket = view.begin_fetch();
        let failure = view.fail_fetch(ticket, "Nobody").unwrap();
        assert_eq!(failure.to_string(), "No stream data available for Nobody");
        assert_eq!(view.displayed().len(), 6);

        let stale = view.begin_fetch();
        view.begin_fetch();
        assert!(view.fail_fetch(stale, "Nobody").is_err());
    }

    #[test]
    fn test_require_non_empty_keeps_previous_snapshot() {
        let mut view = ViewState::new(EngineConfig::new(Metric::Daily).require_non_empty(true));
        view.on_fetch_completed(snapshot(two_records()), Metric::Daily).unwrap();
        let result = view.on_fetch_completed(snapshot(vec![]), Metric::Daily);
        assert!(matches!(result, Err(EngineError::EmptyInput { .. })));
        assert_eq!(view.displayed().ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_empty_snapshot_allowed_by_default() {
        let mut view = loaded(vec![], Metric::Daily);
        assert!(view.is_loaded());
        assert!(view.displayed().is_empty());
        assert_eq!(view.on_metric_changed(Metric::Total), Repaint::Nothing);
        assert_eq!(view.metric(), Metric::Total);
        assert_eq!(view.collection().unwrap().metric(), Metric::Total);
    }

    #[test]
    fn test_artist_cleared_returns_to_empty() {
        let mut view = loaded(olivia(), Metric::Daily);
        let pending = view.begin_fetch();
        view.on_search_term_changed("guts");
        assert_eq!(view.on_artist_cleared(), Repaint::Everything);
        assert!(!view.is_loaded());
        assert!(view.displayed().is_empty());
        assert!(view.artist().is_none());
        assert!(!view.is_current(pending));
    }
}
