//! Single-writer update loop for one artist view.
//!
//! Every mutation of the [`ViewState`] goes through [`Session::dispatch`] on
//! the thread that owns the session. Fetches run on worker threads and post
//! their completion back as an [`Intent`] over a channel, so they never touch
//! the view directly. Completions of superseded fetches are dropped by the
//! view's generation check.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::{EngineError, SourceError};
use crate::models::{ArtistInfo, Metric, MusicType, StreamSnapshot};
use crate::source::DataSource;
use crate::view::{FetchTicket, Repaint, ViewState};

/// Everything that can change the view.
#[derive(Debug)]
pub enum Intent {
    SearchTermChanged(String),
    MetricChanged(Metric),
    /// Metric picked by name; unknown names are ignored.
    MetricNamed(String),
    ArtistCleared,
    FetchCompleted {
        ticket: FetchTicket,
        artist: String,
        result: Result<StreamSnapshot, SourceError>,
    },
}

/// Outcome of one dispatched intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub repaint: Repaint,
    /// Message for the user, e.g. a failed fetch.
    pub notice: Option<String>,
}

impl Update {
    fn repaint(repaint: Repaint) -> Self {
        Self {
            repaint,
            notice: None,
        }
    }

    fn notice(message: String) -> Self {
        Self {
            repaint: Repaint::Nothing,
            notice: Some(message),
        }
    }
}

pub struct Session {
    view: ViewState,
    source: Arc<dyn DataSource>,
    sender: Sender<Intent>,
    receiver: Receiver<Intent>,
    in_flight: usize,
}

impl Session {
    pub fn new(source: Arc<dyn DataSource>, config: EngineConfig) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            view: ViewState::new(config),
            source,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Handle for posting intents from other threads. They are applied on the
    /// next [`Session::pump`] or [`Session::wait_for_fetches`].
    pub fn sender(&self) -> Sender<Intent> {
        self.sender.clone()
    }

    pub fn has_pending_fetches(&self) -> bool {
        self.in_flight > 0
    }

    /// Start fetching `artist` on a worker thread. Supersedes earlier fetches.
    pub fn request_fetch(&mut self, artist: &str, music_type: MusicType) -> FetchTicket {
        let ticket = self.view.begin_fetch();
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let artist = artist.to_string();

        log::debug!(
            "[session] fetch #{} started for {} ({})",
            ticket.generation(),
            artist,
            music_type
        );
        self.in_flight += 1;

        thread::spawn(move || {
            // A panicking source still has to land, or the fetch stays in flight.
            let result = panic::catch_unwind(AssertUnwindSafe(|| source.fetch(&artist, music_type)))
                .unwrap_or_else(|payload| Err(SourceError::Unavailable(panic_message(&*payload))));
            // Receiver gone means the session was dropped; nobody to notify.
            let _ = sender.send(Intent::FetchCompleted {
                ticket,
                artist,
                result,
            });
        });

        ticket
    }

    /// Artists credited on a loaded record.
    ///
    /// Only records flagged as collaborations are looked up; anything else,
    /// including an id that is not loaded, has no collaborators.
    pub fn collaborators(
        &self,
        music_id: &str,
        music_type: MusicType,
    ) -> Result<Vec<ArtistInfo>, SourceError> {
        let is_collaboration = self
            .view
            .collection()
            .and_then(|c| c.get(music_id))
            .is_some_and(|r| r.is_collaboration);
        if !is_collaboration {
            log::debug!("[session] {} is not a loaded collaboration", music_id);
            return Ok(Vec::new());
        }
        self.source.collaborators(music_id, music_type)
    }

    /// Apply one intent to the view.
    pub fn dispatch(&mut self, intent: Intent) -> Update {
        match intent {
            Intent::SearchTermChanged(term) => {
                Update::repaint(self.view.on_search_term_changed(&term))
            }
            Intent::MetricChanged(metric) => Update::repaint(self.view.on_metric_changed(metric)),
            Intent::MetricNamed(name) => Update::repaint(self.view.on_metric_named(&name)),
            Intent::ArtistCleared => Update::repaint(self.view.on_artist_cleared()),
            Intent::FetchCompleted {
                ticket,
                artist,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.land_fetch(ticket, &artist, result)
            }
        }
    }

    fn land_fetch(
        &mut self,
        ticket: FetchTicket,
        artist: &str,
        result: Result<StreamSnapshot, SourceError>,
    ) -> Update {
        match result {
            Ok(snapshot) => match self.view.complete_fetch(ticket, snapshot) {
                Ok(repaint) => Update::repaint(repaint),
                Err(EngineError::StaleFetchIgnored { generation, latest }) => {
                    log::debug!(
                        "[session] dropped fetch #{} for {} (latest #{})",
                        generation,
                        artist,
                        latest
                    );
                    Update::repaint(Repaint::Nothing)
                }
                Err(e) => {
                    log::warn!("[session] {}", e);
                    Update::notice(e.to_string())
                }
            },
            Err(err) => match self.view.fail_fetch(ticket, artist) {
                Ok(failure) => {
                    log::warn!("[session] fetch for {} failed: {}", artist, err);
                    Update::notice(failure.to_string())
                }
                Err(_) => {
                    log::debug!("[session] dropped stale failure for {}: {}", artist, err);
                    Update::repaint(Repaint::Nothing)
                }
            },
        }
    }

    /// Apply every intent already queued, without blocking.
    pub fn pump(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(intent) = self.receiver.try_recv() {
            updates.push(self.dispatch(intent));
        }
        updates
    }

    /// Block until every started fetch has landed or `timeout` elapses,
    /// applying intents as they arrive.
    pub fn wait_for_fetches(&mut self, timeout: Duration) -> Vec<Update> {
        let deadline = Instant::now() + timeout;
        let mut updates = Vec::new();

        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(intent) => updates.push(self.dispatch(intent)),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "[session] gave up waiting for {} fetch(es) after {:?}",
                        self.in_flight,
                        timeout
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Pick up anything posted alongside the last completion
        updates.extend(self.pump());
        updates
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("fetch panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("fetch panicked: {}", msg)
    } else {
        "fetch panicked".to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
