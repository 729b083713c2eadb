//! Stream ranking engine - ranked, searchable per-artist stream statistics.

pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod ranking;
pub mod session;
pub mod source;
pub mod view;

pub use config::EngineConfig;
pub use error::{EngineError, SourceError};
pub use models::{ArtistInfo, Metric, MusicType, StreamRecord, StreamSnapshot};
pub use ranking::{RankedCollection, RecordView};
pub use session::{Intent, Session, Update};
pub use source::{DataSource, JsonDirSource, MemorySource};
pub use view::{FetchFailure, FetchTicket, Repaint, ViewState};
