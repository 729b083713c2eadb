//! Data sources that produce artist snapshots.
//!
//! The engine never performs I/O itself. A `DataSource` runs on a worker
//! thread and its result is marshalled back to the update loop by
//! [`crate::session::Session`].

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SourceError;
use crate::models::{ArtistInfo, MusicType, StreamSnapshot};
use crate::normalize::artist_slug;

pub trait DataSource: Send + Sync {
    fn fetch(&self, artist: &str, music_type: MusicType) -> Result<StreamSnapshot, SourceError>;

    /// Artists credited on one song or album, by its `music_id`.
    fn collaborators(
        &self,
        music_id: &str,
        music_type: MusicType,
    ) -> Result<Vec<ArtistInfo>, SourceError>;
}

// ============================================================================
// JSON Directory Source
// ============================================================================

/// Reads `<root>/<artist-slug>/<songs|albums>.json`, and collaborator lists
/// from `<root>/collaborators/<songs|albums>/<music-id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, artist: &str, music_type: MusicType) -> PathBuf {
        self.root
            .join(artist_slug(artist))
            .join(format!("{}.json", music_type.as_str()))
    }

    pub fn collaborators_path(&self, music_id: &str, music_type: MusicType) -> PathBuf {
        self.root
            .join("collaborators")
            .join(music_type.as_str())
            .join(format!("{}.json", music_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DataSource for JsonDirSource {
    fn fetch(&self, artist: &str, music_type: MusicType) -> Result<StreamSnapshot, SourceError> {
        let path = self.path_for(artist, music_type);
        log::debug!("[source] reading {}", path.display());

        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    artist: artist.to_string(),
                    path,
                });
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        StreamSnapshot::from_json(&json).map_err(|source| SourceError::Decode { path, source })
    }

    fn collaborators(
        &self,
        music_id: &str,
        music_type: MusicType,
    ) -> Result<Vec<ArtistInfo>, SourceError> {
        let path = self.collaborators_path(music_id, music_type);
        log::debug!("[source] reading {}", path.display());

        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NoCollaborators {
                    music_id: music_id.to_string(),
                    path,
                });
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        serde_json::from_str(&json).map_err(|source| SourceError::Decode { path, source })
    }
}

// ============================================================================
// In-Memory Source
// ============================================================================

/// Snapshots held in memory, keyed by artist slug and music type.
/// Useful for previews and tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    snapshots: Mutex<FxHashMap<(String, MusicType), StreamSnapshot>>,
    collaborators: Mutex<FxHashMap<(String, MusicType), Vec<ArtistInfo>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, music_type: MusicType, snapshot: StreamSnapshot) {
        let key = (artist_slug(&snapshot.artist_info.name), music_type);
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.insert(key, snapshot);
        }
    }

    pub fn insert_collaborators(&self, music_id: &str, music_type: MusicType, artists: Vec<ArtistInfo>) {
        if let Ok(mut collaborators) = self.collaborators.lock() {
            collaborators.insert((music_id.to_string(), music_type), artists);
        }
    }
}

impl DataSource for MemorySource {
    fn fetch(&self, artist: &str, music_type: MusicType) -> Result<StreamSnapshot, SourceError> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|_| SourceError::Unavailable("memory source lock poisoned".to_string()))?;
        snapshots
            .get(&(artist_slug(artist), music_type))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                artist: artist.to_string(),
                path: PathBuf::from(format!("memory://{}/{}", artist_slug(artist), music_type)),
            })
    }

    fn collaborators(
        &self,
        music_id: &str,
        music_type: MusicType,
    ) -> Result<Vec<ArtistInfo>, SourceError> {
        let collaborators = self
            .collaborators
            .lock()
            .map_err(|_| SourceError::Unavailable("memory source lock poisoned".to_string()))?;
        collaborators
            .get(&(music_id.to_string(), music_type))
            .cloned()
            .ok_or_else(|| SourceError::NoCollaborators {
                music_id: music_id.to_string(),
                path: PathBuf::from(format!("memory://collaborators/{}/{}", music_type, music_id)),
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================
