//! Core data models for stream ranking.
//!
//! This module contains the record, metric and snapshot types shared by the
//! ranking engine and its collaborators, together with the decoding rules
//! applied at the data-source boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of the popularity score reported by the upstream service.
pub const MAX_POPULARITY: u8 = 100;

// ============================================================================
// Regex Patterns
// ============================================================================

/// Stream counts as plain digits ("1187757") or thousands-grouped ("1,187,757").
static COUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+|\d{1,3}(?:,\d{3})+)$").unwrap());

// ============================================================================
// Metric
// ============================================================================

/// Numeric field used to order records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Daily,
    Total,
    Popularity,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Daily, Metric::Total, Metric::Popularity];

    /// Value of this metric's field on `record`. Higher ranks first.
    pub fn value(self, record: &StreamRecord) -> u64 {
        match self {
            Metric::Daily => record.daily_streams,
            Metric::Total => record.total_streams,
            Metric::Popularity => u64::from(record.popularity),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Daily => "daily",
            Metric::Total => "total",
            Metric::Popularity => "popularity",
        }
    }

    /// Case-insensitive lookup. Names outside the enumerated set yield `None`.
    pub fn parse(name: &str) -> Option<Metric> {
        let lower = name.trim().to_lowercase();
        Metric::ALL.into_iter().find(|m| m.as_str() == lower)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::parse(s).ok_or_else(|| format!("unknown metric '{}' (expected daily, total or popularity)", s))
    }
}

// ============================================================================
// Music Type
// ============================================================================

/// Which record set a fetch asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicType {
    #[default]
    Songs,
    Albums,
}

impl MusicType {
    pub fn as_str(self) -> &'static str {
        match self {
            MusicType::Songs => "songs",
            MusicType::Albums => "albums",
        }
    }
}

impl fmt::Display for MusicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MusicType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "songs" | "song" => Ok(MusicType::Songs),
            "albums" | "album" => Ok(MusicType::Albums),
            other => Err(format!("unknown music type '{}' (expected songs or albums)", other)),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One song or album in an artist snapshot.
///
/// `rank` is never read from the wire: the ranking engine assigns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub music_id: String,
    #[serde(rename = "musicName")]
    pub name: String,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub spotify_url: Option<String>,
    #[serde(default)]
    pub is_collaboration: bool,

    #[serde(deserialize_with = "deserialize_count")]
    pub daily_streams: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub total_streams: u64,
    #[serde(default, deserialize_with = "deserialize_popularity")]
    pub popularity: u8,

    #[serde(skip_deserializing)]
    pub rank: u32,
}

impl StreamRecord {
    /// Minimal record with only identity, name and counts set.
    pub fn new(music_id: &str, name: &str, daily_streams: u64, total_streams: u64) -> Self {
        Self {
            music_id: music_id.to_string(),
            name: name.to_string(),
            album_name: None,
            total_tracks: None,
            track_number: None,
            duration: String::new(),
            release_date: String::new(),
            image_url: None,
            spotify_url: None,
            is_collaboration: false,
            daily_streams,
            total_streams,
            popularity: 0,
            rank: 0,
        }
    }

    pub fn with_album(mut self, album: &str) -> Self {
        self.album_name = Some(album.to_string());
        self
    }

    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = popularity.min(MAX_POPULARITY);
        self
    }
}

/// Artist header shown above the ranked list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistInfo {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Everything a successful fetch delivers for one artist and date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSnapshot {
    pub artist_info: ArtistInfo,
    pub date: String,
    pub stream_data: Vec<StreamRecord>,
}

impl StreamSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Decoding Helpers
// ============================================================================

/// Parse a non-negative stream count, accepting thousands separators.
/// Returns None for negative, fractional or badly grouped input.
pub fn parse_count(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if !COUNT_PATTERN.is_match(trimmed) {
        return None;
    }
    trimmed.replace(',', "").parse().ok()
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Number(u64),
        Text(String),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Number(n) => Ok(n),
        RawCount::Text(s) => {
            parse_count(&s).ok_or_else(|| de::Error::custom(format!("invalid stream count '{}'", s)))
        }
    }
}

fn deserialize_popularity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        None => Ok(0),
        Some(p) if (0..=i64::from(MAX_POPULARITY)).contains(&p) => Ok(p as u8),
        Some(p) => Err(de::Error::custom(format!(
            "popularity {} outside 0..={}",
            p, MAX_POPULARITY
        ))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
