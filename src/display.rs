//! Plain-text and JSON rendering of a view for the terminal front-end.

use serde::Serialize;
use std::fmt::Write;

use crate::models::{ArtistInfo, Metric, StreamRecord};
use crate::view::ViewState;

/// Group digits in threes: 1187757 → "1,187,757".
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_row(record: &StreamRecord, metric: Metric) -> String {
    let album = match &record.album_name {
        Some(album) => format!(" ({})", album),
        None => String::new(),
    };
    let collab = if record.is_collaboration { " [collab]" } else { "" };
    format!(
        "{:>4}. {}{}{} - {} {}",
        record.rank,
        record.name,
        album,
        collab,
        format_count(metric.value(record)),
        metric
    )
}

/// Header, search status and one line per displayed record.
pub fn render_view(view: &ViewState) -> String {
    let mut out = String::new();
    let Some(artist) = view.artist() else {
        out.push_str("No artist loaded.\n");
        return out;
    };

    let _ = writeln!(
        out,
        "{} | {} | by {}",
        artist.name,
        view.date().unwrap_or("-"),
        view.metric()
    );
    let _ = writeln!(out, "{:-<60}", "");

    let displayed = view.displayed();
    if view.is_filtering() {
        let total = view.collection().map_or(0, |c| c.len());
        let _ = writeln!(
            out,
            "Search '{}': {} of {}",
            view.search_term(),
            displayed.len(),
            total
        );
    }

    if displayed.is_empty() {
        out.push_str("No results found.\n");
    }
    for record in displayed.iter() {
        let _ = writeln!(out, "{}", format_row(record, view.metric()));
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewJson<'a> {
    artist_info: Option<&'a ArtistInfo>,
    date: Option<&'a str>,
    metric: Metric,
    search_term: &'a str,
    is_filtering: bool,
    stream_data: Vec<&'a StreamRecord>,
}

pub fn render_json(view: &ViewState) -> serde_json::Result<String> {
    let json = ViewJson {
        artist_info: view.artist(),
        date: view.date(),
        metric: view.metric(),
        search_term: view.search_term(),
        is_filtering: view.is_filtering(),
        stream_data: view.displayed().iter().collect(),
    };
    serde_json::to_string_pretty(&json)
}
