//! End-to-end run over the bundled `data/` snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stream_rank::{DataSource, EngineConfig, Intent, JsonDirSource, Metric, MusicType, Session};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[test]
fn test_sample_snapshot_decodes() {
    let source = JsonDirSource::new(data_dir());
    let snapshot = source.fetch("Olivia Rodrigo", MusicType::Songs).unwrap();
    assert_eq!(snapshot.artist_info.name, "Olivia Rodrigo");
    assert_eq!(snapshot.stream_data.len(), 8);
    assert!(source.fetch("Olivia Rodrigo", MusicType::Albums).is_err());
}

#[test]
fn test_sample_session_walkthrough() {
    let source = Arc::new(JsonDirSource::new(data_dir()));
    let mut session = Session::new(source, EngineConfig::new(Metric::Daily));
    session.request_fetch("olivia rodrigo", MusicType::Songs);
    session.wait_for_fetches(Duration::from_secs(5));

    let top = session.view().displayed().get(0).unwrap().name.clone();
    assert_eq!(top, "vampire");

    session.dispatch(Intent::SearchTermChanged("sour".to_string()));
    let names: Vec<String> = session.view().displayed().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["traitor", "deja vu", "drivers license", "favorite crime", "good 4 u"]);
    assert_eq!(session.view().displayed().ranks(), vec![2, 3, 4, 5, 6]);

    session.dispatch(Intent::MetricChanged(Metric::Total));
    let names: Vec<String> = session.view().displayed().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["drivers license", "good 4 u", "deja vu", "traitor", "favorite crime"]);
    assert_eq!(session.view().displayed().ranks(), vec![1, 2, 3, 4, 5]);

    session.dispatch(Intent::SearchTermChanged(String::new()));
    let ranks = session.view().displayed().ranks();
    assert_eq!(ranks, (1..=8).collect::<Vec<u32>>());
    assert_eq!(session.view().displayed().get(5).unwrap().name, "vampire");
}
