use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wordmark_core::{
    AnnotationSession, FsFileGateway, HeadlessWaveform, ImportError, RegionOrigin, SessionError,
    WaveformEngine, DEFAULT_PALETTE,
};

const SETTLE: Duration = Duration::from_millis(100);
const TWO_WORDS: &str = r#"[{"start":0,"end":1,"word":"a"},{"start":1,"end":2,"word":"b"}]"#;
const THREE_WORDS: &str = r#"[
    {"start":0,"end":1,"word":"a"},
    {"start":1,"end":2,"word":"b"},
    {"start":2,"end":3,"word":"c"}
]"#;

fn ready_session() -> (AnnotationSession<HeadlessWaveform>, Instant) {
    let mut session = AnnotationSession::with_defaults(HeadlessWaveform::new());
    session.load_audio("blob:take-1").unwrap();
    let t0 = Instant::now();
    session.pump(t0).unwrap();
    (session, t0)
}

fn exported(session: &AnnotationSession<HeadlessWaveform>) -> Value {
    serde_json::from_str(&session.export_json().unwrap()).unwrap()
}

fn triples(session: &AnnotationSession<HeadlessWaveform>) -> Vec<(f64, f64, String)> {
    session
        .regions()
        .into_iter()
        .map(|region| (region.start, region.end, region.label.clone()))
        .collect()
}

#[test]
fn import_creates_regions_without_labeling() {
    let (mut session, t0) = ready_session();
    assert_eq!(session.import_json(TWO_WORDS).unwrap(), 2);

    assert_eq!(session.pump(t0).unwrap(), None);
    assert_eq!(session.pump(t0 + SETTLE * 5).unwrap(), None);
    assert!(!session.labeling().is_open());

    assert_eq!(session.store().len(), 2);
    assert_eq!(session.blocks().len(), 2);
    assert_eq!(session.engine().region_ids().len(), 2);
    assert!(session
        .regions()
        .iter()
        .all(|region| region.origin == RegionOrigin::Imported));

    let labels: Vec<&str> = session
        .blocks()
        .iter()
        .map(|block| block.header_label.as_str())
        .collect();
    assert_eq!(labels, vec!["a", "b"]);
    assert_eq!(exported(&session), serde_json::from_str::<Value>(TWO_WORDS).unwrap());
    assert!(session.is_consistent());
}

#[test]
fn export_of_empty_session_is_empty_array() {
    let (session, _) = ready_session();
    assert_eq!(session.export_json().unwrap().trim(), "[]");
}

#[test]
fn export_then_import_reproduces_regions() {
    let (mut session, t0) = ready_session();
    let id = session.engine_mut().drag_select(0.25, 0.75).unwrap();
    session.pump(t0).unwrap();
    session.pump(t0 + SETTLE).unwrap();
    session.set_label_input("drawn");
    session.submit_label().unwrap();
    session.import_json(r#"[{"start":3,"end":4.5,"word":"loaded"}]"#).unwrap();
    session.pump(t0 + SETTLE * 2).unwrap();
    session.edit_end(id, "0.8").unwrap();

    let text = session.export_json().unwrap();
    let (mut restored, _) = ready_session();
    assert_eq!(restored.import_json(&text).unwrap(), 2);

    assert_eq!(triples(&restored), triples(&session));
    assert_eq!(
        triples(&restored),
        vec![
            (0.25, 0.8, "drawn".to_string()),
            (3.0, 4.5, "loaded".to_string())
        ]
    );
    assert_eq!(restored.export_json().unwrap(), text);
}

#[test]
fn import_accepts_extra_fields_and_inverted_ranges() {
    let (mut session, _) = ready_session();
    let count = session
        .import_json(r#"[{"start":2,"end":1,"word":"x","speaker":"A"}]"#)
        .unwrap();
    assert_eq!(count, 1);

    let region = session.regions()[0].clone();
    assert!(!region.has_valid_range());
    assert!(session.blocks().get(region.id).unwrap().range_warning);
    assert_eq!(exported(&session), json!([{"start": 2, "end": 1, "word": "x"}]));
}

#[test]
fn malformed_import_adds_nothing_and_sets_notice() {
    let (mut session, _) = ready_session();
    session.import_json(r#"[{"start":0,"end":1,"word":"keep"}]"#).unwrap();

    let err = session
        .import_json(r#"[{"start":5,"end":6,"word":"ok"},{"start":"x","end":7,"word":"bad"}]"#)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Import(ImportError::Entry { index: 1, .. })
    ));
    assert!(session.notice().unwrap().contains("#2"));
    assert_eq!(triples(&session), vec![(0.0, 1.0, "keep".to_string())]);
    assert!(session.is_consistent());

    for text in ["not json", r#"{"start":0}"#, r#"[{"start":-1,"end":1,"word":"neg"}]"#] {
        assert!(session.import_json(text).is_err(), "{text} should be rejected");
        assert_eq!(session.store().len(), 1);
    }

    session.import_json(r#"[{"start":8,"end":9,"word":"later"}]"#).unwrap();
    assert_eq!(session.notice(), None);
    assert_eq!(session.store().len(), 2);
}

#[test]
fn engine_failure_rolls_back_partial_import() {
    let (mut session, t0) = ready_session();
    session.engine_mut().fail_adds_after(1);

    let err = session.import_json(THREE_WORDS).unwrap_err();
    assert!(matches!(err, SessionError::Engine(_)));
    assert!(session.notice().is_some());
    assert!(session.store().is_empty());
    assert!(session.blocks().is_empty());
    assert!(session.engine().region_ids().is_empty());

    // Echo of the rolled-back region must not come back as a drawn region.
    session.pump(t0).unwrap();
    assert!(session.store().is_empty());
    assert!(session.is_consistent());

    session.engine_mut().fail_adds_after(usize::MAX);
    session.import_json(TWO_WORDS).unwrap();
    assert_eq!(session.regions()[0].color.as_str(), DEFAULT_PALETTE[0]);
    assert_eq!(session.regions()[1].color.as_str(), DEFAULT_PALETTE[1]);
}

#[test]
fn file_gateway_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("words.json");
    std::fs::write(&source, TWO_WORDS).unwrap();

    let (mut session, _) = ready_session();
    let mut files = FsFileGateway::new(dir.path().join("downloads"));
    assert_eq!(session.import_file(&mut files).unwrap(), 0, "picker dismissed");

    files.select(&source);
    assert_eq!(session.import_file(&mut files).unwrap(), 2);

    session.export(&mut files).unwrap();
    let written = std::fs::read_to_string(files.download_dir().join("regions.json")).unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&written).unwrap(),
        serde_json::from_str::<Value>(TWO_WORDS).unwrap()
    );
}

#[test]
fn unreadable_file_sets_notice() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _) = ready_session();
    let mut files = FsFileGateway::new(dir.path());
    files.select(dir.path().join("missing.json"));

    let err = session.import_file(&mut files).unwrap_err();
    assert!(matches!(err, SessionError::File(_)));
    assert!(session.notice().is_some());
    assert!(session.store().is_empty());
}
