use super::*;
use crate::foundation::core::LocalRef;
use crate::layers::model::{Background, NewImage};
use crate::layers::store::NewLayer;
use crate::test_support::temp_dir;

fn sample_store() -> LayerStore {
    let mut store = LayerStore::new();
    store.set_background(Some(Background {
        local_preview: LocalRef::from_seq(1),
        remote: Some(RemoteRef("remote:bg".to_string())),
        display_name: "bg.png".to_string(),
        intrinsic_size: Some(Size::new(1200.0, 800.0)),
    }));
    let mut text = NewImage::text(
        "Hello",
        LocalRef::from_seq(2),
        TextStyle::plain("Hello"),
        CapturedSize {
            width: 80,
            height: 30,
        },
    );
    text.remote = Some(RemoteRef("remote:t".to_string()));
    store
        .add_layer(NewLayer {
            name: "Title".to_string(),
            description: "headline".to_string(),
            transform: PercentRect::new(5.0, 5.0, 50.0, 10.0),
            images: vec![text],
        })
        .unwrap();
    store
        .add_layer(NewLayer {
            name: "Logo".to_string(),
            description: String::new(),
            transform: PercentRect::default(),
            images: vec![NewImage::upload("logo.png", LocalRef::from_seq(3))],
        })
        .unwrap();
    store
}

#[test]
fn configuration_carries_kind_geometry_and_text_records() {
    let config = LayerConfiguration::from_store(&sample_store());
    assert_eq!(config.layers.len(), 2);
    let title = &config.layers[0];
    assert_eq!(title.kind, LayerKind::Text);
    assert_eq!(title.z_index, 0);
    assert_eq!(title.transform, PercentRect::new(5.0, 5.0, 50.0, 10.0));
    assert_eq!(
        title.images[0].captured_size,
        Some(CapturedSize {
            width: 80,
            height: 30
        })
    );
    assert!(title.images[0].style.is_some());

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["layers"][0]["type"], "text");
    assert_eq!(json["layers"][1]["type"], "image");
    assert!(json["layers"][1]["images"][0].get("style").is_none());
    assert_eq!(json["background"]["remote"], "remote:bg");
}

#[test]
fn memory_bridge_records_and_fails_on_demand() {
    let mut bridge = MemoryPersistence::new();
    let config = LayerConfiguration::from_store(&sample_store());
    bridge.fail_next(1);
    assert!(matches!(
        bridge.save_layer_configuration("s", &config),
        Err(StrataError::Persistence(_))
    ));
    bridge.save_layer_configuration("s", &config).unwrap();
    assert_eq!(bridge.saves().len(), 1);
    assert_eq!(bridge.last(), Some(&config));
}

#[test]
fn json_file_drafts_round_trip() {
    let dir = temp_dir("drafts_round_trip");
    let mut drafts = JsonFileDraftStore::new(&dir);
    let snap = SessionSnapshot::new("study-1", sample_store());

    assert_eq!(drafts.load_draft("editor/one").unwrap(), None);
    drafts.save_draft("editor/one", &snap).unwrap();
    assert!(drafts.path_for("editor/one").ends_with("editor_one.json"));
    assert_eq!(drafts.load_draft("editor/one").unwrap(), Some(snap.clone()));

    drafts.clear_draft("editor/one").unwrap();
    drafts.clear_draft("editor/one").unwrap();
    assert_eq!(drafts.load_draft("editor/one").unwrap(), None);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn snapshot_version_is_checked() {
    let mut value = serde_json::to_value(SessionSnapshot::new("s", LayerStore::new())).unwrap();
    value["version"] = serde_json::json!(99);
    let err = SessionSnapshot::from_reader(value.to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, StrataError::Validation(_)));
    assert!(matches!(
        SessionSnapshot::from_reader("{".as_bytes()),
        Err(StrataError::Serde(_))
    ));
}

#[test]
fn memory_draft_store_counts_writes() {
    let mut drafts = MemoryDraftStore::new();
    let snap = SessionSnapshot::new("s", LayerStore::new());
    drafts.save_draft("k", &snap).unwrap();
    drafts.save_draft("k", &snap).unwrap();
    assert_eq!(drafts.writes(), 2);
    assert!(drafts.load_draft("k").unwrap().is_some());
}
