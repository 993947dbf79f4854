use super::*;

fn image(id: u64, kind: SourceKind) -> LayerImage {
    LayerImage {
        id: ImageId(id),
        name: format!("img-{id}"),
        source_kind: kind,
        local_preview: LocalRef::from_seq(id),
        remote: None,
        geometry: PercentRect::default(),
        captured_size: None,
        style: None,
    }
}

fn layer(images: Vec<LayerImage>) -> Layer {
    Layer {
        id: LayerId(1),
        name: "L".to_string(),
        description: String::new(),
        z_index: 0,
        visible: true,
        active_image: images.first().map(|i| i.id),
        images,
        transform: PercentRect::default(),
    }
}

#[test]
fn kind_is_derived_from_images() {
    assert_eq!(layer(vec![]).kind(), LayerKind::Image);
    assert_eq!(
        layer(vec![image(1, SourceKind::Upload)]).kind(),
        LayerKind::Image
    );
    assert_eq!(
        layer(vec![image(1, SourceKind::Upload), image(2, SourceKind::Text)]).kind(),
        LayerKind::Text
    );
}

#[test]
fn active_and_resolution_queries() {
    let mut l = layer(vec![image(1, SourceKind::Upload), image(2, SourceKind::Upload)]);
    assert_eq!(l.active().map(|i| i.id), Some(ImageId(1)));
    assert!(!l.is_resolved());
    for img in &mut l.images {
        img.remote = Some(RemoteRef("remote:x".to_string()));
    }
    assert!(l.is_resolved());
    assert!(l.image(ImageId(2)).is_some());
    assert!(l.image(ImageId(9)).is_none());
}

#[test]
fn layer_json_uses_snake_case_kinds() {
    let l = layer(vec![image(1, SourceKind::Text)]);
    let json = serde_json::to_string(&l).unwrap();
    assert!(json.contains("\"source_kind\":\"text\""));
    let back: Layer = serde_json::from_str(&json).unwrap();
    assert_eq!(back, l);
}
