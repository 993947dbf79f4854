use super::*;

#[test]
fn markup_supersedes_content() {
    let style = TextStyle {
        content: "plain".to_string(),
        markup: Some("<b>rich</b>".to_string()),
        ..TextStyle::default()
    };
    assert_eq!(style.styled_text().text, "rich");

    let blank_markup = TextStyle {
        content: "plain".to_string(),
        markup: Some("   ".to_string()),
        ..TextStyle::default()
    };
    assert_eq!(blank_markup.styled_text().text, "plain");
}

#[test]
fn validate_rejects_empty_text_and_bad_size() {
    assert!(TextStyle::plain("  ").validate().is_err());
    assert!(
        TextStyle {
            markup: Some("<b></b>".to_string()),
            ..TextStyle::default()
        }
        .validate()
        .is_err()
    );
    let mut s = TextStyle::plain("ok");
    assert!(s.validate().is_ok());
    s.font_size_px = 0.0;
    assert!(matches!(s.validate(), Err(StrataError::Validation(_))));
}

#[test]
fn normalized_clamps_ranges() {
    let s = TextStyle {
        opacity: 250,
        rotation_deg: 720.0,
        stroke_width_px: -3.0,
        font_weight: 1000,
        letter_spacing_px: f32::NAN,
        ..TextStyle::plain("x")
    }
    .normalized();
    assert_eq!(s.opacity, 100);
    assert_eq!(s.rotation_deg, 180.0);
    assert_eq!(s.stroke_width_px, 0.0);
    assert_eq!(s.font_weight, 900);
    assert_eq!(s.letter_spacing_px, 0.0);
}

#[test]
fn fingerprint_tracks_visual_fields_only() {
    let a = TextStyle::plain("hello");
    let b = TextStyle::plain("hello");
    assert_eq!(a.fingerprint(), b.fingerprint());

    let mut c = a.clone();
    c.shadow.blur_px = 2.0;
    assert_ne!(a.fingerprint(), c.fingerprint());

    let mut d = a.clone();
    d.opacity = 200;
    let mut e = a.clone();
    e.opacity = 100;
    assert_eq!(d.fingerprint(), e.fingerprint());
}

#[test]
fn serde_defaults_fill_missing_fields() {
    let s: TextStyle = serde_json::from_str(r##"{"content":"hi","color":"#ff0000"}"##).unwrap();
    assert_eq!(s.content, "hi");
    assert_eq!(s.color, ColorRgba8::rgb(255, 0, 0));
    assert_eq!(s.opacity, 100);
    assert_eq!(s.align, TextAlign::Left);

    let json = serde_json::to_string(&s).unwrap();
    let back: TextStyle = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
}
