use super::*;
use crate::test_support::find_test_font;
use crate::text::style::TextShadow;

fn rasterizer() -> Option<TextRasterizer> {
    let bytes = find_test_font()?;
    let mut fonts = FontLibrary::new();
    fonts.register_font_bytes(bytes).ok()?;
    Some(TextRasterizer::new(fonts, TextRasterOptions::default()))
}

fn style(content: &str) -> TextStyle {
    TextStyle {
        font_size_px: 40.0,
        ..TextStyle::plain(content)
    }
}

fn alpha_sum(t: &RasterizedText) -> u64 {
    t.rgba8_premul.chunks_exact(4).map(|p| u64::from(p[3])).sum()
}

#[test]
fn empty_text_is_a_validation_error() {
    let mut r = TextRasterizer::new(FontLibrary::new(), TextRasterOptions::default());
    let err = r.render(&TextStyle::plain("   ")).unwrap_err();
    assert!(matches!(err, StrataError::Validation(_)));
}

#[test]
fn zero_font_size_is_a_validation_error() {
    let mut r = TextRasterizer::new(FontLibrary::new(), TextRasterOptions::default());
    let s = TextStyle {
        font_size_px: 0.0,
        ..TextStyle::plain("Hi")
    };
    assert!(matches!(r.render(&s), Err(StrataError::Validation(_))));
}

#[test]
fn rendering_twice_gives_identical_bitmaps() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let s = style("Hello");
    let a = r.render(&s).unwrap();
    let b = r.render(&s).unwrap();
    assert_eq!(a, b);
    assert!(a.width > 0 && a.height > 0);
    assert!(alpha_sum(&a) > 0);
}

#[test]
fn live_preview_and_offscreen_capture_match() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let s = TextStyle {
        background_color: ColorRgba8::rgb(20, 20, 200),
        stroke_width_px: 3.0,
        stroke_color: ColorRgba8::WHITE,
        ..style("Preview")
    };
    let offscreen = r.render(&s).unwrap();
    let size = r.preview(&s).unwrap();
    assert_eq!(size, (offscreen.width, offscreen.height));
    let live = r.render(&s).unwrap();
    assert_eq!(live, offscreen);
}

#[test]
fn background_adds_padding_and_stroke_adds_inset() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let bare = r.measure(&style("Box")).unwrap();
    let padded = r
        .measure(&TextStyle {
            background_color: ColorRgba8::WHITE,
            ..style("Box")
        })
        .unwrap();
    let pm = padded.metrics();
    assert_eq!(pm.padding_x, 12.0);
    assert_eq!(pm.padding_y, 6.0);
    assert_eq!(
        padded.pixel_size(),
        (bare.pixel_size().0 + 24, bare.pixel_size().1 + 12)
    );

    let stroked = r
        .measure(&TextStyle {
            stroke_width_px: 5.0,
            stroke_color: ColorRgba8::BLACK,
            ..style("Box")
        })
        .unwrap();
    assert_eq!(stroked.metrics().stroke_inset, 3.0);
    assert_eq!(
        stroked.pixel_size(),
        (bare.pixel_size().0 + 6, bare.pixel_size().1 + 6)
    );
}

#[test]
fn shadow_extends_the_footprint_by_blur_and_offset() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let bare = r.measure(&style("Shade")).unwrap();
    let shadowed = r
        .measure(&TextStyle {
            shadow: TextShadow {
                color: ColorRgba8::BLACK,
                blur_px: 4.0,
                offset_x_px: 2.0,
                offset_y_px: 6.0,
            },
            ..style("Shade")
        })
        .unwrap();
    assert_eq!(shadowed.metrics().shadow_margin, [2.0, 0.0, 6.0, 10.0]);
    assert_eq!(
        shadowed.pixel_size(),
        (bare.pixel_size().0 + 8, bare.pixel_size().1 + 10)
    );
}

#[test]
fn rotation_grows_the_bitmap_to_the_rotated_bounds() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let flat = r.measure(&style("Rotate me")).unwrap();
    let (w, h) = flat.pixel_size();

    let quarter = r
        .measure(&TextStyle {
            rotation_deg: 90.0,
            ..style("Rotate me")
        })
        .unwrap();
    assert_eq!(quarter.pixel_size(), (h, w));

    let tilted = r
        .measure(&TextStyle {
            rotation_deg: 30.0,
            ..style("Rotate me")
        })
        .unwrap();
    let (tw, th) = tilted.pixel_size();
    assert!(tw < w + h && th > h);
}

#[test]
fn opacity_scales_coverage() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let full = r.render(&style("Fade")).unwrap();
    let half = r
        .render(&TextStyle {
            opacity: 50,
            ..style("Fade")
        })
        .unwrap();
    assert_eq!((full.width, full.height), (half.width, half.height));
    assert!(alpha_sum(&half) < alpha_sum(&full));
    assert!(alpha_sum(&half) > 0);
}

#[test]
fn png_encoding_keeps_the_captured_size() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let t = r.render(&style("PNG")).unwrap();
    let upload = t.to_upload("text-1").unwrap();
    assert_eq!(upload.file_name, "text-1.png");
    assert_eq!(upload.content_type, "image/png");
    let decoded = image::load_from_memory(&upload.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (t.width, t.height));
}

#[test]
fn unmount_falls_back_to_offscreen() {
    let Some(mut r) = rasterizer() else {
        eprintln!("no test font found; skipping");
        return;
    };
    let s = style("Mount");
    r.preview(&s).unwrap();
    assert!(r.mounted_preview().is_some());
    r.unmount_preview();
    assert!(r.mounted_preview().is_none());
    assert!(r.render(&s).is_ok());
}
