use super::*;

use std::sync::Arc;

use crate::foundation::core::Size;
use crate::geometry::fit::PercentRect;
use crate::layers::model::NewImage;
use crate::layers::store::NewLayer;
use crate::test_support::solid_png;
use crate::upload::remote::UploadPayload;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn solid(width: u32, height: u32, px: [u8; 4]) -> DecodedImage {
    DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(px.repeat((width * height) as usize)),
    }
}

/// Background is blue, every layer image is red.
struct Solid;

impl CanvasAssets for Solid {
    fn background_pixels(&mut self, _: &Background) -> StrataResult<Option<DecodedImage>> {
        Ok(Some(solid(10, 10, BLUE)))
    }

    fn image_pixels(&mut self, _: &LayerImage) -> StrataResult<Option<DecodedImage>> {
        Ok(Some(solid(10, 10, RED)))
    }
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn store_with_layer(rect: PercentRect) -> (LayerStore, crate::foundation::core::LayerId) {
    let mut s = LayerStore::new();
    let id = s
        .add_layer(NewLayer {
            name: "A".to_string(),
            description: String::new(),
            transform: rect,
            images: vec![NewImage::upload("a.png", LocalRef::from_seq(1))],
        })
        .unwrap();
    (s, id)
}

#[test]
fn contain_rect_centers_along_the_slack_axis() {
    let r = contain_rect(PixelRect::new(0.0, 0.0, 200.0, 100.0), 10, 10);
    assert_eq!(r, PixelRect::new(50.0, 0.0, 100.0, 100.0));
    let empty = contain_rect(PixelRect::new(5.0, 5.0, 0.0, 10.0), 10, 10);
    assert_eq!(empty.width, 0.0);
}

#[test]
fn layer_image_is_contained_in_its_placement() {
    let (s, _) = store_with_layer(PercentRect::new(0.0, 0.0, 50.0, 100.0));
    let frame = compose_canvas(
        &s,
        ContainerSize::new(200.0, 100.0),
        &mut Solid,
        &CanvasOptions::default(),
    )
    .unwrap();
    assert_eq!((frame.width, frame.height), (200, 100));
    assert!(frame.premultiplied);
    assert_eq!(px(&frame, 50, 50), RED);
    assert_eq!(px(&frame, 150, 50), [0, 0, 0, 0]);
}

#[test]
fn background_fills_only_its_fit_box() {
    let (mut s, id) = store_with_layer(PercentRect::new(0.0, 0.0, 10.0, 10.0));
    s.set_visible(id, false).unwrap();
    s.set_background(Some(Background {
        local_preview: LocalRef::from_seq(9),
        remote: None,
        display_name: "bg.png".to_string(),
        intrinsic_size: Some(Size::new(100.0, 100.0)),
    }));
    let opts = CanvasOptions::default().with_clear(ColorRgba8::WHITE);
    let frame = compose_canvas(&s, ContainerSize::new(200.0, 100.0), &mut Solid, &opts).unwrap();
    assert_eq!(px(&frame, 10, 50), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 100, 50), BLUE);
    // The hidden layer would sit at the fit box's top-left corner.
    assert_eq!(px(&frame, 52, 2), BLUE);
}

#[test]
fn degenerate_container_is_a_geometry_error() {
    let (s, _) = store_with_layer(PercentRect::new(0.0, 0.0, 50.0, 50.0));
    let err = compose_canvas(
        &s,
        ContainerSize::new(0.0, 100.0),
        &mut Solid,
        &CanvasOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StrataError::GeometryDegenerate(_)));
}

#[test]
fn preview_assets_decode_local_bytes_and_skip_missing_ones() {
    let (s, _) = store_with_layer(PercentRect::new(0.0, 0.0, 100.0, 100.0));
    let mut previews = LocalPreviewCache::new();
    let frame = compose_canvas(
        &s,
        ContainerSize::new(40.0, 40.0),
        &mut PreviewAssets::new(&previews),
        &CanvasOptions::default(),
    )
    .unwrap();
    assert!(frame.data.iter().all(|&b| b == 0));

    previews.insert(
        LocalRef::from_seq(1),
        UploadPayload::png("a.png", solid_png(4, 4, RED)),
    );
    let frame = compose_canvas(
        &s,
        ContainerSize::new(40.0, 40.0),
        &mut PreviewAssets::new(&previews),
        &CanvasOptions::default(),
    )
    .unwrap();
    assert_eq!(px(&frame, 20, 20), RED);
}

#[test]
fn text_captures_draw_at_their_captured_size() {
    let mut s = LayerStore::new();
    let captured = crate::layers::model::CapturedSize {
        width: 10,
        height: 10,
    };
    s.add_layer(NewLayer {
        name: "T".to_string(),
        description: String::new(),
        transform: PercentRect::new(0.0, 0.0, 100.0, 100.0),
        images: vec![NewImage::text(
            "Hi",
            LocalRef::from_seq(1),
            crate::text::style::TextStyle::plain("Hi"),
            captured,
        )],
    })
    .unwrap();
    let frame = compose_canvas(
        &s,
        ContainerSize::new(100.0, 100.0),
        &mut Solid,
        &CanvasOptions::default(),
    )
    .unwrap();
    assert_eq!(px(&frame, 5, 5), RED);
    assert_eq!(px(&frame, 50, 50), [0, 0, 0, 0]);
}
