use super::*;

const EPS: f64 = 1e-9;

fn fit() -> FitBox {
    FitBox {
        left: 0.0,
        top: 50.0,
        width: 300.0,
        height: 200.0,
    }
}

fn start() -> PercentRect {
    PercentRect::new(10.0, 10.0, 20.0, 20.0)
}

#[test]
fn begin_maps_the_placement_into_pixels() {
    let g = TransformGesture::begin(LayerId(1), GestureKind::Drag, fit(), start(), Point::ZERO);
    assert_eq!(g.current(), PixelRect::new(30.0, 60.0, 60.0, 40.0));
    assert_eq!(g.layer(), LayerId(1));
}

#[test]
fn drag_commits_through_percent_conversion() {
    let mut g = TransformGesture::begin(
        LayerId(1),
        GestureKind::Drag,
        fit(),
        start(),
        Point::new(100.0, 100.0),
    );
    g.pointer_moved(Point::new(130.0, 120.0));
    let committed = g.commit();
    assert!(committed.approx_eq(&PercentRect::new(20.0, 15.0, 20.0, 20.0), EPS));
}

#[test]
fn moves_are_coalesced_per_frame() {
    let mut g = TransformGesture::begin(LayerId(1), GestureKind::Drag, fit(), start(), Point::ZERO);
    assert_eq!(g.on_animation_frame(), None);
    g.pointer_moved(Point::new(5.0, 0.0));
    g.pointer_moved(Point::new(10.0, 0.0));
    g.pointer_moved(Point::new(15.0, 0.0));
    assert_eq!(
        g.on_animation_frame(),
        Some(PixelRect::new(45.0, 60.0, 60.0, 40.0))
    );
    assert_eq!(g.on_animation_frame(), None);
}

#[test]
fn drag_past_the_edge_is_clamped_on_commit() {
    let mut g = TransformGesture::begin(LayerId(1), GestureKind::Drag, fit(), start(), Point::ZERO);
    g.pointer_moved(Point::new(1000.0, -1000.0));
    let committed = g.commit();
    assert!(committed.approx_eq(&PercentRect::new(80.0, 0.0, 20.0, 20.0), EPS));
}

#[test]
fn corner_resize_moves_two_edges() {
    let mut g = TransformGesture::begin(
        LayerId(1),
        GestureKind::Resize(ResizeHandle::BottomRight),
        fit(),
        start(),
        Point::ZERO,
    );
    g.pointer_moved(Point::new(30.0, 20.0));
    assert!(g.commit().approx_eq(&PercentRect::new(10.0, 10.0, 30.0, 30.0), EPS));

    let mut g = TransformGesture::begin(
        LayerId(1),
        GestureKind::Resize(ResizeHandle::TopLeft),
        fit(),
        start(),
        Point::ZERO,
    );
    g.pointer_moved(Point::new(-30.0, -20.0));
    assert!(g.commit().approx_eq(&PercentRect::new(0.0, 0.0, 30.0, 30.0), EPS));
}

#[test]
fn resize_never_inverts_the_rect() {
    let mut g = TransformGesture::begin(
        LayerId(1),
        GestureKind::Resize(ResizeHandle::Left),
        fit(),
        start(),
        Point::ZERO,
    );
    g.pointer_moved(Point::new(500.0, 0.0));
    g.on_animation_frame();
    let r = g.current();
    assert_eq!(r.width, MIN_GESTURE_SIZE_PX);
    assert_eq!(r.x + r.width, 90.0);
}
