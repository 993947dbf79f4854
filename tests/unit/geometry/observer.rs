use super::*;

#[test]
fn resize_is_applied_only_at_frame_boundary() {
    let mut obs = GeometryObserver::new(ContainerId::new("desktop"));
    obs.observe_resize(ContainerSize::new(100.0, 100.0));
    obs.observe_resize(ContainerSize::new(300.0, 300.0));
    assert!(obs.fit_box().is_none());

    assert!(obs.on_animation_frame());
    assert_eq!(obs.fit_box().unwrap().width, 300.0);
    assert!(!obs.on_animation_frame());
}

#[test]
fn intrinsic_size_discovery_recomputes_immediately() {
    let mut obs = GeometryObserver::new(ContainerId::new("desktop"));
    obs.observe_resize(ContainerSize::new(300.0, 300.0));
    obs.on_animation_frame();

    assert!(obs.set_background_size(Some(Size::new(1200.0, 800.0))));
    let fit = obs.fit_box().unwrap();
    assert_eq!((fit.left, fit.top, fit.width, fit.height), (0.0, 50.0, 300.0, 200.0));

    assert!(obs.set_background_size(None));
    assert_eq!(obs.fit_box().unwrap().height, 300.0);
}

#[test]
fn zero_size_defers_and_retries_on_next_size() {
    let mut obs = GeometryObserver::new(ContainerId::new("mobile"));
    obs.set_background_size(Some(Size::new(10.0, 10.0)));
    assert!(obs.is_deferred());

    obs.observe_resize(ContainerSize::new(0.0, 0.0));
    assert!(!obs.on_animation_frame());
    assert!(obs.is_deferred());
    assert!(obs.fit_box().is_none());

    obs.observe_resize(ContainerSize::new(50.0, 20.0));
    assert!(obs.on_animation_frame());
    assert!(!obs.is_deferred());
    assert_eq!(obs.fit_box().unwrap().width, 20.0);
}

#[test]
fn collapsing_container_keeps_last_known_fit_box() {
    let mut obs = GeometryObserver::new(ContainerId::new("desktop"));
    obs.observe_resize(ContainerSize::new(200.0, 100.0));
    obs.on_animation_frame();
    let before = obs.fit_box();

    obs.observe_resize(ContainerSize::new(0.0, 100.0));
    obs.on_animation_frame();
    assert!(obs.is_deferred());
    assert_eq!(obs.fit_box(), before);
}

#[test]
fn frame_throttle_keeps_latest() {
    let mut t = FrameThrottle::default();
    assert!(!t.is_pending());
    t.push(1);
    t.push(2);
    assert!(t.is_pending());
    assert_eq!(t.take(), Some(2));
    assert_eq!(t.take(), None);
}
