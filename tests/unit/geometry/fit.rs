use super::*;

#[test]
fn landscape_background_in_square_container_letterboxes() {
    let fit = compute_fit_box(300.0, 300.0, 1200.0, 800.0).unwrap();
    assert_eq!(
        fit,
        FitBox {
            left: 0.0,
            top: 50.0,
            width: 300.0,
            height: 200.0
        }
    );

    let px = percent_to_pixel(fit, PercentRect::new(10.0, 10.0, 20.0, 20.0));
    assert_eq!(px, PixelRect::new(30.0, 60.0, 60.0, 40.0));
}

#[test]
fn portrait_background_pillarboxes() {
    let fit = compute_fit_box(400.0, 200.0, 100.0, 200.0).unwrap();
    assert_eq!(fit.width, 100.0);
    assert_eq!(fit.height, 200.0);
    assert_eq!(fit.left, 150.0);
    assert_eq!(fit.top, 0.0);
}

#[test]
fn no_background_uses_full_container() {
    let fit = fit_box_for(ContainerSize::new(640.0, 480.0), None).unwrap();
    assert_eq!(fit, FitBox::full(ContainerSize::new(640.0, 480.0)).unwrap());
    assert_eq!(fit.left, 0.0);
    assert_eq!(fit.width, 640.0);

    let degenerate_img = compute_fit_box(640.0, 480.0, 0.0, 10.0).unwrap();
    assert_eq!(degenerate_img, fit);
}

#[test]
fn zero_size_container_defers() {
    assert!(compute_fit_box(0.0, 300.0, 10.0, 10.0).is_none());
    assert!(fit_box_for(ContainerSize::new(300.0, 0.0), None).is_none());
}

#[test]
fn percent_pixel_round_trip_within_epsilon() {
    let fits = [
        compute_fit_box(300.0, 300.0, 1200.0, 800.0).unwrap(),
        compute_fit_box(1920.0, 1080.0, 333.0, 777.0).unwrap(),
        compute_fit_box(17.0, 3.0, 1.0, 1.0).unwrap(),
    ];
    let rects = [
        PercentRect::new(0.0, 0.0, 100.0, 100.0),
        PercentRect::new(10.0, 10.0, 20.0, 20.0),
        PercentRect::new(33.3, 66.6, 12.5, 33.4),
        PercentRect::new(99.0, 0.5, 1.0, 99.5),
    ];
    for fit in fits {
        for r in rects {
            let back = pixel_to_percent(fit, percent_to_pixel(fit, r));
            assert!(back.approx_eq(&r, 1e-9), "{r:?} -> {back:?} in {fit:?}");
        }
    }
}

#[test]
fn clamp_pulls_rect_inside_without_shrinking() {
    let r = clamp_percent(PercentRect::new(90.0, -5.0, 20.0, 30.0));
    assert_eq!(r, PercentRect::new(80.0, 0.0, 20.0, 30.0));

    let r = clamp_percent(PercentRect::new(-10.0, 50.0, 150.0, f64::NAN));
    assert_eq!(r, PercentRect::new(0.0, 50.0, 100.0, 0.0));
}

#[test]
fn pixel_to_percent_clamps_drags_past_the_fit_box() {
    let fit = compute_fit_box(300.0, 300.0, 1200.0, 800.0).unwrap();
    let r = pixel_to_percent(fit, PixelRect::new(290.0, 10.0, 60.0, 40.0));
    assert!(r.approx_eq(&PercentRect::new(80.0, 0.0, 20.0, 20.0), 1e-9));
}
