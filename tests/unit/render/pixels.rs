use super::*;

fn repeat_px(px: [u8; 4], n: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n * 4);
    for _ in 0..n {
        out.extend_from_slice(&px);
    }
    out
}

#[test]
fn kernel_sums_to_one_in_q16() {
    for radius in [1u32, 3, 8] {
        let k = gaussian_kernel_q16(radius, radius as f32 / 2.0).unwrap();
        assert_eq!(k.len(), (2 * radius + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
}

#[test]
fn zero_radius_blur_is_identity() {
    let mut px = vec![10u8, 20, 30, 40, 50, 60, 70, 80];
    let before = px.clone();
    blur_premul_in_place(&mut px, 2, 1, 0.0).unwrap();
    assert_eq!(px, before);
}

#[test]
fn blur_spreads_a_single_pixel() {
    let mut px = vec![0u8; 5 * 5 * 4];
    let center = (2 * 5 + 2) * 4;
    px[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
    blur_premul_in_place(&mut px, 5, 5, 2.0).unwrap();
    assert!(px[center + 3] < 255);
    assert!(px[(2 * 5 + 1) * 4 + 3] > 0);
    assert!(px[(2 * 5 + 3) * 4 + 3] > 0);
}

#[test]
fn over_with_opaque_source_replaces_destination() {
    let mut dst = repeat_px([0, 0, 255, 255], 2);
    let src = repeat_px([255, 0, 0, 255], 2);
    premul_over_in_place(&mut dst, &src).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn over_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(premul_over_in_place(&mut dst, &[0u8; 4]).is_err());
}

#[test]
fn opacity_scales_all_channels() {
    let mut px = vec![200u8, 100, 0, 200];
    apply_opacity_in_place(&mut px, 0.5);
    assert_eq!(px, vec![100, 50, 0, 100]);
    let mut px = vec![1u8, 2, 3, 4];
    apply_opacity_in_place(&mut px, 1.0);
    assert_eq!(px, vec![1, 2, 3, 4]);
}

#[test]
fn pixmap_roundtrip_keeps_bytes() {
    let bytes = repeat_px([10, 20, 30, 255], 6);
    let pm = pixmap_from_premul_bytes(&bytes, 3, 2).unwrap();
    assert_eq!(pm.data_as_u8_slice(), bytes.as_slice());
    assert!(pixmap_from_premul_bytes(&bytes, 4, 2).is_err());
}

#[test]
fn frame_png_is_unpremultiplied() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![64, 0, 0, 128],
        premultiplied: true,
    };
    let png = frame.to_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    let px = decoded.get_pixel(0, 0).0;
    assert_eq!(px[3], 128);
    assert!((i32::from(px[0]) - 128).abs() <= 1);
}
