use super::*;

#[test]
fn fnv_matches_reference_vectors_and_is_stable() {
    assert_eq!(Fnv1a64::new_default().finish(), 0xcbf2_9ce4_8422_2325);
    let mut one = Fnv1a64::new_default();
    one.write_u8(b'a');
    assert_eq!(one.finish(), 0xaf63_dc4c_8601_ec8c);

    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"strata");
    let mut b = Fnv1a64::new_default();
    b.write_u8(b's');
    b.write_bytes(b"trata");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_write_str_is_length_prefixed() {
    let mut a = Fnv1a64::new_default();
    a.write_str("ab");
    a.write_str("c");
    let mut b = Fnv1a64::new_default();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_then_unpremultiply_keeps_opaque_and_clears_transparent() {
    let mut px = vec![200u8, 100, 50, 255, 10, 20, 30, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[200, 100, 50, 255]);
    assert_eq!(&px[4..], &[0, 0, 0, 0]);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[200, 100, 50, 255]);
}

#[test]
fn unpremultiply_half_alpha_restores_channel() {
    let mut px = vec![64u8, 0, 0, 128];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px[0], 128);
}
