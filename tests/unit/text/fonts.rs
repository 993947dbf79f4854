use super::*;
use crate::test_support::find_test_font;

#[test]
fn empty_library_cannot_resolve() {
    let lib = FontLibrary::new();
    assert!(lib.is_empty());
    assert!(matches!(
        lib.resolve_family("Arial"),
        Err(StrataError::Rasterization(_))
    ));
    assert!(lib.settle(&TextStyle::plain("x")).is_err());
}

#[test]
fn garbage_bytes_are_rejected() {
    let mut lib = FontLibrary::new();
    assert!(lib.register_font_bytes(vec![0, 1, 2, 3]).is_err());
    assert!(lib.is_empty());
}

#[test]
fn missing_dir_registers_nothing() {
    let mut lib = FontLibrary::new();
    assert_eq!(
        lib.register_dir(Path::new("definitely/not/a/font/dir")),
        0
    );
}

#[test]
fn registered_family_resolves_case_insensitively_and_is_default() {
    let Some(bytes) = find_test_font() else {
        return;
    };
    let mut lib = FontLibrary::new();
    let family = lib.register_font_bytes(bytes).unwrap();
    assert_eq!(lib.resolve_family(&family.to_uppercase()).unwrap(), family);
    assert_eq!(lib.resolve_family("sans-serif").unwrap(), family);
    assert!(lib.set_default_family("nope").is_err());
    assert!(lib.set_default_family(&family).is_ok());
}
