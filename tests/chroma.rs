use foxy_jumpscare::chroma::ChromaKey;

fn reference_key(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    g > 80 && g - r > 30 && g - b > 30
}

#[test]
fn matches_reference_predicate_on_sampled_colors() {
    let key = ChromaKey::default();
    for r in (0..=255u16).step_by(7) {
        for g in (0..=255u16).step_by(5) {
            for b in (0..=255u16).step_by(11) {
                let (r, g, b) = (r as u8, g as u8, b as u8);
                assert_eq!(
                    key.is_key(r, g, b),
                    reference_key(r, g, b),
                    "mismatch at rgb({r}, {g}, {b})"
                );
                let expected = if reference_key(r, g, b) { 0 } else { 255 };
                assert_eq!(key.alpha(r, g, b), expected);
            }
        }
    }
}

#[test]
fn composite_keeps_color_and_sets_alpha() {
    let key = ChromaKey::default();
    // BGR: pure green, pure red, pure black, pale green
    let bgr = [0, 255, 0, 0, 0, 255, 0, 0, 0, 120, 140, 120];
    let image = key.composite(&bgr, 2, 2).unwrap();
    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 0]);
    assert_eq!(image.get_pixel(1, 0).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(0, 1).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(1, 1).0, [120, 140, 120, 255]);
}

#[test]
fn composite_rejects_short_buffers() {
    let key = ChromaKey::default();
    assert!(key.composite(&[0; 11], 2, 2).is_err());
    assert!(key.composite(&[0; 13], 2, 2).is_err());
}

#[test]
fn custom_thresholds() {
    let key = ChromaKey::new(200, 10);
    assert!(!key.is_key(0, 200, 0));
    assert!(key.is_key(190, 201, 190));
    assert!(!key.is_key(191, 201, 0));
}
