use anyhow::{bail, Result};
use image::RgbaImage;

pub const GREEN_MIN: u8 = 80;
pub const GREEN_DIFF: u8 = 30;

/// Green-screen key. A pixel is keyed out (alpha 0) when green is above
/// `green_min` and beats both red and blue by more than `green_diff`;
/// every other pixel is fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromaKey {
    pub green_min: u8,
    pub green_diff: u8,
}

impl Default for ChromaKey {
    fn default() -> Self {
        Self {
            green_min: GREEN_MIN,
            green_diff: GREEN_DIFF,
        }
    }
}

impl ChromaKey {
    pub fn new(green_min: u8, green_diff: u8) -> Self {
        Self {
            green_min,
            green_diff,
        }
    }

    pub fn is_key(&self, r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (r as u16, g as u16, b as u16);
        let diff = self.green_diff as u16;
        g > self.green_min as u16 && g > r + diff && g > b + diff
    }

    pub fn alpha(&self, r: u8, g: u8, b: u8) -> u8 {
        if self.is_key(r, g, b) {
            0
        } else {
            255
        }
    }

    /// Convert a tightly packed BGR frame into RGBA with keyed pixels made
    /// transparent.
    pub fn composite(&self, bgr: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
        let expected = width as usize * height as usize * 3;
        if bgr.len() != expected {
            bail!(
                "frame buffer is {} bytes, expected {expected} for {width}x{height} BGR",
                bgr.len()
            );
        }

        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for px in bgr.chunks_exact(3) {
            let (b, g, r) = (px[0], px[1], px[2]);
            rgba.extend_from_slice(&[r, g, b, self.alpha(r, g, b)]);
        }

        match RgbaImage::from_raw(width, height, rgba) {
            Some(image) => Ok(image),
            None => bail!("unable to build {width}x{height} RGBA image"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_order_is_swapped() {
        let key = ChromaKey::default();
        let out = key.composite(&[10, 20, 30], 1, 1).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [30, 20, 10, 255]);
    }

    #[test]
    fn thresholds_are_strict() {
        let key = ChromaKey::default();
        assert!(!key.is_key(0, 80, 0));
        assert!(key.is_key(0, 81, 0));
        assert!(key.is_key(50, 81, 0));
        assert!(!key.is_key(51, 81, 0));
        assert!(!key.is_key(100, 130, 0));
        assert!(key.is_key(100, 131, 100));
    }

    #[test]
    fn no_overflow_near_channel_max() {
        let key = ChromaKey::default();
        assert!(!key.is_key(250, 255, 0));
        assert!(key.is_key(224, 255, 224));
        assert!(!key.is_key(225, 255, 0));
    }
}
