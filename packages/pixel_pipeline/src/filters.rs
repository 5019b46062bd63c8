//! The five per-image filters, applied in a fixed order by the pipeline:
//! grayscale, gaussian blur, sobel edge detection, sharpen, brightness.

use image::imageops::filter3x3;
use image::{GrayImage, Luma, RgbImage};

/// 3x3 gaussian kernel, normalized.
const GAUSSIAN_3X3: [f32; 9] = [
    1.0 / 16.0,
    2.0 / 16.0,
    1.0 / 16.0,
    2.0 / 16.0,
    4.0 / 16.0,
    2.0 / 16.0,
    1.0 / 16.0,
    2.0 / 16.0,
    1.0 / 16.0,
];

/// 3x3 sharpening kernel.
const SHARPEN_3X3: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Converts to grayscale using the Rec. 601 luminance formula
/// `Y = 0.299 R + 0.587 G + 0.114 B`.
#[must_use]
pub fn grayscale(image: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;

        let luminance = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "luminance of u8 channels is always within 0..=255"
        )]
        out.put_pixel(x, y, Luma([luminance as u8]));
    }

    out
}

/// Applies a 3x3 gaussian blur.
#[must_use]
pub fn gaussian_blur(image: &GrayImage) -> GrayImage {
    filter3x3(image, &GAUSSIAN_3X3)
}

/// Sobel edge detection: gradient magnitude of the horizontal and vertical
/// 3x3 sobel responses, clamped to the u8 range. Edges are sampled with
/// clamp-to-border semantics.
#[must_use]
pub fn sobel_edge(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let sample = |dx: i64, dy: i64| -> f64 {
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "clamped into the valid coordinate range"
                )]
                let sx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "clamped into the valid coordinate range"
                )]
                let sy = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;

                f64::from(image.get_pixel(sx, sy).0[0])
            };

            let gx = -sample(-1, -1) - 2.0 * sample(-1, 0) - sample(-1, 1)
                + sample(1, -1)
                + 2.0 * sample(1, 0)
                + sample(1, 1);
            let gy = -sample(-1, -1) - 2.0 * sample(0, -1) - sample(1, -1)
                + sample(-1, 1)
                + 2.0 * sample(0, 1)
                + sample(1, 1);

            let magnitude = (gx * gx + gy * gy).sqrt().min(255.0);

            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "magnitude is clamped to 0..=255"
            )]
            out.put_pixel(x, y, Luma([magnitude as u8]));
        }
    }

    out
}

/// Sharpens with a 3x3 kernel, clamping to the u8 range.
#[must_use]
pub fn sharpen(image: &GrayImage) -> GrayImage {
    filter3x3(image, &SHARPEN_3X3)
}

/// Adjusts brightness based on the image's own mean: dark images (mean
/// below 128) are brightened by 30, bright images darkened by 30.
#[must_use]
pub fn adjust_brightness(image: &GrayImage) -> GrayImage {
    if image.as_raw().is_empty() {
        return image.clone();
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "pixel counts far below the f64 integer limit"
    )]
    let mean = image.pixels().map(|p| f64::from(p.0[0])).sum::<f64>()
        / image.as_raw().len() as f64;

    let delta: i16 = if mean < 128.0 { 30 } else { -30 };

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "clamped into the u8 range"
        )]
        {
            pixel.0[0] = (i16::from(pixel.0[0]) + delta).clamp(0, 255) as u8;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn grayscale_uses_the_luminance_weights() {
        let red = RgbImage::from_pixel(1, 1, image::Rgb([255, 0, 0]));
        let green = RgbImage::from_pixel(1, 1, image::Rgb([0, 255, 0]));
        let blue = RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 255]));

        assert_eq!(grayscale(&red).get_pixel(0, 0).0[0], 76);
        assert_eq!(grayscale(&green).get_pixel(0, 0).0[0], 149);
        assert_eq!(grayscale(&blue).get_pixel(0, 0).0[0], 29);
    }

    #[test]
    fn blur_preserves_uniform_images() {
        let blurred = gaussian_blur(&uniform(5, 5, 200));

        assert_eq!(blurred.get_pixel(2, 2).0[0], 200);
    }

    #[test]
    fn sobel_of_flat_image_is_zero() {
        let edges = sobel_edge(&uniform(6, 6, 80));

        assert!(edges.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn sobel_finds_a_vertical_edge() {
        let mut image = uniform(6, 6, 0);
        for y in 0..6 {
            for x in 3..6 {
                image.put_pixel(x, y, Luma([255]));
            }
        }

        let edges = sobel_edge(&image);

        assert!(edges.get_pixel(3, 3).0[0] > 0);
        assert_eq!(edges.get_pixel(0, 3).0[0], 0);
    }

    #[test]
    fn brightness_lifts_dark_images_and_dims_bright_ones() {
        let dark = adjust_brightness(&uniform(2, 2, 10));
        let bright = adjust_brightness(&uniform(2, 2, 240));

        assert!(dark.pixels().all(|p| p.0[0] == 40));
        assert!(bright.pixels().all(|p| p.0[0] == 210));
    }

    #[test]
    fn brightness_clamps_at_the_range_ends() {
        let near_black = adjust_brightness(&uniform(1, 1, 250));
        // Mean 250 is bright, so the image is dimmed, not clamped here...
        assert_eq!(near_black.get_pixel(0, 0).0[0], 220);

        let near_white = adjust_brightness(&uniform(1, 1, 120));
        // ...while a dark mean brightens and 120 + 30 stays in range.
        assert_eq!(near_white.get_pixel(0, 0).0[0], 150);
    }
}
