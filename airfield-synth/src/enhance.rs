/// Photometric operators used for shadows, aircraft and whole-image interference.
///
/// The four enhancement operators share one model: build a degenerate version of
/// the image, then move away from it by `factor`:
/// `out = degenerate + factor * (image - degenerate)`, clipped to the u8 range.
/// A factor of 1 returns the image unchanged, 0 returns the degenerate image and
/// values above 1 extrapolate. Alpha is never touched by these operators.
///
/// Operators accept RGB8 and RGBA8 buffers.
use image::{GrayImage, ImageBuffer, Pixel, RgbImage, RgbaImage, imageops};
use rand::Rng;
use rand_distr::{Distribution, Normal};

type Buffer<P> = ImageBuffer<P, Vec<u8>>;

fn luma(c: &[u8]) -> f32 {
    0.299 * c[0] as f32 + 0.587 * c[1] as f32 + 0.114 * c[2] as f32
}

fn blend_channel(degenerate: f32, value: u8, factor: f32) -> u8 {
    (degenerate + factor * (value as f32 - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Saturation: degenerate image is the grayscale rendition.
pub fn adjust_color<P: Pixel<Subpixel = u8>>(image: &Buffer<P>, factor: f32) -> Buffer<P> {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let c = px.channels_mut();
        let gray = luma(c).round();
        for v in c.iter_mut().take(3) {
            *v = blend_channel(gray, *v, factor);
        }
    }
    out
}

/// Brightness: degenerate image is black.
pub fn adjust_brightness<P: Pixel<Subpixel = u8>>(image: &Buffer<P>, factor: f32) -> Buffer<P> {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        for v in px.channels_mut().iter_mut().take(3) {
            *v = blend_channel(0.0, *v, factor);
        }
    }
    out
}

/// Contrast: degenerate image is a flat field of the mean luma.
pub fn adjust_contrast<P: Pixel<Subpixel = u8>>(image: &Buffer<P>, factor: f32) -> Buffer<P> {
    let count = (image.width() as f64 * image.height() as f64).max(1.0);
    let total: f64 = image.pixels().map(|p| luma(p.channels()).round() as f64).sum();
    let mean = (total / count + 0.5).floor() as f32;

    let mut out = image.clone();
    for px in out.pixels_mut() {
        for v in px.channels_mut().iter_mut().take(3) {
            *v = blend_channel(mean, *v, factor);
        }
    }
    out
}

/// Sharpness: degenerate image is a 3x3 smoothing pass (centre weight 5, ring
/// weight 1). Border pixels have no full neighbourhood and stay as they are.
pub fn adjust_sharpness<P: Pixel<Subpixel = u8>>(image: &Buffer<P>, factor: f32) -> Buffer<P> {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut smooth = [0.0f32; 3];
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    let weight = if nx == x && ny == y { 5.0 } else { 1.0 };
                    let c = image.get_pixel(nx, ny).channels();
                    for (s, v) in smooth.iter_mut().zip(c.iter()) {
                        *s += weight * *v as f32;
                    }
                }
            }
            let px = out.get_pixel_mut(x, y).channels_mut();
            for (v, s) in px.iter_mut().zip(smooth.iter()) {
                *v = blend_channel((s / 13.0).round(), *v, factor);
            }
        }
    }
    out
}

/// Gaussian blur of every channel, alpha included.
pub fn gaussian_blur(image: &RgbaImage, radius: f32) -> RgbaImage {
    imageops::blur(image, radius)
}

/// Blurs only the alpha channel, softening the silhouette but not the surface.
pub fn blur_alpha(image: &RgbaImage, radius: f32) -> RgbaImage {
    let alpha = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([image.get_pixel(x, y).0[3]])
    });
    let alpha = imageops::blur(&alpha, radius);

    let mut out = image.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        px.0[3] = alpha.get_pixel(x, y).0[0];
    }
    out
}

/// Multiplies the alpha channel by `factor`.
pub fn scale_alpha(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        px.0[3] = (px.0[3] as f32 * factor).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Adds zero-mean gaussian noise to every channel and clips to [0, 255].
pub fn add_gaussian_noise<R: Rng + ?Sized>(image: &mut RgbImage, sigma: f32, rng: &mut R) {
    // Non-finite or negative sigma leaves the image untouched.
    let Ok(normal) = Normal::new(0.0f32, sigma) else {
        return;
    };
    for v in image.iter_mut() {
        *v = (*v as f32 + normal.sample(rng)).clamp(0.0, 255.0) as u8;
    }
}

/// Composites `sprite` onto `canvas` with its own alpha as the mask. The
/// top-left corner may be negative or past the canvas; off-canvas pixels are
/// clipped.
pub fn paste_with_alpha(canvas: &mut RgbImage, sprite: &RgbaImage, left: i64, top: i64) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

    for (sx, sy, px) in sprite.enumerate_pixels() {
        let x = left + sx as i64;
        let y = top + sy as i64;
        if x < 0 || y < 0 || x >= cw || y >= ch {
            continue;
        }

        let [r, g, b, a] = px.0;
        if a == 0 {
            continue;
        }
        let alpha = a as f32 / 255.0;
        let dst = canvas.get_pixel_mut(x as u32, y as u32);
        for (d, s) in dst.0.iter_mut().zip([r, g, b]) {
            *d = (s as f32 * alpha + *d as f32 * (1.0 - alpha)).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient() -> RgbaImage {
        RgbaImage::from_fn(8, 6, |x, y| {
            Rgba([(x * 30) as u8, (y * 40) as u8, 100, (x * 20 + 50) as u8])
        })
    }

    #[test]
    fn unit_factor_is_identity_for_every_operator() {
        let img = gradient();
        assert_eq!(adjust_color(&img, 1.0), img);
        assert_eq!(adjust_brightness(&img, 1.0), img);
        assert_eq!(adjust_contrast(&img, 1.0), img);
        assert_eq!(adjust_sharpness(&img, 1.0), img);
    }

    #[test]
    fn operators_preserve_alpha() {
        let img = gradient();
        for out in [
            adjust_color(&img, 0.3),
            adjust_brightness(&img, 0.3),
            adjust_contrast(&img, 0.3),
            adjust_sharpness(&img, 1.8),
        ] {
            for (a, b) in out.pixels().zip(img.pixels()) {
                assert_eq!(a.0[3], b.0[3]);
            }
        }
    }

    #[test]
    fn zero_saturation_is_gray() {
        let out = adjust_color(&gradient(), 0.0);
        for px in out.pixels() {
            assert_eq!(px.0[0], px.0[1]);
            assert_eq!(px.0[1], px.0[2]);
        }
    }

    #[test]
    fn brightness_scales_channels() {
        let img = RgbImage::from_pixel(2, 2, Rgb([200, 100, 10]));
        let out = adjust_brightness(&img, 0.5);
        assert_eq!(out.get_pixel(0, 0).0, [100, 50, 5]);
        let out = adjust_brightness(&img, 2.0);
        assert_eq!(out.get_pixel(1, 1).0, [255, 200, 20]);
    }

    #[test]
    fn zero_contrast_flattens_to_mean() {
        let out = adjust_contrast(&gradient(), 0.0);
        let first = out.get_pixel(0, 0).0;
        assert!(out.pixels().all(|p| p.0[..3] == first[..3]));
    }

    #[test]
    fn sharpness_leaves_flat_images_alone() {
        let img = RgbImage::from_pixel(5, 5, Rgb([90, 90, 90]));
        assert_eq!(adjust_sharpness(&img, 0.2), img);
        assert_eq!(adjust_sharpness(&img, 1.9), img);
    }

    #[test]
    fn alpha_blur_keeps_colour() {
        let img = gradient();
        let out = blur_alpha(&img, 2.0);
        for (a, b) in out.pixels().zip(img.pixels()) {
            assert_eq!(a.0[..3], b.0[..3]);
        }
    }

    #[test]
    fn scale_alpha_multiplies() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 200]));
        assert_eq!(scale_alpha(&img, 0.5).get_pixel(0, 0).0, [1, 2, 3, 100]);
    }

    #[test]
    fn paste_blends_and_clips() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let mut sprite = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        sprite.put_pixel(2, 2, Rgba([200, 100, 0, 0]));
        sprite.put_pixel(1, 2, Rgba([200, 100, 0, 51]));

        paste_with_alpha(&mut canvas, &sprite, -1, 1);

        assert_eq!(canvas.get_pixel(0, 1).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [255, 255, 255]);
        // 20% opaque pixel.
        assert_eq!(canvas.get_pixel(0, 3).0, [40, 20, 0]);
        // Fully transparent pixel leaves the canvas untouched.
        assert_eq!(canvas.get_pixel(1, 3).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(2, 1).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(3, 3).0, [0, 0, 0]);
    }

    #[test]
    fn noise_perturbs_within_range() {
        let mut img = RgbImage::from_pixel(16, 16, Rgb([128, 0, 255]));
        let before = img.clone();
        let mut rng = StdRng::seed_from_u64(11);
        add_gaussian_noise(&mut img, 10.0, &mut rng);
        assert_ne!(img, before);
        // Saturated channels can only move inward.
        assert!(img.pixels().any(|p| p.0[1] > 0));
        assert!(img.pixels().any(|p| p.0[2] < 255));
    }
}
