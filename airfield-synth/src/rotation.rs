/// Alpha-preserving sprite rotation with canvas expansion.
use image::{Rgba, RgbaImage, imageops};

/// Rotates `sprite` counter-clockwise by `degrees`, growing the canvas to the
/// rotated bounding box so no opaque pixel is cropped. Uncovered pixels are
/// fully transparent. Quarter turns are exact transposes.
pub fn rotate_expand(sprite: &RgbaImage, degrees: u32) -> RgbaImage {
    match degrees % 360 {
        0 => sprite.clone(),
        90 => imageops::rotate270(sprite),
        180 => imageops::rotate180(sprite),
        270 => imageops::rotate90(sprite),
        angle => rotate_nearest(sprite, (angle as f64).to_radians()),
    }
}

/// Nearest-neighbour inverse mapping around the sprite center.
fn rotate_nearest(sprite: &RgbaImage, theta: f64) -> RgbaImage {
    let (w, h) = (sprite.width() as f64, sprite.height() as f64);
    let (sin, cos) = theta.sin_cos();

    // Epsilon keeps float noise from adding a spurious row or column.
    let new_w = (w * cos.abs() + h * sin.abs() - 1e-6).ceil().max(1.0) as u32;
    let new_h = (w * sin.abs() + h * cos.abs() - 1e-6).ceil().max(1.0) as u32;

    let mut rotated = RgbaImage::from_pixel(new_w, new_h, Rgba([0, 0, 0, 0]));
    let (half_w, half_h) = (new_w as f64 / 2.0, new_h as f64 / 2.0);

    for (x, y, pixel) in rotated.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - half_w;
        let dy = y as f64 + 0.5 - half_h;

        // Destination to source: undo a visual counter-clockwise turn (y down).
        let sx = dx * cos - dy * sin + w / 2.0;
        let sy = dx * sin + dy * cos + h / 2.0;

        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *pixel = *sprite.get_pixel(sx as u32, sy as u32);
        }
    }

    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::sprite::rotation_angles;

    fn opaque(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255]))
    }

    fn opaque_count(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn zero_degrees_is_identity() {
        let img = opaque(7, 3);
        assert_eq!(rotate_expand(&img, 0), img);
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let mut img = opaque(6, 2);
        img.put_pixel(5, 0, Rgba([0, 255, 0, 255]));
        let rotated = rotate_expand(&img, 90);
        assert_eq!(rotated.dimensions(), (2, 6));
        // Top-right corner moves to top-left under a counter-clockwise turn.
        assert_eq!(rotated.get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn diagonal_turn_expands_canvas() {
        let rotated = rotate_expand(&opaque(10, 10), 45);
        assert_eq!(rotated.dimensions(), (15, 15));
        // Canvas corners are outside the rotated square.
        assert_eq!(rotated.get_pixel(0, 0).0[3], 0);
        assert_eq!(rotated.get_pixel(14, 14).0[3], 0);
        assert_eq!(rotated.get_pixel(7, 7).0[3], 255);
    }

    #[test]
    fn every_angle_keeps_the_sprite_area() {
        let img = opaque(40, 20);
        for angle in rotation_angles() {
            let rotated = rotate_expand(&img, angle);
            let area = opaque_count(&rotated) as f64;
            assert!(
                (area - 800.0).abs() / 800.0 < 0.1,
                "angle {} changed area to {}",
                angle,
                area
            );
        }
    }
}
