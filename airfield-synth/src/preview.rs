//! Label overlay for eyeballing generated samples.
//!
//! Every label of a sample becomes an SVG rectangle outline. The SVG is
//! rendered with resvg and blended onto a copy of the composite, so misplaced
//! or mis-scaled boxes are easy to spot.

use crate::error::{Result, SynthError};
use crate::label::BoxLabel;
use image::{Rgb, RgbImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

/// Outline colour for preview boxes.
pub const BOX_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline stroke width in pixels.
pub const BOX_THICKNESS: f64 = 2.0;

/// Returns a copy of `image` with each label drawn as an outline. Boxes are
/// clipped to the image.
pub fn draw_label_boxes(image: &RgbImage, labels: &[BoxLabel]) -> Result<RgbImage> {
    let (w, h) = image.dimensions();
    let [r, g, b] = BOX_COLOUR.0;
    let stroke = format!("#{:02x}{:02x}{:02x}", r, g, b);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        w, h
    );
    for label in labels {
        let (x0, y0, x1, y1) = label.pixel_rect(w, h);
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            x0,
            y0,
            x1 - x0,
            y1 - y0,
            stroke,
            BOX_THICKNESS
        ));
    }
    svg.push_str("</svg>");

    overlay_svg(image, &svg)
}

/// Renders `svg` at the image's size and blends it over a copy of `image`.
fn overlay_svg(image: &RgbImage, svg: &str) -> Result<RgbImage> {
    let tree = Tree::from_str(svg, &Options::default())
        .map_err(|e| SynthError::Overlay(e.to_string()))?;
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| SynthError::Overlay("cannot allocate overlay pixmap".to_string()))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    let mut out = image.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let Some(over) = pixmap.pixel(x, y) else {
            continue;
        };
        if over.alpha() == 0 {
            continue;
        }
        // Pixmap colours are premultiplied by alpha.
        let keep = 255 - over.alpha() as u32;
        for (c, o) in px.0.iter_mut().zip([over.red(), over.green(), over.blue()]) {
            *c = (o as u32 + (*c as u32 * keep + 127) / 255).min(255) as u8;
        }
    }
    Ok(out)
}
