/// Normalized box: [center_x, center_y, width, height] as fractions of the canvas.
pub type NormalizedBox = [f64; 4];

/// Convert a pixel-space center and size into canvas fractions.
/// Values are not clamped; boxes hanging over the edge leave [0, 1].
pub fn normalize_box(
    center: (f64, f64),
    size: (f64, f64),
    canvas_width: u32,
    canvas_height: u32,
) -> NormalizedBox {
    let w = canvas_width as f64;
    let h = canvas_height as f64;
    [center.0 / w, center.1 / h, size.0 / w, size.1 / h]
}

/// Inverse of `normalize_box`: returns ((center_x, center_y), (width, height)) in pixels.
pub fn denormalize_box(
    normalized: NormalizedBox,
    canvas_width: u32,
    canvas_height: u32,
) -> ((f64, f64), (f64, f64)) {
    let w = canvas_width as f64;
    let h = canvas_height as f64;
    (
        (normalized[0] * w, normalized[1] * h),
        (normalized[2] * w, normalized[3] * h),
    )
}

/// Clip a normalized box to the unit square and recompute its center and size
/// from the clipped edges. A box fully outside collapses to zero size on the
/// nearest edge.
pub fn clamp_box(normalized: NormalizedBox) -> NormalizedBox {
    let [cx, cy, bw, bh] = normalized;
    let x0 = (cx - bw / 2.0).clamp(0.0, 1.0);
    let x1 = (cx + bw / 2.0).clamp(0.0, 1.0);
    let y0 = (cy - bh / 2.0).clamp(0.0, 1.0);
    let y1 = (cy + bh / 2.0).clamp(0.0, 1.0);
    [(x0 + x1) / 2.0, (y0 + y1) / 2.0, x1 - x0, y1 - y0]
}
