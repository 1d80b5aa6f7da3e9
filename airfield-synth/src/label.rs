/// Normalized bounding-box labels: `class_id center_x center_y width height`.
use clap::ValueEnum;
use constants::coordinate_system::{NormalizedBox, clamp_box, denormalize_box, normalize_box};
use serde::Serialize;
use std::fmt;

/// What to do with boxes that hang over the canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// Write the raw values, which may leave [0, 1].
    Keep,
    /// Clip the box to the canvas and recompute center and size.
    #[default]
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxLabel {
    pub class_id: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxLabel {
    /// Label for a sprite centered at `center` with pixel `footprint` on a
    /// `canvas` sized background.
    pub fn from_placement(
        class_id: u32,
        center: (i32, i32),
        footprint: (u32, u32),
        canvas: (u32, u32),
        policy: LabelPolicy,
    ) -> Self {
        let raw = normalize_box(
            (center.0 as f64, center.1 as f64),
            (footprint.0 as f64, footprint.1 as f64),
            canvas.0,
            canvas.1,
        );
        let b = match policy {
            LabelPolicy::Keep => raw,
            LabelPolicy::Clamp => clamp_box(raw),
        };
        Self::from_box(class_id, b)
    }

    pub fn from_box(class_id: u32, b: NormalizedBox) -> Self {
        Self {
            class_id,
            center_x: b[0],
            center_y: b[1],
            width: b[2],
            height: b[3],
        }
    }

    pub fn as_box(&self) -> NormalizedBox {
        [self.center_x, self.center_y, self.width, self.height]
    }

    /// Pixel rectangle `(x0, y0, x1, y1)` on a canvas of the given size.
    pub fn pixel_rect(&self, canvas_width: u32, canvas_height: u32) -> (f64, f64, f64, f64) {
        let ((cx, cy), (w, h)) = denormalize_box(self.as_box(), canvas_width, canvas_height);
        (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Parses one label line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let class_id = fields.next()?.parse().ok()?;
        let mut values = [0.0; 4];
        for v in values.iter_mut() {
            *v = fields.next()?.parse().ok()?;
        }
        if fields.next().is_some() {
            return None;
        }
        Some(Self::from_box(class_id, values))
    }
}

impl fmt::Display for BoxLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:?} {:?} {:?}",
            self.class_id, self.center_x, self.center_y, self.width, self.height
        )
    }
}

/// Newline-joined label file body, no trailing newline.
pub fn format_labels(labels: &[BoxLabel]) -> String {
    labels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
