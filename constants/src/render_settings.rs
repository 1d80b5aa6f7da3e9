/// Inclusive sampling range for one randomized photometric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Shadow style ranges, sampled once per scene.
#[derive(Debug, Clone, Copy)]
pub struct ShadowRanges {
    pub saturation: Range,
    pub brightness: Range,
    pub contrast: Range,
    pub sharpness: Range,
    pub blur_radius: Range,
    pub alpha: Range,
    /// Offset is drawn from [-max_offset, max_offset] on both axes.
    pub max_offset: i32,
}

pub const SHADOW_RANGES: ShadowRanges = ShadowRanges {
    saturation: Range::new(0.05, 1.0),
    brightness: Range::new(0.1, 0.7),
    contrast: Range::new(0.1, 0.6),
    sharpness: Range::new(0.0, 0.7),
    blur_radius: Range::new(2.0, 10.0),
    alpha: Range::new(0.55, 0.95),
    max_offset: 6,
};

/// Per-placement aircraft variation ranges.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRanges {
    pub saturation: Range,
    pub brightness: Range,
    pub contrast: Range,
    pub sharpness: Range,
    pub alpha_blur_radius: Range,
}

pub const PLANE_RANGES: PlaneRanges = PlaneRanges {
    saturation: Range::new(0.8, 1.2),
    brightness: Range::new(0.8, 1.2),
    contrast: Range::new(0.8, 1.2),
    sharpness: Range::new(0.4, 1.6),
    alpha_blur_radius: Range::new(0.5, 3.0),
};

/// Whole-image interference applied after compositing.
#[derive(Debug, Clone, Copy)]
pub struct InterferenceSettings {
    pub soften_probability: f64,
    pub soften: Range,
    pub sharpen: Range,
    pub noise_probability: f64,
    pub noise_sigma: Range,
}

pub const INTERFERENCE: InterferenceSettings = InterferenceSettings {
    soften_probability: 0.5,
    soften: Range::new(0.1, 0.8),
    sharpen: Range::new(1.2, 1.9),
    noise_probability: 0.5,
    noise_sigma: Range::new(2.0, 20.0),
};
