/// Scene compositor: places sprites on one background copy, paints shadows and
/// aircraft, applies interference and derives labels.
use crate::background::BackgroundAsset;
use crate::enhance::{
    add_gaussian_noise, adjust_brightness, adjust_color, adjust_contrast, adjust_sharpness,
    blur_alpha, gaussian_blur, paste_with_alpha, scale_alpha,
};
use crate::error::{Result, SynthError};
use crate::label::{BoxLabel, LabelPolicy};
use crate::sprite::{SpriteCatalog, SpriteInstance};
use constants::render_settings::{INTERFERENCE, PLANE_RANGES, Range, SHADOW_RANGES};
use constants::sprite::SPAWN_JITTER_PX;
use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};
use rand::Rng;
use rand::seq::index;
use std::path::Path;

fn sample<R: Rng + ?Sized>(range: Range, rng: &mut R) -> f32 {
    rng.gen_range(range.min..=range.max)
}

fn resize_to(image: &RgbaImage, footprint: (u32, u32)) -> RgbaImage {
    imageops::resize(
        image,
        footprint.0.max(1),
        footprint.1.max(1),
        FilterType::CatmullRom,
    )
}

/// Lighting shared by every shadow in one scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub saturation: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
    pub blur_radius: f32,
    pub alpha: f32,
    pub offset: (i32, i32),
}

impl ShadowStyle {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let r = SHADOW_RANGES;
        Self {
            saturation: sample(r.saturation, rng),
            brightness: sample(r.brightness, rng),
            contrast: sample(r.contrast, rng),
            sharpness: sample(r.sharpness, rng),
            blur_radius: sample(r.blur_radius, rng),
            alpha: sample(r.alpha, rng),
            offset: (
                rng.gen_range(-r.max_offset..=r.max_offset),
                rng.gen_range(-r.max_offset..=r.max_offset),
            ),
        }
    }

    /// Alpha scale, then saturation, brightness, contrast, sharpness, blur,
    /// then resize to the footprint.
    pub fn shade(&self, sprite: &RgbaImage, footprint: (u32, u32)) -> RgbaImage {
        let shadow = scale_alpha(sprite, self.alpha);
        let shadow = adjust_color(&shadow, self.saturation);
        let shadow = adjust_brightness(&shadow, self.brightness);
        let shadow = adjust_contrast(&shadow, self.contrast);
        let shadow = adjust_sharpness(&shadow, self.sharpness);
        let shadow = gaussian_blur(&shadow, self.blur_radius);
        resize_to(&shadow, footprint)
    }
}

/// Per-placement aircraft variation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneStyle {
    pub saturation: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
    pub alpha_blur_radius: f32,
}

impl PlaneStyle {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let r = PLANE_RANGES;
        Self {
            saturation: sample(r.saturation, rng),
            brightness: sample(r.brightness, rng),
            contrast: sample(r.contrast, rng),
            sharpness: sample(r.sharpness, rng),
            alpha_blur_radius: sample(r.alpha_blur_radius, rng),
        }
    }

    /// Softens the silhouette through the alpha channel only, then applies the
    /// four enhancements in the same order as shadows and resizes.
    pub fn paint(&self, sprite: &RgbaImage, footprint: (u32, u32)) -> RgbaImage {
        let plane = blur_alpha(sprite, self.alpha_blur_radius);
        let plane = adjust_color(&plane, self.saturation);
        let plane = adjust_brightness(&plane, self.brightness);
        let plane = adjust_contrast(&plane, self.contrast);
        let plane = adjust_sharpness(&plane, self.sharpness);
        resize_to(&plane, footprint)
    }
}

/// Whole-image sharpen or soften, plus optional sensor noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interference {
    pub sharpness: f32,
    pub noise_sigma: Option<f32>,
}

impl Interference {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let s = INTERFERENCE;
        let sharpness = if rng.gen_bool(s.soften_probability) {
            sample(s.soften, rng)
        } else {
            sample(s.sharpen, rng)
        };
        let noise_sigma = rng
            .gen_bool(s.noise_probability)
            .then(|| sample(s.noise_sigma, rng));
        Self {
            sharpness,
            noise_sigma,
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let mut out = adjust_sharpness(image, self.sharpness);
        if let Some(sigma) = self.noise_sigma {
            add_gaussian_noise(&mut out, sigma, rng);
        }
        out
    }
}

/// One sprite bound to one jittered spawn point.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub sprite: SpriteInstance<'a>,
    pub center: (i32, i32),
    pub footprint: (u32, u32),
}

impl Placement<'_> {
    /// Top-left paste corner (floor-halved footprint).
    pub fn top_left(&self) -> (i64, i64) {
        (
            self.center.0 as i64 - (self.footprint.0 / 2) as i64,
            self.center.1 as i64 - (self.footprint.1 / 2) as i64,
        )
    }
}

/// A composed but not yet rendered sample. Owns its canvas; the catalog
/// background is only read.
pub struct Scene<'a> {
    background: &'a BackgroundAsset,
    canvas: RgbImage,
    placements: Vec<Placement<'a>>,
    shadow: ShadowStyle,
}

/// Final pixels and one label per placement, in placement order.
#[derive(Debug, Clone)]
pub struct RenderedScene {
    pub background_id: u64,
    pub image: RgbImage,
    pub labels: Vec<BoxLabel>,
    pub interference: Interference,
}

impl<'a> Scene<'a> {
    /// Subsamples `1..=len` distinct spawn points, jitters each, draws a sprite
    /// for its size class and samples the scene-wide shadow style.
    pub fn compose<R: Rng + ?Sized>(
        background: &'a BackgroundAsset,
        sprites: &'a SpriteCatalog,
        rng: &mut R,
    ) -> Result<Self> {
        let points = &background.spawn_points;
        if points.is_empty() {
            return Err(SynthError::dataset(
                Path::new(&format!("background/{}", background.id)),
                "background has no spawn points",
            ));
        }
        let count = rng.gen_range(1..=points.len());

        let mut placements = Vec::with_capacity(count);
        for i in index::sample(rng, points.len(), count).into_iter() {
            let point = points[i];
            let center = point.jittered(SPAWN_JITTER_PX, rng);
            let sprite = sprites.select_sprite(point.size_class, rng)?;
            let footprint = sprite.footprint(background.pixel_width(), background.meter_width);
            placements.push(Placement {
                sprite,
                center,
                footprint,
            });
        }

        let shadow = ShadowStyle::sample(rng);
        Ok(Self::with_placements(background, placements, shadow))
    }

    pub fn with_placements(
        background: &'a BackgroundAsset,
        placements: Vec<Placement<'a>>,
        shadow: ShadowStyle,
    ) -> Self {
        Self {
            background,
            canvas: background.image.clone(),
            placements,
            shadow,
        }
    }

    pub fn placements(&self) -> &[Placement<'a>] {
        &self.placements
    }

    /// Every shadow first, then every aircraft, so later bodies cover earlier
    /// shadows. Labels follow placement order.
    pub fn render<R: Rng + ?Sized>(mut self, policy: LabelPolicy, rng: &mut R) -> RenderedScene {
        let (dx, dy) = self.shadow.offset;
        for placement in &self.placements {
            let shadow = self.shadow.shade(placement.sprite.image(), placement.footprint);
            let (x, y) = placement.top_left();
            paste_with_alpha(&mut self.canvas, &shadow, x + dx as i64, y + dy as i64);
        }

        for placement in &self.placements {
            let plane = PlaneStyle::sample(rng).paint(placement.sprite.image(), placement.footprint);
            let (x, y) = placement.top_left();
            paste_with_alpha(&mut self.canvas, &plane, x, y);
        }

        let labels = self.labels(policy);

        let interference = Interference::sample(rng);
        let image = interference.apply(&self.canvas, rng);

        RenderedScene {
            background_id: self.background.id,
            image,
            labels,
            interference,
        }
    }

    pub fn labels(&self, policy: LabelPolicy) -> Vec<BoxLabel> {
        let canvas = self.canvas.dimensions();
        self.placements
            .iter()
            .map(|p| BoxLabel::from_placement(p.sprite.class_id(), p.center, p.footprint, canvas, policy))
            .collect()
    }
}
