/// Aircraft sprite catalog: cut-out discovery, wingspan labels, rotation cache
/// and size-class aware selection.
use crate::class_map::ClassMap;
use crate::error::{Result, SynthError};
use crate::rotation::rotate_expand;
use crate::spawn_point::SizeClass;
use constants::class::is_small_aircraft;
use constants::sprite::{ROTATION_COUNT, SPRITE_IMAGE_DIR, SPRITE_SIZE_DIR, rotation_angles};
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One precomputed rotation of a sprite.
#[derive(Debug, Clone)]
pub struct RotatedSprite {
    pub angle: u32,
    pub image: RgbaImage,
}

/// A cut-out aircraft with its real-world wingspan.
#[derive(Debug, Clone)]
pub struct SpriteAsset {
    /// File stem, e.g. `su24_1`.
    pub key: String,
    /// Aircraft type, the key up to its last underscore.
    pub base_type: String,
    /// Instance variant, the key after its last underscore.
    pub variant: String,
    pub class_id: u32,
    pub wingspan_m: f64,
    pub image: RgbaImage,
    rotations: Vec<RotatedSprite>,
}

impl SpriteAsset {
    pub fn new(key: &str, class_id: u32, wingspan_m: f64, image: RgbaImage) -> Option<Self> {
        let (base_type, variant) = split_key(key)?;
        Some(Self {
            key: key.to_string(),
            base_type: base_type.to_string(),
            variant: variant.to_string(),
            class_id,
            wingspan_m,
            image,
            rotations: Vec::new(),
        })
    }

    fn prerotate(&mut self) {
        self.rotations = rotation_angles()
            .map(|angle| RotatedSprite {
                angle,
                image: rotate_expand(&self.image, angle),
            })
            .collect();
    }

    pub fn rotations(&self) -> &[RotatedSprite] {
        &self.rotations
    }
}

/// A sprite drawn for one placement: the asset plus one rotated variant.
#[derive(Debug, Clone, Copy)]
pub struct SpriteInstance<'a> {
    pub asset: &'a SpriteAsset,
    pub rotation: &'a RotatedSprite,
}

impl SpriteInstance<'_> {
    pub fn image(&self) -> &RgbaImage {
        &self.rotation.image
    }

    pub fn class_id(&self) -> u32 {
        self.asset.class_id
    }

    /// Pixel footprint on a background, preserving real-world scale and the
    /// variant's aspect ratio. Recomputed for every background.
    pub fn footprint(&self, background_px_width: u32, background_m_width: f64) -> (u32, u32) {
        footprint(
            self.image().dimensions(),
            self.asset.wingspan_m,
            background_px_width,
            background_m_width,
        )
    }
}

/// `width = round(wingspan * px_per_meter)`, `height = round(width * h / w)`.
pub fn footprint(
    sprite_size: (u32, u32),
    wingspan_m: f64,
    background_px_width: u32,
    background_m_width: f64,
) -> (u32, u32) {
    let px_per_meter = background_px_width as f64 / background_m_width;
    let (w, h) = sprite_size;
    let width = (wingspan_m * px_per_meter).round();
    let height = (width * h as f64 / w.max(1) as f64).round();
    (width as u32, height as u32)
}

fn split_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('_')
        .filter(|(base, variant)| !base.is_empty() && !variant.is_empty())
}

/// Loaded sprites and their selection pools. Read-only after `load`.
pub struct SpriteCatalog {
    sprites: Vec<SpriteAsset>,
    small_pool: Vec<usize>,
    all_pool: Vec<usize>,
}

impl SpriteCatalog {
    /// Scans `<sprite_dir>/<type>/no-background/*` and the matching
    /// `<type>/size-labels/<key>.txt`, resolves class ids and precomputes the
    /// rotation cache.
    pub fn load(sprite_dir: &Path, class_map: &ClassMap) -> Result<Self> {
        info!("Loading sprite catalog: {}", sprite_dir.display());

        let mut sprites = Vec::new();
        let mut seen = HashSet::new();
        for type_dir in sorted_entries(sprite_dir)? {
            if !type_dir.is_dir() {
                continue;
            }
            for sprite in load_type_dir(&type_dir, class_map)? {
                if !seen.insert(sprite.key.clone()) {
                    return Err(SynthError::dataset(
                        &type_dir,
                        format!("duplicate sprite identity '{}'", sprite.key),
                    ));
                }
                sprites.push(sprite);
            }
        }

        if sprites.is_empty() {
            return Err(SynthError::dataset(sprite_dir, "no sprites found"));
        }
        sprites.sort_by(|a, b| a.key.cmp(&b.key));

        Self::prerotate_all(&mut sprites);
        Ok(Self::from_sprites(sprites))
    }

    /// Builds a catalog from already loaded sprites, precomputing rotations
    /// for any that lack them.
    pub fn from_assets(mut sprites: Vec<SpriteAsset>) -> Self {
        sprites.sort_by(|a, b| a.key.cmp(&b.key));
        for sprite in sprites.iter_mut().filter(|s| s.rotations.is_empty()) {
            sprite.prerotate();
        }
        Self::from_sprites(sprites)
    }

    fn from_sprites(sprites: Vec<SpriteAsset>) -> Self {
        let all_pool: Vec<usize> = (0..sprites.len()).collect();
        let small_pool: Vec<usize> = all_pool
            .iter()
            .copied()
            .filter(|&i| is_small_aircraft(&sprites[i].base_type))
            .collect();

        info!(
            "Sprite catalog ready: {} identities, {} small",
            sprites.len(),
            small_pool.len()
        );

        Self {
            sprites,
            small_pool,
            all_pool,
        }
    }

    fn prerotate_all(sprites: &mut [SpriteAsset]) {
        let pb = ProgressBar::new(sprites.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} sprites ({percent}%) {msg}")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏"),
        );
        pb.set_message("Precomputing rotations");

        sprites.par_iter_mut().for_each(|sprite| {
            sprite.prerotate();
            pb.inc(1);
        });

        pb.finish_with_message("Rotations cached");
    }

    /// Uniform pick from the small pool (`Small`) or from every sprite
    /// (`Big`), then a uniform pick among the cached rotations.
    pub fn select_sprite<R: Rng + ?Sized>(
        &self,
        size_class: SizeClass,
        rng: &mut R,
    ) -> Result<SpriteInstance<'_>> {
        let pool = self.pool(size_class);
        let &index = pool.choose(rng).ok_or(SynthError::EmptyPool(size_class))?;
        let asset = &self.sprites[index];
        let rotation = asset
            .rotations
            .choose(rng)
            .ok_or(SynthError::EmptyPool(size_class))?;
        Ok(SpriteInstance { asset, rotation })
    }

    fn pool(&self, size_class: SizeClass) -> &[usize] {
        match size_class {
            SizeClass::Small => &self.small_pool,
            SizeClass::Big => &self.all_pool,
        }
    }

    pub fn has_pool(&self, size_class: SizeClass) -> bool {
        !self.pool(size_class).is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.sprites.iter().map(|s| s.key.as_str())
    }

    pub fn small_pool(&self) -> impl Iterator<Item = &str> {
        self.small_pool.iter().map(|&i| self.sprites[i].key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&SpriteAsset> {
        self.sprites
            .binary_search_by(|s| s.key.as_str().cmp(key))
            .ok()
            .map(|i| &self.sprites[i])
    }

    pub fn variants(&self, key: &str) -> Option<&[RotatedSprite]> {
        self.get(key).map(|s| s.rotations())
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }
}

/// Directory listing sorted by file name, hidden entries skipped.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let listing = fs::read_dir(dir)
        .map_err(|e| SynthError::dataset(dir, format!("cannot list directory: {}", e)))?;

    let mut paths = Vec::new();
    for entry in listing {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if !hidden {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_type_dir(type_dir: &Path, class_map: &ClassMap) -> Result<Vec<SpriteAsset>> {
    let image_dir = type_dir.join(SPRITE_IMAGE_DIR);
    let size_dir = type_dir.join(SPRITE_SIZE_DIR);
    if !image_dir.is_dir() || !size_dir.is_dir() {
        return Err(SynthError::dataset(
            type_dir,
            format!("expected '{}' and '{}' sub-folders", SPRITE_IMAGE_DIR, SPRITE_SIZE_DIR),
        ));
    }

    let mut sprites = Vec::new();
    let mut keys = HashSet::new();
    for image_path in sorted_entries(&image_dir)? {
        if !image_path.is_file() {
            continue;
        }
        let key = image_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let label_path = size_dir.join(format!("{}.txt", key));
        let wingspan_m = read_wingspan(&label_path)?;

        let (base_type, _) = split_key(&key).ok_or_else(|| {
            SynthError::dataset(&image_path, "sprite name needs a '<type>_<variant>' form")
        })?;
        let class_id = class_map.class_id(base_type)?;

        let image = image::open(&image_path)
            .map_err(|e| SynthError::dataset(&image_path, format!("cannot decode sprite: {}", e)))?
            .to_rgba8();

        debug!(
            "Sprite {} ({}x{}, {:.1} m, class {})",
            key,
            image.width(),
            image.height(),
            wingspan_m,
            class_id
        );

        keys.insert(key.clone());
        if let Some(sprite) = SpriteAsset::new(&key, class_id, wingspan_m, image) {
            sprites.push(sprite);
        }
    }

    for label_path in sorted_entries(&size_dir)? {
        let stem = label_path.file_stem().unwrap_or_default().to_string_lossy();
        if !keys.contains(&*stem) {
            warn!("Size label without sprite image: {}", label_path.display());
        }
    }

    Ok(sprites)
}

fn read_wingspan(path: &Path) -> Result<f64> {
    let text = fs::read_to_string(path)
        .map_err(|e| SynthError::dataset(path, format!("missing size label: {}", e)))?;
    let meters: f64 = text
        .trim()
        .parse()
        .map_err(|_| SynthError::dataset(path, format!("invalid wingspan '{}'", text.trim())))?;
    if !meters.is_finite() || meters <= 0.0 {
        return Err(SynthError::dataset(path, "wingspan must be positive"));
    }
    Ok(meters)
}
