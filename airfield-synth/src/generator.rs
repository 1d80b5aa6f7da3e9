/// Batch orchestration: loads the catalogs once, then renders and persists
/// scenes under consecutive output indices.
use crate::background::BackgroundCatalog;
use crate::class_map::ClassMap;
use crate::error::{Result, SynthError};
use crate::label::LabelPolicy;
use crate::manifest::{ClassPresence, InputInfo, ManifestGenerator, RunManifest};
use crate::scene::Scene;
use crate::spawn_point::SizeClass;
use crate::sprite::SpriteCatalog;
use crate::writer::DatasetWriter;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::path::PathBuf;

/// Everything a run needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub background_dir: PathBuf,
    pub sprite_dir: PathBuf,
    pub output_dir: PathBuf,
    pub class_map_path: PathBuf,
    pub start_index: u64,
    /// Drawn from entropy when absent.
    pub seed: Option<u64>,
    pub jobs: usize,
    pub label_policy: LabelPolicy,
    pub preview: bool,
}

pub struct ImageGenerator {
    config: GeneratorConfig,
    class_map: ClassMap,
    sprites: SpriteCatalog,
    backgrounds: BackgroundCatalog,
    writer: DatasetWriter,
    base_seed: u64,
    next_index: u64,
}

impl ImageGenerator {
    /// Loads and validates every input before any output is written.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let class_map = ClassMap::load(&config.class_map_path)?;
        info!("Class map: {} aircraft types", class_map.len());

        let sprites = SpriteCatalog::load(&config.sprite_dir, &class_map)?;
        let backgrounds = BackgroundCatalog::load(&config.background_dir)?;
        Self::from_catalogs(config, class_map, sprites, backgrounds)
    }

    pub fn from_catalogs(
        config: GeneratorConfig,
        class_map: ClassMap,
        sprites: SpriteCatalog,
        backgrounds: BackgroundCatalog,
    ) -> Result<Self> {
        let needs_small = backgrounds
            .iter()
            .flat_map(|b| &b.spawn_points)
            .any(|p| p.size_class == SizeClass::Small);
        if needs_small && !sprites.has_pool(SizeClass::Small) {
            return Err(SynthError::EmptyPool(SizeClass::Small));
        }

        let writer = DatasetWriter::new(&config.output_dir, config.preview)?;
        let base_seed = config.seed.unwrap_or_else(rand::random);
        info!("Base seed: {}", base_seed);

        Ok(Self {
            next_index: config.start_index,
            config,
            class_map,
            sprites,
            backgrounds,
            writer,
            base_seed,
        })
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Index the next generated sample will be written under.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Renders and writes sample `index`; returns the class ids placed.
    pub fn generate_image(&self, index: u64) -> Result<Vec<u32>> {
        let mut rng = StdRng::seed_from_u64(self.base_seed.wrapping_add(index));
        let background = self.backgrounds.select_background(&mut rng);
        let scene = Scene::compose(background, &self.sprites, &mut rng)?;
        let rendered = scene.render(self.config.label_policy, &mut rng);

        debug!(
            "Sample {}: background {}, {} aircraft, sharpness {:.2}, noise {:?}",
            index,
            rendered.background_id,
            rendered.labels.len(),
            rendered.interference.sharpness,
            rendered.interference.noise_sigma
        );

        self.writer.write(index, &rendered)?;
        Ok(rendered.labels.iter().map(|l| l.class_id).collect())
    }

    /// Writes `count` samples starting at the next index, then the run
    /// manifest. The first failure aborts the batch.
    pub fn generate(&mut self, count: u64) -> Result<ClassPresence> {
        let start = self.next_index;
        let end = start
            .checked_add(count)
            .ok_or(SynthError::IndexOverflow { start, count })?;
        let indices: Vec<u64> = (start..end).collect();

        let pb = ProgressBar::new(count);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} samples ({percent}%) {msg}")
                .unwrap()
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Rendering scenes");

        let render = |&index: &u64| -> Result<Vec<u32>> {
            let ids = self.generate_image(index)?;
            pb.inc(1);
            Ok(ids)
        };

        let placed: Vec<Vec<u32>> = if self.config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()?;
            pool.install(|| indices.par_iter().map(render).collect::<Result<Vec<_>>>())?
        } else {
            indices.iter().map(render).collect::<Result<Vec<_>>>()?
        };
        pb.finish_with_message("Scenes written");

        self.next_index = end;

        let presence =
            ClassPresence::from_class_ids(&self.class_map, placed.into_iter().flatten());
        let manifest = RunManifest {
            start_index: start,
            end_index: end,
            count,
            base_seed: self.base_seed,
            jobs: self.config.jobs.max(1),
            label_policy: self.config.label_policy,
            inputs: InputInfo {
                backgrounds: self.config.background_dir.clone(),
                sprites: self.config.sprite_dir.clone(),
                class_map: self.config.class_map_path.clone(),
                background_count: self.backgrounds.len(),
                sprite_identities: self.sprites.len(),
            },
            classes: self.class_map.clone(),
            class_presence: presence.clone(),
        };
        ManifestGenerator::new(&self.config.output_dir).write(&manifest)?;

        Ok(presence)
    }
}
