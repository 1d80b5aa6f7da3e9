/// Synthetic airfield dataset generator entry point.
mod background;
mod class_map;
mod enhance;
mod error;
mod generator;
mod label;
mod manifest;
mod preview;
mod rotation;
mod scene;
mod spawn_point;
mod sprite;
mod writer;

use clap::Parser;
use constants::class::CLASS_MAP_FILE;
use generator::{GeneratorConfig, ImageGenerator};
use label::LabelPolicy;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Composite aircraft sprites onto airfield photographs and write
/// detector-ready image/label pairs.
#[derive(Parser, Debug)]
#[command(name = "airfield-synth", version, long_about = None)]
struct Args {
    /// Background root with `images/<N>.<ext>` and `labels/<N>.txt`
    #[arg(long)]
    backgrounds: PathBuf,

    /// Sprite root with one folder per aircraft type
    #[arg(long)]
    sprites: PathBuf,

    /// Output root for `images/`, `labels/` and `manifest.json`
    #[arg(long)]
    output: PathBuf,

    /// Class name to id mapping (defaults to the file inside the sprite root)
    #[arg(long)]
    class_map: Option<PathBuf>,

    /// Index of the first generated sample
    #[arg(long, default_value_t = 0)]
    start_index: u64,

    /// Number of samples to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u64,

    /// Base seed; scene i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for scene rendering
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Handling of boxes that extend past the image edge
    #[arg(long, value_enum, default_value_t = LabelPolicy::Clamp)]
    label_policy: LabelPolicy,

    /// Also write box overlays to `previews/`
    #[arg(long)]
    preview: bool,
}

impl From<Args> for GeneratorConfig {
    fn from(args: Args) -> Self {
        let class_map_path = args
            .class_map
            .unwrap_or_else(|| args.sprites.join(CLASS_MAP_FILE));
        GeneratorConfig {
            background_dir: args.backgrounds,
            sprite_dir: args.sprites,
            output_dir: args.output,
            class_map_path,
            start_index: args.start_index,
            seed: args.seed,
            jobs: args.jobs,
            label_policy: args.label_policy,
            preview: args.preview,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let count = args.count;
    let start_time = Instant::now();

    let mut generator = ImageGenerator::new(args.into())?;
    let presence = generator.generate(count)?;

    info!(
        "Wrote {} samples with {} aircraft in {:.2}s",
        count,
        presence.total(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
