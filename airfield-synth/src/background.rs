/// Background airfield catalog: photographs, real-world widths and spawn points.
use crate::error::{Result, SynthError};
use crate::spawn_point::SpawnPoint;
use crate::sprite::sorted_entries;
use image::RgbImage;
use log::{debug, info};
use rand::Rng;
use std::fs;
use std::path::Path;

/// Sub-folder of the background root holding the photographs.
pub const BACKGROUND_IMAGE_DIR: &str = "images";

/// Sub-folder of the background root holding `<N>.txt` label files.
pub const BACKGROUND_LABEL_DIR: &str = "labels";

/// One airfield photograph with its scale and spawn points.
#[derive(Debug, Clone)]
pub struct BackgroundAsset {
    /// Numeric file stem of the source image.
    pub id: u64,
    pub image: RgbImage,
    /// Real-world width of the photograph in meters.
    pub meter_width: f64,
    pub spawn_points: Vec<SpawnPoint>,
}

impl BackgroundAsset {
    pub fn pixel_width(&self) -> u32 {
        self.image.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.image.height()
    }

    /// Every spawn point must lie on the photograph before jitter.
    fn check_spawn_points(&self, label_path: &Path) -> Result<()> {
        let (w, h) = (self.pixel_width() as i64, self.pixel_height() as i64);
        for p in &self.spawn_points {
            let (x, y) = (p.x as i64, p.y as i64);
            if x < 0 || y < 0 || x >= w || y >= h {
                return Err(SynthError::dataset(
                    label_path,
                    format!("spawn point ({}, {}) outside the {}x{} image", p.x, p.y, w, h),
                ));
            }
        }
        Ok(())
    }
}

/// Backgrounds in numeric file order. Read-only after `load`.
pub struct BackgroundCatalog {
    backgrounds: Vec<BackgroundAsset>,
}

impl BackgroundCatalog {
    /// Reads `images/<N>.<ext>` sorted by `N` and the matching `labels/<N>.txt`.
    pub fn load(background_dir: &Path) -> Result<Self> {
        info!("Loading background catalog: {}", background_dir.display());

        let image_dir = background_dir.join(BACKGROUND_IMAGE_DIR);
        let label_dir = background_dir.join(BACKGROUND_LABEL_DIR);

        let mut numbered = Vec::new();
        for path in sorted_entries(&image_dir)? {
            if !path.is_file() {
                continue;
            }
            let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
            let id: u64 = stem.parse().map_err(|_| {
                SynthError::dataset(&path, "background image name must be numeric")
            })?;
            numbered.push((id, stem, path));
        }
        numbered.sort_by_key(|(id, _, _)| *id);
        if let Some(pair) = numbered.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(SynthError::dataset(
                &pair[1].2,
                format!("background id {} also used by {}", pair[1].0, pair[0].2.display()),
            ));
        }

        let mut backgrounds = Vec::with_capacity(numbered.len());
        for (id, stem, path) in numbered {
            // Labels follow the image's own stem, so `007.png` reads `007.txt`.
            let label_path = label_dir.join(format!("{}.txt", stem));
            let (meter_width, spawn_points) = read_label(&label_path)?;

            let image = image::open(&path)
                .map_err(|e| SynthError::dataset(&path, format!("cannot decode background: {}", e)))?
                .to_rgb8();
            if image.width() == 0 || image.height() == 0 {
                return Err(SynthError::dataset(&path, "background image is empty"));
            }

            let background = BackgroundAsset {
                id,
                image,
                meter_width,
                spawn_points,
            };
            background.check_spawn_points(&label_path)?;

            debug!(
                "Background {} ({}x{}, {} m, {} spawn points)",
                id,
                background.pixel_width(),
                background.pixel_height(),
                meter_width,
                background.spawn_points.len()
            );
            backgrounds.push(background);
        }

        if backgrounds.is_empty() {
            return Err(SynthError::dataset(&image_dir, "no background images found"));
        }

        info!("Background catalog ready: {} images", backgrounds.len());
        Ok(Self { backgrounds })
    }

    #[cfg(test)]
    pub fn from_assets(backgrounds: Vec<BackgroundAsset>) -> Self {
        assert!(!backgrounds.is_empty(), "catalog needs at least one background");
        Self { backgrounds }
    }

    /// Uniform pick. Returns a shared reference; the compositor copies pixels.
    pub fn select_background<R: Rng + ?Sized>(&self, rng: &mut R) -> &BackgroundAsset {
        &self.backgrounds[rng.gen_range(0..self.backgrounds.len())]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackgroundAsset> {
        self.backgrounds.iter()
    }

    pub fn get(&self, index: usize) -> Option<&BackgroundAsset> {
        self.backgrounds.get(index)
    }

    pub fn len(&self) -> usize {
        self.backgrounds.len()
    }
}

/// First line: integer meter width (anything after a comma is ignored).
/// Remaining non-blank lines: `x,y,size_class`.
fn read_label(path: &Path) -> Result<(f64, Vec<SpawnPoint>)> {
    let text = fs::read_to_string(path)
        .map_err(|e| SynthError::dataset(path, format!("missing background label: {}", e)))?;
    let mut lines = text.lines();

    let header = lines.next().unwrap_or_default();
    let width_field = header.split(',').next().unwrap_or_default().trim();
    let meter_width: u32 = width_field
        .parse()
        .map_err(|_| SynthError::dataset(path, format!("invalid meter width '{}'", width_field)))?;
    if meter_width == 0 {
        return Err(SynthError::dataset(path, "meter width must be positive"));
    }

    let spawn_points = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| SpawnPoint::parse(line, path))
        .collect::<Result<Vec<_>>>()?;
    if spawn_points.is_empty() {
        return Err(SynthError::dataset(path, "background has no spawn points"));
    }

    Ok((meter_width as f64, spawn_points))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::spawn_point::SizeClass;
    use image::Rgb;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    pub(crate) fn write_background(root: &Path, id: u64, size: (u32, u32), label: &str) {
        let images = root.join(BACKGROUND_IMAGE_DIR);
        let labels = root.join(BACKGROUND_LABEL_DIR);
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&labels).unwrap();
        RgbImage::from_pixel(size.0, size.1, Rgb([90, 95, 88]))
            .save(images.join(format!("{}.png", id)))
            .unwrap();
        fs::write(labels.join(format!("{}.txt", id)), label).unwrap();
    }

    #[test]
    fn loads_in_numeric_order() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 10, (64, 48), "50\n3,4,s\n");
        write_background(dir.path(), 2, (32, 32), "120\n10,12,b\n20,22,s\n");
        write_background(dir.path(), 1, (16, 16), "8\n1,1,b");

        let catalog = BackgroundCatalog::load(dir.path()).unwrap();
        let ids: Vec<u64> = catalog.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 10]);

        let second = catalog.get(1).unwrap();
        assert_eq!(second.meter_width, 120.0);
        assert_eq!(second.pixel_width(), 32);
        assert_eq!(second.spawn_points.len(), 2);
        assert_eq!(second.spawn_points[1].size_class, SizeClass::Small);
    }

    #[test]
    fn width_line_may_carry_extra_fields() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75,ignored\n\n4,5,b\n\n");
        let catalog = BackgroundCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.get(0).unwrap().meter_width, 75.0);
        assert_eq!(catalog.get(0).unwrap().spawn_points.len(), 1);
    }

    #[test]
    fn missing_label_is_a_dataset_error() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75\n4,5,b\n");
        fs::remove_file(dir.path().join(BACKGROUND_LABEL_DIR).join("0.txt")).unwrap();
        let err = BackgroundCatalog::load(dir.path()).err().unwrap();
        assert!(matches!(err, SynthError::DatasetRead { .. }));
    }

    #[test]
    fn malformed_width_is_a_dataset_error() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "wide\n4,5,b\n");
        let err = BackgroundCatalog::load(dir.path()).err().unwrap();
        assert!(matches!(err, SynthError::DatasetRead { .. }));
    }

    #[test]
    fn unknown_size_tag_is_rejected_at_load() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75\n4,5,x\n");
        let err = BackgroundCatalog::load(dir.path()).err().unwrap();
        assert!(matches!(err, SynthError::InvalidSizeClass(_)));
    }

    #[test]
    fn non_numeric_image_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75\n4,5,b\n");
        fs::copy(
            dir.path().join(BACKGROUND_IMAGE_DIR).join("0.png"),
            dir.path().join(BACKGROUND_IMAGE_DIR).join("apron.png"),
        )
        .unwrap();
        assert!(BackgroundCatalog::load(dir.path()).is_err());
    }

    #[test]
    fn selection_covers_every_background() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75\n4,5,b\n");
        write_background(dir.path(), 1, (16, 16), "75\n4,5,b\n");
        let catalog = BackgroundCatalog::load(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen = [false; 2];
        for _ in 0..50 {
            seen[catalog.select_background(&mut rng).id as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn zero_padded_names_read_their_own_label() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75\n4,5,b\n");
        let images = dir.path().join(BACKGROUND_IMAGE_DIR);
        let labels = dir.path().join(BACKGROUND_LABEL_DIR);
        fs::rename(images.join("0.png"), images.join("007.png")).unwrap();
        fs::rename(labels.join("0.txt"), labels.join("007.txt")).unwrap();

        let catalog = BackgroundCatalog::load(dir.path()).unwrap();
        let bg = catalog.get(0).unwrap();
        assert_eq!(bg.id, 7);
        assert_eq!(bg.meter_width, 75.0);
    }

    #[test]
    fn duplicate_numeric_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 1, (16, 16), "75\n4,5,b\n");
        let images = dir.path().join(BACKGROUND_IMAGE_DIR);
        let labels = dir.path().join(BACKGROUND_LABEL_DIR);
        fs::copy(images.join("1.png"), images.join("01.png")).unwrap();
        fs::copy(labels.join("1.txt"), labels.join("01.txt")).unwrap();

        let err = BackgroundCatalog::load(dir.path()).err().unwrap();
        assert!(matches!(err, SynthError::DatasetRead { .. }));
    }

    #[test]
    fn spawn_points_off_the_image_are_rejected() {
        for label in ["75\n-500,9999,b\n", "75\n16,4,s\n", "75\n4,16,b\n", "75\n2147483647,3,b\n"] {
            let dir = TempDir::new().unwrap();
            write_background(dir.path(), 0, (16, 16), label);
            let err = BackgroundCatalog::load(dir.path()).err().unwrap();
            assert!(matches!(err, SynthError::DatasetRead { .. }), "accepted {:?}", label);
        }

        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 0, (16, 16), "75\n0,0,s\n15,15,b\n");
        assert_eq!(BackgroundCatalog::load(dir.path()).unwrap().get(0).unwrap().spawn_points.len(), 2);
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_background(dir.path(), 3, (32, 24), "120\n10,12,b\n20,22,s\n");
        write_background(dir.path(), 1, (16, 16), "40,x\n1,1,b\n");

        let a = BackgroundCatalog::load(dir.path()).unwrap();
        let b = BackgroundCatalog::load(dir.path()).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.meter_width, y.meter_width);
            assert_eq!(x.spawn_points, y.spawn_points);
            assert_eq!(x.image, y.image);
        }
    }

    #[test]
    #[should_panic(expected = "at least one background")]
    fn empty_asset_list_is_refused() {
        BackgroundCatalog::from_assets(Vec::new());
    }
}
