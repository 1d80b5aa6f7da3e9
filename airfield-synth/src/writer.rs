/// Dataset output: `images/{i}.png`, `labels/{i}.txt` and optional previews.
use crate::error::Result;
use crate::label::format_labels;
use crate::preview::draw_label_boxes;
use crate::scene::RenderedScene;
use image::{ImageFormat, RgbImage};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub const OUTPUT_IMAGE_DIR: &str = "images";
pub const OUTPUT_LABEL_DIR: &str = "labels";
pub const OUTPUT_PREVIEW_DIR: &str = "previews";

/// Writes image/label pairs under one output root. Directories are created
/// up front so concurrent writers never race on them.
pub struct DatasetWriter {
    image_dir: PathBuf,
    label_dir: PathBuf,
    preview_dir: Option<PathBuf>,
}

impl DatasetWriter {
    pub fn new(output_dir: &Path, previews: bool) -> Result<Self> {
        let image_dir = output_dir.join(OUTPUT_IMAGE_DIR);
        let label_dir = output_dir.join(OUTPUT_LABEL_DIR);
        fs::create_dir_all(&image_dir)?;
        fs::create_dir_all(&label_dir)?;

        let preview_dir = if previews {
            let dir = output_dir.join(OUTPUT_PREVIEW_DIR);
            fs::create_dir_all(&dir)?;
            Some(dir)
        } else {
            None
        };

        Ok(Self {
            image_dir,
            label_dir,
            preview_dir,
        })
    }

    pub fn image_path(&self, index: u64) -> PathBuf {
        self.image_dir.join(format!("{}.png", index))
    }

    pub fn label_path(&self, index: u64) -> PathBuf {
        self.label_dir.join(format!("{}.txt", index))
    }

    /// Writes both files to hidden temporaries, then renames them into place.
    /// On failure the temporaries are removed and the pair is absent.
    pub fn write(&self, index: u64, scene: &RenderedScene) -> Result<()> {
        let image_path = self.image_path(index);
        let label_path = self.label_path(index);
        let image_tmp = temp_path(&image_path);
        let label_tmp = temp_path(&label_path);

        let staged = save_png(&scene.image, &image_tmp)
            .and_then(|_| Ok(fs::write(&label_tmp, format_labels(&scene.labels))?));
        if let Err(e) = staged {
            let _ = fs::remove_file(&image_tmp);
            let _ = fs::remove_file(&label_tmp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&image_tmp, &image_path) {
            let _ = fs::remove_file(&image_tmp);
            let _ = fs::remove_file(&label_tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&label_tmp, &label_path) {
            let _ = fs::remove_file(&label_tmp);
            let _ = fs::remove_file(&image_path);
            return Err(e.into());
        }

        if let Some(dir) = &self.preview_dir {
            let overlay = draw_label_boxes(&scene.image, &scene.labels)?;
            save_png(&overlay, &dir.join(format!("{}.png", index)))?;
        }

        debug!(
            "Saved {} ({} labels)",
            image_path.display(),
            scene.labels.len()
        );
        Ok(())
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target.file_name().unwrap_or_default().to_string_lossy();
    target.with_file_name(format!(".{}.tmp", name))
}

fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::BoxLabel;
    use crate::scene::Interference;
    use image::Rgb;
    use tempfile::TempDir;

    fn sample_scene() -> RenderedScene {
        RenderedScene {
            background_id: 0,
            image: RgbImage::from_pixel(16, 12, Rgb([10, 20, 30])),
            labels: vec![
                BoxLabel::from_box(3, [0.5, 0.5, 0.25, 0.5]),
                BoxLabel::from_box(1, [0.25, 0.75, 0.125, 0.25]),
            ],
            interference: Interference {
                sharpness: 1.0,
                noise_sigma: None,
            },
        }
    }

    #[test]
    fn writes_image_and_label_pair() {
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(dir.path(), false).unwrap();
        writer.write(42, &sample_scene()).unwrap();

        let image = image::open(dir.path().join("images/42.png")).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (16, 12));
        let labels = fs::read_to_string(dir.path().join("labels/42.txt")).unwrap();
        assert_eq!(labels, "3 0.5 0.5 0.25 0.5\n1 0.25 0.75 0.125 0.25");
        assert!(!dir.path().join("previews").exists());

        // No temporaries left behind.
        let leftovers = fs::read_dir(dir.path().join("images"))
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with('.'))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn preview_is_written_on_request() {
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(dir.path(), true).unwrap();
        writer.write(0, &sample_scene()).unwrap();
        assert!(dir.path().join("previews/0.png").is_file());
    }

    #[test]
    fn failed_write_leaves_no_pair() {
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(dir.path(), false).unwrap();
        // A directory squatting on the label path makes the final rename fail.
        fs::create_dir_all(dir.path().join("labels/5.txt/blocker")).unwrap();

        assert!(writer.write(5, &sample_scene()).is_err());
        assert!(!dir.path().join("images/5.png").exists());
        assert!(!dir.path().join("images/.5.png.tmp").exists());
        assert!(!dir.path().join("labels/.5.txt.tmp").exists());
    }
}
