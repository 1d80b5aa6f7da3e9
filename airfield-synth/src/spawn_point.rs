/// Labeled spawn points on background photographs.
use crate::error::{Result, SynthError};
use constants::class::{BIG_TAG, SMALL_TAG};
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

/// Coarse aircraft size accepted by a spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SizeClass {
    /// Only small aircraft types.
    Small,
    /// Any aircraft type.
    Big,
}

impl FromStr for SizeClass {
    type Err = SynthError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim() {
            SMALL_TAG => Ok(SizeClass::Small),
            BIG_TAG => Ok(SizeClass::Big),
            other => Err(SynthError::InvalidSizeClass(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    pub x: i32,
    pub y: i32,
    pub size_class: SizeClass,
}

impl SpawnPoint {
    /// Parses an `x,y,size_class` line read from `source`.
    pub fn parse(line: &str, source: &Path) -> Result<Self> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        if fields.len() != 3 {
            return Err(SynthError::dataset(
                source,
                format!("malformed spawn point line '{}'", line.trim()),
            ));
        }
        let x = fields[0].trim().parse::<i32>();
        let y = fields[1].trim().parse::<i32>();
        match (x, y) {
            (Ok(x), Ok(y)) => Ok(Self {
                x,
                y,
                size_class: fields[2].parse()?,
            }),
            _ => Err(SynthError::dataset(
                source,
                format!("non-integer coordinates in '{}'", line.trim()),
            )),
        }
    }

    /// Offsets the point by independent integer amounts in [-radius, radius].
    /// The size class is dropped; it has already picked the sprite.
    pub fn jittered<R: Rng + ?Sized>(&self, radius: i32, rng: &mut R) -> (i32, i32) {
        (
            self.x + rng.gen_range(-radius..=radius),
            self.y + rng.gen_range(-radius..=radius),
        )
    }
}
