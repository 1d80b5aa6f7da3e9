/// Angle between two precomputed sprite rotations (degrees)
pub const ROTATION_STEP_DEGREES: u32 = 30;

/// Number of rotated variants cached per sprite identity
pub const ROTATION_COUNT: usize = (360 / ROTATION_STEP_DEGREES) as usize;

/// Maximum spawn point jitter along each axis (pixels)
pub const SPAWN_JITTER_PX: i32 = 3;

/// Sub-folder of a sprite type holding the transparent cut-outs
pub const SPRITE_IMAGE_DIR: &str = "no-background";

/// Sub-folder of a sprite type holding the wingspan labels (meters)
pub const SPRITE_SIZE_DIR: &str = "size-labels";

/// Fixed rotation angle set: 0, 30, ..., 330
pub fn rotation_angles() -> impl Iterator<Item = u32> {
    (0..ROTATION_COUNT as u32).map(|i| i * ROTATION_STEP_DEGREES)
}
