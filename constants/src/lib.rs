//! Fixed tables shared by the synthetic airfield generator.
pub mod class;
pub mod coordinate_system;
pub mod render_settings;
pub mod sprite;
