/// Aircraft base types small enough to be placed on a small spawn point
pub const SMALL_AIRCRAFT_TYPES: &[&str] = &["su24", "su27_su35", "su30_su34"];

/// Spawn point tag for small aircraft stands
pub const SMALL_TAG: &str = "s";

/// Spawn point tag for stands that accept any aircraft
pub const BIG_TAG: &str = "b";

/// Default file name of the class name to id mapping inside the sprite root
pub const CLASS_MAP_FILE: &str = "class_names_to_id_mapping.json";

pub fn is_small_aircraft(base_type: &str) -> bool {
    SMALL_AIRCRAFT_TYPES.contains(&base_type)
}
