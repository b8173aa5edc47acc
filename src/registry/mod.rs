mod core;

pub use core::{ZoneContent, ZoneId, ZoneRegistry, ZoneState};
