/// Symbolic locations - short names for well-known user directories
///
/// The registry is discovered once at startup from the host environment and
/// then shared read-only. The resolver turns caller path expressions such as
/// `desktop/reports` into absolute native paths using that registry.
pub mod registry;
pub mod resolver;
pub mod rules;

pub use self::{
    registry::{HostEnvironment, HostOs, LocationEntry, LocationRegistry},
    resolver::PathResolver,
    rules::OverrideRule,
};

/// Location names every registry carries, in registration order
pub const STANDARD_LOCATIONS: [&str; 7] = [
    "home",
    "desktop",
    "documents",
    "downloads",
    "pictures",
    "music",
    "videos",
];
