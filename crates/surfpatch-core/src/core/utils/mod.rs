pub mod identifiers;
pub mod radii;
