#[macro_use]
pub mod strong_type;

pub mod ids;

pub use ids::*;
