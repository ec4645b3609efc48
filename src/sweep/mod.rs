pub mod params;
pub mod grid;
pub mod trial;
pub mod executor;
pub mod reduce;
pub mod pipeline;
