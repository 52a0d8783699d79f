pub mod context;
pub mod params;
pub mod relations;
pub mod task;
pub mod workflow;
