pub mod constant;
pub mod ilab_config;
pub mod jobs;
pub mod params;
pub mod queue;
pub mod taxonomy;
