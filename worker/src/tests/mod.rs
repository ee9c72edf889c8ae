pub mod common;

pub mod processor;
pub mod publisher;
