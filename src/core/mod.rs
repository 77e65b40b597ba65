pub mod agg;
pub mod errors;
pub mod graph;
pub mod message;
