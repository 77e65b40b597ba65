//! Reference vertex programs built on the superstep engine.
//!
//! Each algorithm pairs a private [`VertexProgram`](crate::engine::program::VertexProgram)
//! with a public entry function that validates its inputs, drives a
//! [`Runner`](crate::engine::runner::Runner) to quiescence and reshapes the
//! final vertex values into plain maps.

pub mod bfs;
pub mod community_detection;
pub mod connected_components;
pub mod local_clustering_coefficient;

pub use bfs::{breadth_first_search, UNREACHED};
pub use community_detection::{community_detection, CommunityDetectionParams};
pub use connected_components::weakly_connected_components;
pub use local_clustering_coefficient::{local_clustering_coefficient, LccResult};
