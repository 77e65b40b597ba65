//! valiant: a bulk-synchronous parallel, vertex-centric graph computation
//! engine. Vertices run identical programs across synchronized supersteps and
//! communicate only through messages delivered at round boundaries, with named
//! global aggregators for cross-graph reductions.

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod algorithms;
pub mod core;
pub mod engine;

pub mod prelude {
    pub use crate::core::{
        agg::{accumulators, AccId, AvgPair},
        errors::GraphError,
        graph::{Graph, VertexId},
        message::Message,
    };
    pub use crate::engine::{
        context::Context,
        program::{Step, VertexProgram},
        runner::{JobOutput, Runner},
        vertex_view::EvalVertexView,
    };
}
