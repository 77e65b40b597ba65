use crate::core::{errors::GraphError, graph::Graph, graph::VertexId, message::Message};

use super::vertex_view::EvalVertexView;

/// Outcome of one compute invocation. `Done` is the vertex's vote to halt:
/// it will not be invoked again unless a message arrives for it.
#[derive(Debug, PartialEq)]
pub enum Step {
    Done,
    Continue,
}

/// The per-vertex logic of an algorithm, invoked once per active superstep.
///
/// One implementation serves directed and undirected graphs alike: the graph's
/// directedness is queried through the view, and the directed-only edge views
/// fail with [`GraphError::UndirectedEdgeView`] when misused. Algorithm
/// parameters live in the implementing struct, immutable for the whole job.
pub trait VertexProgram: Send + Sync + Sized {
    type Value: Clone + Send + Sync + 'static;
    type Msg: Clone + Send + Sync + 'static;
    type Edge: Clone + Send + Sync + 'static;

    /// One-time initial value for a vertex, before superstep 1.
    fn init(&self, vertex: VertexId, graph: &Graph<Self::Edge>) -> Self::Value;

    /// One superstep of work for one vertex. Messages are the complete inbox
    /// for this superstep, owned by the invocation.
    fn compute(
        &self,
        vertex: &mut EvalVertexView<'_, Self>,
        messages: Vec<Message<Self::Msg>>,
    ) -> Result<Step, GraphError>;
}
