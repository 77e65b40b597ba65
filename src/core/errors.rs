use crate::core::graph::VertexId;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("incoming and outgoing edge views are only defined for directed graphs")]
    UndirectedEdgeView,
    #[error("edge ({src}, {dst}) references a vertex that was never loaded")]
    DanglingEdge { src: VertexId, dst: VertexId },
    #[error("source vertex {0} does not exist in the graph")]
    MissingSource(VertexId),
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
