use rustc_hash::FxHashMap;

use crate::core::{
    errors::GraphError,
    graph::{Graph, VertexId},
    message::Message,
};
use crate::engine::{
    context::Context,
    program::{Step, VertexProgram},
    runner::Runner,
    vertex_view::EvalVertexView,
};

/// Min-label propagation over the undirected view of the graph.
///
/// Every vertex starts in its own component. Superstep 1 seeds each vertex
/// with the minimum over itself and its neighbours, then quiescence-driven
/// rounds adopt the smallest incoming label and broadcast only on change.
/// Edge direction is ignored throughout, so on a directed graph this yields
/// weakly connected components.
#[derive(Debug, Clone)]
struct ConnectedComponents;

impl VertexProgram for ConnectedComponents {
    type Value = VertexId;
    type Msg = VertexId;
    type Edge = ();

    fn init(&self, vertex: VertexId, _graph: &Graph) -> VertexId {
        vertex
    }

    fn compute(
        &self,
        vertex: &mut EvalVertexView<'_, Self>,
        messages: Vec<Message<VertexId>>,
    ) -> Result<Step, GraphError> {
        if vertex.superstep() == 1 {
            let component = vertex
                .neighbours_undirected()
                .min()
                .map_or(vertex.id(), |m| m.min(vertex.id()));
            *vertex.value_mut() = component;
            // only an adopted smaller id is news, and only to neighbours
            // that cannot have seen it themselves
            if component != vertex.id() {
                let targets: Vec<VertexId> = vertex
                    .neighbours_undirected()
                    .filter(|&n| n > component)
                    .collect();
                for n in targets {
                    vertex.send(n, component);
                }
            }
        } else {
            let smallest = messages.iter().map(|m| m.payload).min();
            if let Some(label) = smallest {
                if label < *vertex.value() {
                    *vertex.value_mut() = label;
                    let targets: Vec<VertexId> = vertex.neighbours_undirected().collect();
                    for n in targets {
                        vertex.send(n, label);
                    }
                }
            }
        }
        Ok(Step::Done)
    }
}

/// Weakly connected components, labelled by the smallest vertex id in each
/// component.
///
/// # Arguments
///
/// - `g` - A reference to the graph; edge direction is ignored
/// - `threads` - (Optional) Number of threads to use
///
/// # Returns
///
/// A map from vertex id to its component label.
pub fn weakly_connected_components(
    g: &Graph,
    threads: Option<usize>,
) -> Result<FxHashMap<VertexId, VertexId>, GraphError> {
    let ctx = Context::new(g);
    let output = Runner::new(ctx, ConnectedComponents).run(usize::MAX, threads)?;
    Ok(output.values)
}
