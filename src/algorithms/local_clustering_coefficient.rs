use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::{
    agg::{accumulators, AccId, AvgDef, AvgPair},
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

/// Per-vertex clustering coefficients plus their graph-wide mean.
#[derive(Debug, Clone)]
pub struct LccResult {
    pub coefficients: FxHashMap<VertexId, f64>,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum LccMessage {
    /// "Does an edge from `source` to `target` exist at you?"
    Inquiry { source: VertexId, target: VertexId },
    Reply,
}

/// Three-round edge-probing protocol.
///
/// Superstep 1: every vertex with at least two neighbours asks each neighbour
/// whether it links to each of the other neighbours, one inquiry per ordered
/// pair. Superstep 2: each vertex answers the inquiries it can confirm
/// against its own neighbour list. Superstep 3: confirmed replies are counted
/// and normalised by the number of ordered neighbour pairs.
#[derive(Debug, Clone)]
struct LocalClusteringCoefficient {
    average: AccId<AvgPair, AvgDef>,
}

impl VertexProgram for LocalClusteringCoefficient {
    type Value = f64;
    type Msg = LccMessage;
    type Edge = ();

    fn init(&self, _vertex: VertexId, _graph: &Graph) -> f64 {
        0.0
    }

    fn compute(
        &self,
        vertex: &mut EvalVertexView<'_, Self>,
        messages: Vec<Message<LccMessage>>,
    ) -> Result<Step, GraphError> {
        match vertex.superstep() {
            1 => {
                let neighbours: Vec<VertexId> = vertex.neighbours().collect();
                *vertex.value_mut() = neighbours.len() as f64;
                if neighbours.len() >= 2 {
                    for &target in &neighbours {
                        for &probe in &neighbours {
                            if probe != target {
                                let inquiry = LccMessage::Inquiry {
                                    source: vertex.id(),
                                    target,
                                };
                                vertex.send(probe, inquiry);
                            }
                        }
                    }
                }
                Ok(Step::Continue)
            }
            2 => {
                let lookup: FxHashSet<VertexId> = vertex.neighbours().collect();
                for m in messages {
                    if let LccMessage::Inquiry { source, target } = m.payload {
                        if lookup.contains(&target) {
                            vertex.send(source, LccMessage::Reply);
                        }
                    }
                }
                Ok(Step::Continue)
            }
            _ => {
                let n = *vertex.value();
                let lcc = if n < 2.0 {
                    0.0
                } else {
                    messages.len() as f64 / (n * (n - 1.0))
                };
                *vertex.value_mut() = lcc;
                vertex.global_update(&self.average, AvgPair::single(lcc));
                Ok(Step::Done)
            }
        }
    }
}

/// Local clustering coefficient of every vertex.
///
/// On directed graphs neighbourhoods and links are taken over outgoing edges.
/// Vertices with fewer than two neighbours score 0.
///
/// # Arguments
///
/// - `g` - A reference to the graph
/// - `threads` - (Optional) Number of threads to use
///
/// # Returns
///
/// An [`LccResult`] with the per-vertex coefficients and their mean, which is
/// 0 on an empty graph.
pub fn local_clustering_coefficient(
    g: &Graph,
    threads: Option<usize>,
) -> Result<LccResult, GraphError> {
    let average = accumulators::avg(0);
    let mut ctx = Context::new(g);
    ctx.global_agg(average);

    let output = Runner::new(ctx, LocalClusteringCoefficient { average }).run(usize::MAX, threads)?;
    let mean = output
        .read_global(&average)
        .map_or(0.0, |pair| pair.mean());
    Ok(LccResult {
        coefficients: output.values,
        average: mean,
    })
}

#[cfg(test)]
mod lcc_test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn undirected_triangle_is_fully_clustered() {
        let g = Graph::from_edges(false, [(1, 2), (2, 3), (3, 1)]);
        let result = local_clustering_coefficient(&g, None).unwrap();
        for v in [1u64, 2, 3] {
            assert_eq!(result.coefficients[&v], 1.0, "vertex {v}");
        }
        assert_eq!(result.average, 1.0);
    }

    #[test]
    fn fewer_than_two_neighbours_scores_zero() {
        let g = Graph::from_edges(false, [(1, 2)]);
        let result = local_clustering_coefficient(&g, None).unwrap();
        assert_eq!(result.coefficients[&1], 0.0);
        assert_eq!(result.coefficients[&2], 0.0);
    }

    #[test]
    fn directed_wedge_with_one_closing_edge() {
        // 1 -> 2, 1 -> 3, 2 -> 3: of 1's two ordered pairs only (2, 3) closes
        let g = Graph::from_edges(true, [(1, 2), (1, 3), (2, 3)]);
        let result = local_clustering_coefficient(&g, None).unwrap();
        assert!(close(result.coefficients[&1], 0.5));
        assert_eq!(result.coefficients[&2], 0.0);
        assert_eq!(result.coefficients[&3], 0.0);
    }

    #[test]
    fn triangle_with_a_pendant_vertex() {
        let g = Graph::from_edges(false, [(1, 2), (2, 3), (3, 1), (3, 4)]);
        let result = local_clustering_coefficient(&g, None).unwrap();
        assert_eq!(result.coefficients[&1], 1.0);
        assert_eq!(result.coefficients[&2], 1.0);
        // 3 has neighbours {1, 2, 4}; only the 1-2 pair closes
        assert!(close(result.coefficients[&3], 1.0 / 3.0));
        assert_eq!(result.coefficients[&4], 0.0);
    }

    #[test]
    fn average_matches_the_arithmetic_mean() {
        let g = Graph::from_edges(false, [(1, 2), (2, 3), (3, 1), (3, 4)]);
        let result = local_clustering_coefficient(&g, None).unwrap();
        let mean: f64 =
            result.coefficients.values().sum::<f64>() / result.coefficients.len() as f64;
        assert!(close(result.average, mean));
    }
}
