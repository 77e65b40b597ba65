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

/// Distance reported for vertices the source cannot reach.
pub const UNREACHED: u64 = u64::MAX;

/// Single-source breadth-first search.
///
/// The source claims distance 0 in superstep 1 and messages its neighbours;
/// any vertex whose first message arrives in superstep `s` is at distance
/// `s - 1`, propagates once and never again. Every vertex votes to halt every
/// round, relying on message arrival to re-activate it, so the job quiesces as
/// soon as the frontier stops growing.
#[derive(Debug, Clone)]
struct BreadthFirstSearch {
    source: VertexId,
}

impl VertexProgram for BreadthFirstSearch {
    type Value = u64;
    type Msg = u64;
    type Edge = ();

    fn init(&self, _vertex: VertexId, _graph: &Graph) -> u64 {
        UNREACHED
    }

    fn compute(
        &self,
        vertex: &mut EvalVertexView<'_, Self>,
        _messages: Vec<Message<u64>>,
    ) -> Result<Step, GraphError> {
        if vertex.superstep() == 1 {
            if vertex.id() == self.source {
                *vertex.value_mut() = 0;
                vertex.send_to_neighbours(0);
            }
        } else if *vertex.value() == UNREACHED {
            // first message ever received, so this is the shortest distance
            let distance = (vertex.superstep() - 1) as u64;
            *vertex.value_mut() = distance;
            vertex.send_to_neighbours(distance);
        }
        Ok(Step::Done)
    }
}

/// Unweighted shortest-path distances from `source`.
///
/// # Arguments
///
/// - `g` - A reference to the graph
/// - `source` - The seed vertex; must exist in the graph
/// - `threads` - (Optional) Number of threads to use
///
/// # Returns
///
/// A map from vertex id to its distance from the source; unreachable vertices
/// map to [`UNREACHED`].
pub fn breadth_first_search(
    g: &Graph,
    source: VertexId,
    threads: Option<usize>,
) -> Result<FxHashMap<VertexId, u64>, GraphError> {
    if !g.has_vertex(source) {
        return Err(GraphError::MissingSource(source));
    }

    let ctx = Context::new(g);
    let output = Runner::new(ctx, BreadthFirstSearch { source }).run(usize::MAX, threads)?;
    Ok(output.values)
}

#[cfg(test)]
mod bfs_test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    fn distances(g: &Graph, source: VertexId) -> FxHashMap<VertexId, u64> {
        breadth_first_search(g, source, None).unwrap()
    }

    #[test]
    fn path_graph_distances_are_exact() {
        let g = Graph::from_edges(false, [(1, 2), (2, 3), (3, 4)]);
        let result = distances(&g, 1);
        let expected: FxHashMap<VertexId, u64> =
            [(1, 0), (2, 1), (3, 2), (4, 3)].into_iter().collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn unreachable_vertices_keep_the_sentinel() {
        let g = Graph::from_edges(false, [(1, 2), (5, 7)]);
        let result = distances(&g, 1);
        assert_eq!(result[&2], 1);
        assert_eq!(result[&5], UNREACHED);
        assert_eq!(result[&7], UNREACHED);
    }

    #[test]
    fn directed_edges_are_followed_forwards_only() {
        let g = Graph::from_edges(true, [(1, 2), (3, 2)]);
        let result = distances(&g, 1);
        assert_eq!(result[&2], 1);
        assert_eq!(result[&3], UNREACHED);
    }

    #[test]
    fn branching_picks_the_shortest_route() {
        // two routes to 5: 1-2-5 and 1-3-4-5
        let g = Graph::from_edges(false, [(1, 2), (2, 5), (1, 3), (3, 4), (4, 5)]);
        let result = distances(&g, 1);
        assert_eq!(result[&5], 2);
        assert_eq!(result[&4], 2);
    }

    #[test]
    fn missing_source_fails_before_the_run() {
        let g = Graph::from_edges(false, [(1, 2)]);
        let err = breadth_first_search(&g, 42, None).err();
        assert_eq!(err, Some(GraphError::MissingSource(42)));
    }

    fn reference_bfs(g: &Graph, source: VertexId) -> FxHashMap<VertexId, u64> {
        let mut dist: FxHashMap<VertexId, u64> =
            g.vertices().map(|v| (v, UNREACHED)).collect();
        dist.insert(source, 0);
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let d = dist[&v];
            for n in g.neighbours(v) {
                if dist[&n] == UNREACHED {
                    dist.insert(n, d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    #[quickcheck]
    fn matches_a_sequential_bfs(edges: Vec<(u8, u8)>) -> bool {
        if edges.is_empty() {
            return true;
        }
        let edges: Vec<(u64, u64)> = edges
            .into_iter()
            .map(|(s, d)| (s as u64, d as u64))
            .collect();
        let source = edges[0].0;
        let g = Graph::from_edges(false, edges);
        distances(&g, source) == reference_bfs(&g, source)
    }
}
