use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

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

/// Minimum score gain before a vertex abandons its current label.
const SCORE_EPSILON: f32 = 1e-5;

/// Tuning knobs for [`community_detection`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommunityDetectionParams {
    /// Exponent on sender degree when weighing a label vote. Positive values
    /// favour labels carried by hubs, negative values favour leaf labels,
    /// zero treats all senders alike.
    pub node_preference: f32,
    /// Score decay applied each time a label is adopted from a neighbour,
    /// limiting how far a community spreads from its origin.
    pub hop_attenuation: f32,
    /// Number of label-update rounds to run.
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LabelState {
    label: VertexId,
    score: f32,
    #[serde(skip)]
    bidirectional: FxHashSet<VertexId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelMessage {
    label: VertexId,
    score: f32,
    degree: usize,
}

/// Label propagation with hop attenuation and node preference.
///
/// Superstep 1 seeds every vertex with its own id at full score and records,
/// on directed graphs, which neighbours are connected in both directions so
/// their votes can be counted twice. Each following round tallies incoming
/// label votes weighted by sender degree, adopts the numerically smallest
/// label whose aggregate is within [`SCORE_EPSILON`] of the strongest, and
/// refreshes the score to that label's best raw score, attenuated when the
/// label changed hands. The round counter, not quiescence, ends the job.
#[derive(Debug, Clone)]
struct CommunityDetection {
    params: CommunityDetectionParams,
}

impl CommunityDetection {
    fn broadcast(&self, vertex: &EvalVertexView<'_, Self>) {
        let state = vertex.value();
        let msg = LabelMessage {
            label: state.label,
            score: state.score,
            degree: vertex.degree_undirected(),
        };
        let targets: Vec<VertexId> = vertex.neighbours_undirected().collect();
        for n in targets {
            vertex.send(n, msg.clone());
        }
    }
}

impl VertexProgram for CommunityDetection {
    type Value = LabelState;
    type Msg = LabelMessage;
    type Edge = ();

    fn init(&self, vertex: VertexId, _graph: &Graph) -> LabelState {
        LabelState {
            label: vertex,
            score: 1.0,
            bidirectional: FxHashSet::default(),
        }
    }

    fn compute(
        &self,
        vertex: &mut EvalVertexView<'_, Self>,
        messages: Vec<Message<LabelMessage>>,
    ) -> Result<Step, GraphError> {
        if vertex.superstep() == 1 {
            if vertex.graph().is_directed() {
                let outgoing: FxHashSet<VertexId> = vertex.out_neighbours()?.collect();
                let bidirectional: FxHashSet<VertexId> = vertex
                    .in_neighbours()?
                    .filter(|n| outgoing.contains(n))
                    .collect();
                vertex.value_mut().bidirectional = bidirectional;
            }
            self.broadcast(vertex);
            return Ok(Step::Continue);
        }

        if vertex.superstep() > self.params.max_iterations + 1 {
            return Ok(Step::Done);
        }

        if !messages.is_empty() {
            // weighted vote per label, plus the strongest raw score carrying it
            let mut votes: FxHashMap<VertexId, (f32, f32)> = FxHashMap::default();
            for m in &messages {
                let mut weight =
                    m.payload.score * (m.payload.degree as f32).powf(self.params.node_preference);
                if vertex.value().bidirectional.contains(&m.from) {
                    weight *= 2.0;
                }
                let entry = votes.entry(m.payload.label).or_insert((0.0, f32::MIN));
                entry.0 += weight;
                entry.1 = entry.1.max(m.payload.score);
            }

            // strongest aggregate wins; among labels within epsilon of it the
            // numerically smallest is chosen, with no privilege for the
            // current label
            let top = votes.values().map(|&(total, _)| total).fold(f32::MIN, f32::max);
            let chosen = votes
                .keys()
                .copied()
                .filter(|label| votes[label].0 > top - SCORE_EPSILON)
                .min();

            if let Some(chosen) = chosen {
                let (_, max_raw) = votes[&chosen];
                let delta = if chosen != vertex.value().label {
                    self.params.hop_attenuation
                } else {
                    0.0
                };
                let state = vertex.value_mut();
                state.label = chosen;
                state.score = max_raw - delta;
            }
        }

        self.broadcast(vertex);
        Ok(Step::Continue)
    }
}

/// Assigns every vertex to a community via score-weighted label propagation.
///
/// # Arguments
///
/// - `g` - A reference to the graph
/// - `params` - Propagation weights and the round budget
/// - `threads` - (Optional) Number of threads to use
///
/// # Returns
///
/// A map from vertex id to the id of the vertex that seeded its community.
pub fn community_detection(
    g: &Graph,
    params: CommunityDetectionParams,
    threads: Option<usize>,
) -> Result<FxHashMap<VertexId, VertexId>, GraphError> {
    if !params.node_preference.is_finite() {
        return Err(GraphError::InvalidParameter {
            name: "node_preference",
            reason: format!("must be finite, got {}", params.node_preference),
        });
    }
    if !params.hop_attenuation.is_finite() {
        return Err(GraphError::InvalidParameter {
            name: "hop_attenuation",
            reason: format!("must be finite, got {}", params.hop_attenuation),
        });
    }

    let ctx = Context::new(g);
    let output = Runner::new(ctx, CommunityDetection { params }).run(usize::MAX, threads)?;
    Ok(output
        .values
        .into_iter()
        .map(|(v, state)| (v, state.label))
        .collect())
}

#[cfg(test)]
mod cd_test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(max_iterations: usize) -> CommunityDetectionParams {
        CommunityDetectionParams {
            node_preference: 0.1,
            hop_attenuation: 0.1,
            max_iterations,
        }
    }

    #[test]
    fn zero_iterations_leaves_every_vertex_in_its_own_community() {
        let g = Graph::from_edges(false, [(1, 2), (2, 3)]);
        let result = community_detection(&g, params(0), None).unwrap();
        let expected: FxHashMap<VertexId, VertexId> =
            [(1, 1), (2, 2), (3, 3)].into_iter().collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn disjoint_triangles_converge_to_their_smallest_ids() {
        let g = Graph::from_edges(
            false,
            [(1, 2), (2, 3), (3, 1), (4, 5), (5, 6), (6, 4)],
        );
        let result = community_detection(&g, params(10), None).unwrap();
        let expected: FxHashMap<VertexId, VertexId> =
            [(1, 1), (2, 1), (3, 1), (4, 4), (5, 4), (6, 4)]
                .into_iter()
                .collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn round_budget_bounds_the_superstep_count() {
        let g = Graph::from_edges(false, [(1, 2), (2, 3), (3, 4)]);
        let ctx = Context::new(&g);
        let output = Runner::new(ctx, CommunityDetection { params: params(3) })
            .run(usize::MAX, None)
            .unwrap();
        assert!(output.supersteps <= 3 + 2, "ran {}", output.supersteps);
    }

    #[test]
    fn a_kept_label_still_refreshes_its_score() {
        // in a triangle every vertex ends up keeping label 1 while its
        // neighbours broadcast raw score 0.9, so the settled score must be
        // 0.9 for all of them rather than decaying further
        let g = Graph::from_edges(false, [(1, 2), (2, 3), (3, 1)]);
        let ctx = Context::new(&g);
        let output = Runner::new(ctx, CommunityDetection { params: params(10) })
            .run(usize::MAX, None)
            .unwrap();
        for (v, state) in &output.values {
            assert_eq!(state.label, 1, "vertex {v}");
            assert!(
                (state.score - 0.9).abs() < 1e-6,
                "vertex {v} score {}",
                state.score
            );
        }
    }

    #[test]
    fn an_equal_scoring_smaller_label_displaces_the_current_one() {
        // the self-loop keeps 5's own label in its vote map, tied with the
        // incoming label 1; the smaller label must win the tie
        let g = Graph::from_edges(false, [(5, 5), (1, 5)]);
        let p = CommunityDetectionParams {
            node_preference: 0.0,
            hop_attenuation: 0.1,
            max_iterations: 10,
        };
        let result = community_detection(&g, p, None).unwrap();
        let expected: FxHashMap<VertexId, VertexId> = [(1, 1), (5, 1)].into_iter().collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let g = Graph::from_edges(false, [(1, 2)]);
        let bad = CommunityDetectionParams {
            node_preference: f32::NAN,
            hop_attenuation: 0.1,
            max_iterations: 1,
        };
        assert!(matches!(
            community_detection(&g, bad, None),
            Err(GraphError::InvalidParameter {
                name: "node_preference",
                ..
            })
        ));
    }

    #[test]
    fn every_label_is_an_existing_vertex() {
        let g = Graph::from_edges(true, [(1, 2), (2, 1), (2, 3), (3, 4), (4, 2)]);
        let result = community_detection(&g, params(5), None).unwrap();
        for (v, label) in &result {
            assert!(g.has_vertex(*label), "vertex {v} got label {label}");
        }
    }
}
