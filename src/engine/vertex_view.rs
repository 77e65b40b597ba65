use tracing::trace;

use crate::core::{
    agg::{AccId, Accumulator, AggregatorRegistry, StateType},
    errors::GraphError,
    graph::{Graph, VertexId},
    message::MessageRouter,
};

use super::program::VertexProgram;

/// A vertex as seen from inside its own compute invocation.
///
/// Holds exclusive access to the vertex's value; everything else (topology,
/// router, aggregators) is shared read-side state. All cross-vertex effects go
/// through [`EvalVertexView::send`] or [`EvalVertexView::global_update`] and
/// become visible in the next superstep.
pub struct EvalVertexView<'a, P: VertexProgram> {
    ss: usize,
    idx: usize,
    id: VertexId,
    value: &'a mut P::Value,
    graph: &'a Graph<P::Edge>,
    router: &'a MessageRouter<P::Msg>,
    registry: &'a AggregatorRegistry,
}

impl<'a, P: VertexProgram> EvalVertexView<'a, P> {
    pub(crate) fn new(
        ss: usize,
        idx: usize,
        value: &'a mut P::Value,
        graph: &'a Graph<P::Edge>,
        router: &'a MessageRouter<P::Msg>,
        registry: &'a AggregatorRegistry,
    ) -> Self {
        let id = graph.id_of(idx);
        Self {
            ss,
            idx,
            id,
            value,
            graph,
            router,
            registry,
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn superstep(&self) -> usize {
        self.ss
    }

    pub fn value(&self) -> &P::Value {
        self.value
    }

    pub fn value_mut(&mut self) -> &mut P::Value {
        self.value
    }

    pub fn graph(&self) -> &Graph<P::Edge> {
        self.graph
    }

    pub fn degree(&self) -> usize {
        self.graph.degree(self.id)
    }

    pub fn degree_undirected(&self) -> usize {
        self.graph.degree_undirected(self.id)
    }

    /// Out-neighbours on a directed graph, all adjacent on an undirected one.
    pub fn neighbours(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.neighbour_ids(self.idx)
    }

    pub fn neighbours_undirected(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.und_neighbour_ids(self.idx)
    }

    pub fn out_neighbours(&self) -> Result<impl Iterator<Item = VertexId> + '_, GraphError> {
        self.graph.out_neighbours(self.id)
    }

    pub fn in_neighbours(&self) -> Result<impl Iterator<Item = VertexId> + '_, GraphError> {
        self.graph.in_neighbours(self.id)
    }

    /// Queue a message for delivery at the start of the next superstep.
    /// Targets absent from the graph are dropped.
    pub fn send(&self, to: VertexId, payload: P::Msg) {
        match self.graph.index_of(to) {
            Some(target) => self.router.send(self.id, target, payload),
            None => trace!(from = self.id, to, "message to unknown vertex dropped"),
        }
    }

    pub fn send_to_neighbours(&self, payload: P::Msg) {
        for n in self.neighbours() {
            self.send(n, payload.clone());
        }
    }

    /// Contribute to a global aggregator; merged at the barrier.
    pub fn global_update<A: StateType, ACC: Accumulator<A>>(&self, id: &AccId<A, ACC>, value: A) {
        self.registry.accumulate(id, value);
    }

    /// Read the previous superstep's merged aggregator value.
    pub fn read_global<A: StateType, ACC: Accumulator<A>>(&self, id: &AccId<A, ACC>) -> Option<A> {
        self.registry.read(id)
    }
}
