use crate::core::{
    agg::{AccId, Accumulator, AggregatorRegistry, StateType},
    graph::Graph,
};

/// Per-job execution context: the graph under computation, the superstep
/// counter and the aggregator registry. Aggregators are registered here before
/// the run starts; the runner owns the barrier.
pub struct Context<'g, E> {
    graph: &'g Graph<E>,
    ss: usize,
    registry: AggregatorRegistry,
}

impl<'g, E> Context<'g, E> {
    pub fn new(graph: &'g Graph<E>) -> Self {
        Self {
            graph,
            ss: 1,
            registry: AggregatorRegistry::default(),
        }
    }

    pub fn graph(&self) -> &'g Graph<E> {
        self.graph
    }

    pub fn ss(&self) -> usize {
        self.ss
    }

    pub fn global_agg<A: StateType, ACC: Accumulator<A>>(&mut self, id: AccId<A, ACC>) {
        self.registry.register(id);
    }

    pub(crate) fn registry(&self) -> &AggregatorRegistry {
        &self.registry
    }

    pub(crate) fn increment_ss(&mut self) {
        self.ss += 1;
    }

    pub(crate) fn merge_aggregators(&mut self) {
        self.registry.barrier();
    }

    pub(crate) fn into_registry(self) -> AggregatorRegistry {
        self.registry
    }
}
