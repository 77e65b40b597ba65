//! The superstep coordinator.
//!
//! Drives the compute → route → merge → barrier cycle: every vertex that is
//! not halted or has mail is invoked in parallel, then the router buffers are
//! swapped and the aggregator contributions merged. The job terminates when
//! every vertex has voted to halt with nothing pending, or when the superstep
//! cap is reached.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::{
    agg::{AccId, Accumulator, AggregatorRegistry, StateType},
    errors::GraphError,
    graph::VertexId,
    message::MessageRouter,
};

use super::{
    context::Context,
    custom_pool,
    program::{Step, VertexProgram},
    vertex_view::EvalVertexView,
    POOL,
};

/// Terminal state of a job: per-vertex values, the number of supersteps
/// executed and the final aggregator reads.
pub struct JobOutput<V> {
    pub values: FxHashMap<VertexId, V>,
    pub supersteps: usize,
    registry: AggregatorRegistry,
}

impl<V> JobOutput<V> {
    pub fn read_global<A: StateType, ACC: Accumulator<A>>(&self, id: &AccId<A, ACC>) -> Option<A> {
        self.registry.read(id)
    }
}

pub struct Runner<'g, P: VertexProgram> {
    ctx: Context<'g, P::Edge>,
    program: P,
}

impl<'g, P: VertexProgram> Runner<'g, P> {
    pub fn new(ctx: Context<'g, P::Edge>, program: P) -> Self {
        Self { ctx, program }
    }

    /// Execute the job. `steps` caps the number of supersteps regardless of
    /// the program's own termination behavior; programs that quiesce on their
    /// own are run with `usize::MAX`.
    pub fn run(
        mut self,
        steps: usize,
        num_threads: Option<usize>,
    ) -> Result<JobOutput<P::Value>, GraphError> {
        let pool = num_threads.map(custom_pool).unwrap_or_else(|| POOL.clone());
        let graph = self.ctx.graph();
        let n = graph.num_vertices();

        let mut values: Vec<P::Value> = graph
            .vertices()
            .map(|v| self.program.init(v, graph))
            .collect();
        let mut halted = vec![false; n];
        let mut router: MessageRouter<P::Msg> = MessageRouter::new(n);

        let supersteps = pool.install(|| -> Result<usize, GraphError> {
            loop {
                let ss = self.ctx.ss();
                let mut inboxes = router.take_current();
                let registry = self.ctx.registry();
                let program = &self.program;
                let router_ref = &router;

                values
                    .par_iter_mut()
                    .zip(halted.par_iter_mut())
                    .zip(inboxes.par_iter_mut())
                    .enumerate()
                    .try_for_each(|(idx, ((value, halt), inbox))| {
                        if *halt && inbox.is_empty() {
                            return Ok(());
                        }
                        // a message re-activates a halted vertex
                        *halt = false;
                        let messages = std::mem::take(inbox);
                        let mut view =
                            EvalVertexView::new(ss, idx, value, graph, router_ref, registry);
                        if let Step::Done = program.compute(&mut view, messages)? {
                            *halt = true;
                        }
                        Ok(())
                    })?;

                let pending = router.swap_buffers();
                self.ctx.merge_aggregators();

                let active = halted.iter().filter(|h| !**h).count();
                debug!(superstep = ss, pending, active, "superstep complete");

                if (active == 0 && pending == 0) || ss >= steps {
                    break Ok(ss);
                }
                self.ctx.increment_ss();
            }
        })?;

        let values = graph.vertices().zip(values).collect();
        Ok(JobOutput {
            values,
            supersteps,
            registry: self.ctx.into_registry(),
        })
    }
}
