//! Named global reduction cells.
//!
//! An aggregator is registered once per job under a numeric id with a typed
//! handle ([`AccId`]); every vertex may contribute values during a superstep
//! and the merged result becomes readable by all vertices one superstep later.
//! Merge semantics come from an [`Accumulator`] definition and must be
//! commutative and associative, which is why the running average is carried as
//! an [`AvgPair`] rather than a float mean.

use std::{any::Any, marker::PhantomData, sync::Arc};

use num_traits::{Bounded, Zero};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait StateType: Clone + Send + Sync + 'static {}
impl<T: Clone + Send + Sync + 'static> StateType for T {}

/// Merge semantics for an aggregated value.
pub trait Accumulator<A: StateType>: Send + Sync + 'static {
    fn zero() -> A;
    fn combine(acc: &mut A, other: A);
}

pub struct MinDef<A>(PhantomData<A>);
pub struct MaxDef<A>(PhantomData<A>);
pub struct SumDef<A>(PhantomData<A>);
pub struct AvgDef;

impl<A: StateType + Ord + Bounded> Accumulator<A> for MinDef<A> {
    fn zero() -> A {
        A::max_value()
    }

    fn combine(acc: &mut A, other: A) {
        if other < *acc {
            *acc = other;
        }
    }
}

impl<A: StateType + Ord + Bounded> Accumulator<A> for MaxDef<A> {
    fn zero() -> A {
        A::min_value()
    }

    fn combine(acc: &mut A, other: A) {
        if other > *acc {
            *acc = other;
        }
    }
}

impl<A: StateType + Zero> Accumulator<A> for SumDef<A> {
    fn zero() -> A {
        A::zero()
    }

    fn combine(acc: &mut A, other: A) {
        let sum = std::mem::replace(acc, A::zero()) + other;
        *acc = sum;
    }
}

/// Running average carried as `(sum, count)` so merging stays associative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AvgPair {
    pub sum: f64,
    pub count: u64,
}

impl AvgPair {
    pub fn single(value: f64) -> Self {
        Self {
            sum: value,
            count: 1,
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl Accumulator<AvgPair> for AvgDef {
    fn zero() -> AvgPair {
        AvgPair::default()
    }

    fn combine(acc: &mut AvgPair, other: AvgPair) {
        acc.sum += other.sum;
        acc.count += other.count;
    }
}

/// Typed handle for one aggregator cell.
pub struct AccId<A: StateType, ACC: Accumulator<A>> {
    id: u32,
    _marker: PhantomData<fn() -> (A, ACC)>,
}

impl<A: StateType, ACC: Accumulator<A>> std::fmt::Debug for AccId<A, ACC> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccId").field(&self.id).finish()
    }
}

impl<A: StateType, ACC: Accumulator<A>> Clone for AccId<A, ACC> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: StateType, ACC: Accumulator<A>> Copy for AccId<A, ACC> {}

impl<A: StateType, ACC: Accumulator<A>> AccId<A, ACC> {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

pub mod accumulators {
    use super::*;

    pub fn min<A: StateType + Ord + Bounded>(id: u32) -> AccId<A, MinDef<A>> {
        AccId::new(id)
    }

    pub fn max<A: StateType + Ord + Bounded>(id: u32) -> AccId<A, MaxDef<A>> {
        AccId::new(id)
    }

    pub fn sum<A: StateType + Zero>(id: u32) -> AccId<A, SumDef<A>> {
        AccId::new(id)
    }

    pub fn avg(id: u32) -> AccId<AvgPair, AvgDef> {
        AccId::new(id)
    }
}

struct AggCell {
    current: Mutex<Box<dyn Any + Send + Sync>>,
    merged: Option<Box<dyn Any + Send + Sync>>,
    zero: Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>,
}

/// Registry of all aggregator cells for one job execution.
#[derive(Default)]
pub struct AggregatorRegistry {
    cells: FxHashMap<u32, AggCell>,
}

impl AggregatorRegistry {
    pub fn register<A: StateType, ACC: Accumulator<A>>(&mut self, id: AccId<A, ACC>) {
        let zero: Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync> =
            Arc::new(|| Box::new(ACC::zero()));
        self.cells.insert(
            id.id(),
            AggCell {
                current: Mutex::new(zero()),
                merged: None,
                zero,
            },
        );
    }

    /// Merge one contribution into the running value for this superstep.
    /// Contributions to an unregistered id are dropped.
    pub fn accumulate<A: StateType, ACC: Accumulator<A>>(&self, id: &AccId<A, ACC>, value: A) {
        let Some(cell) = self.cells.get(&id.id()) else {
            warn!(aggregator = id.id(), "contribution to unregistered aggregator dropped");
            return;
        };
        let mut current = cell.current.lock();
        let acc = current
            .downcast_mut::<A>()
            .expect("aggregator registered with a different value type");
        ACC::combine(acc, value);
    }

    /// The previous superstep's merged value, `None` before the first barrier.
    pub fn read<A: StateType, ACC: Accumulator<A>>(&self, id: &AccId<A, ACC>) -> Option<A> {
        self.cells
            .get(&id.id())?
            .merged
            .as_ref()?
            .downcast_ref::<A>()
            .cloned()
    }

    /// Barrier rotation: this superstep's merge becomes readable, the
    /// contribution cell resets to zero.
    pub(crate) fn barrier(&mut self) {
        for cell in self.cells.values_mut() {
            let fresh = (cell.zero)();
            cell.merged = Some(std::mem::replace(cell.current.get_mut(), fresh));
        }
    }
}

#[cfg(test)]
mod agg_test {
    use super::*;

    #[test]
    fn merged_value_is_readable_only_after_the_barrier() {
        let mut registry = AggregatorRegistry::default();
        let total = accumulators::sum::<u64>(0);
        registry.register(total);

        registry.accumulate(&total, 3);
        registry.accumulate(&total, 4);
        assert_eq!(registry.read(&total), None);

        registry.barrier();
        assert_eq!(registry.read(&total), Some(7));
    }

    #[test]
    fn cells_reset_between_supersteps() {
        let mut registry = AggregatorRegistry::default();
        let smallest = accumulators::min::<u64>(1);
        registry.register(smallest);

        registry.accumulate(&smallest, 5);
        registry.barrier();
        assert_eq!(registry.read(&smallest), Some(5));

        registry.barrier();
        assert_eq!(registry.read(&smallest), Some(u64::MAX));
    }

    #[test]
    fn average_merge_is_order_independent() {
        let values = [0.25, 0.5, 1.0, 0.0, 0.75];

        let mut forward = AggregatorRegistry::default();
        let mut reverse = AggregatorRegistry::default();
        let avg = accumulators::avg(0);
        forward.register(avg);
        reverse.register(avg);

        for v in values {
            forward.accumulate(&avg, AvgPair::single(v));
        }
        for v in values.iter().rev() {
            reverse.accumulate(&avg, AvgPair::single(*v));
        }
        forward.barrier();
        reverse.barrier();

        let f = forward.read(&avg).unwrap();
        let r = reverse.read(&avg).unwrap();
        assert_eq!(f, r);
        assert_eq!(f.mean(), 0.5);
    }

    #[test]
    fn unregistered_contributions_are_dropped() {
        let registry = AggregatorRegistry::default();
        let ghost = accumulators::sum::<u64>(9);
        registry.accumulate(&ghost, 1);
        assert_eq!(registry.read(&ghost), None);
    }
}
