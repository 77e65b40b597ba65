//! Immutable adjacency store shared read-only across a job.
//!
//! Directed graphs materialise three views at load time: outgoing edges,
//! incoming edges and the undirected union of the two. The union view is what
//! weak-connectivity style algorithms traverse; the incoming view is needed by
//! programs that test edge bidirectionality. Undirected graphs keep a single
//! symmetric adjacency and reject the directed views.

use rustc_hash::FxHashMap;

use crate::core::errors::GraphError;

pub type VertexId = u64;

#[derive(Debug, Clone)]
pub struct Graph<E = ()> {
    directed: bool,
    ids: Vec<VertexId>,
    index: FxHashMap<VertexId, usize>,
    out: Vec<Vec<(usize, E)>>,
    inc: Vec<Vec<(usize, E)>>,
    und: Vec<Vec<usize>>,
}

impl<E: Clone> Graph<E> {
    /// Build a graph from an explicit vertex set and an edge list.
    ///
    /// Fails with [`GraphError::DanglingEdge`] if an edge endpoint is missing
    /// from the vertex set. Neighbour lists are sorted by vertex id and
    /// deduplicated, so iteration order is deterministic.
    pub fn load(
        directed: bool,
        vertices: impl IntoIterator<Item = VertexId>,
        edges: impl IntoIterator<Item = (VertexId, VertexId, E)>,
    ) -> Result<Self, GraphError> {
        let mut ids: Vec<VertexId> = vertices.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let index: FxHashMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let mut resolved = Vec::new();
        for (src, dst, value) in edges {
            let (s, d) = match (index.get(&src), index.get(&dst)) {
                (Some(&s), Some(&d)) => (s, d),
                _ => return Err(GraphError::DanglingEdge { src, dst }),
            };
            resolved.push((s, d, value));
        }

        Ok(Self::build(directed, ids, index, resolved))
    }

    fn build(
        directed: bool,
        ids: Vec<VertexId>,
        index: FxHashMap<VertexId, usize>,
        edges: Vec<(usize, usize, E)>,
    ) -> Self {
        let n = ids.len();
        let mut out: Vec<Vec<(usize, E)>> = (0..n).map(|_| Vec::new()).collect();
        let mut inc: Vec<Vec<(usize, E)>> = (0..n).map(|_| Vec::new()).collect();
        let mut und: Vec<Vec<usize>> = (0..n).map(|_| Vec::new()).collect();

        for (s, d, value) in edges {
            if directed {
                out[s].push((d, value.clone()));
                inc[d].push((s, value));
                und[s].push(d);
                und[d].push(s);
            } else {
                out[s].push((d, value.clone()));
                und[s].push(d);
                if s != d {
                    out[d].push((s, value));
                    und[d].push(s);
                }
            }
        }

        for adj in out.iter_mut().chain(inc.iter_mut()) {
            adj.sort_by_key(|(t, _)| *t);
            adj.dedup_by_key(|(t, _)| *t);
        }
        for adj in und.iter_mut() {
            adj.sort_unstable();
            adj.dedup();
        }

        Self {
            directed,
            ids,
            index,
            out,
            inc,
            und,
        }
    }
}

impl Graph<()> {
    /// Build an unweighted graph from an edge list, deriving the vertex set
    /// from the edge endpoints.
    pub fn from_edges(
        directed: bool,
        edges: impl IntoIterator<Item = (VertexId, VertexId)>,
    ) -> Self {
        let edges: Vec<(VertexId, VertexId)> = edges.into_iter().collect();
        let mut ids: Vec<VertexId> = edges.iter().flat_map(|&(s, d)| [s, d]).collect();
        ids.sort_unstable();
        ids.dedup();
        let index: FxHashMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let resolved = edges
            .into_iter()
            .map(|(s, d)| (index[&s], index[&d], ()))
            .collect();
        Self::build(directed, ids, index, resolved)
    }
}

impl<E> Graph<E> {
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn num_vertices(&self) -> usize {
        self.ids.len()
    }

    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.index.contains_key(&vertex)
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.ids.iter().copied()
    }

    /// Out-neighbours on a directed graph, all adjacent vertices on an
    /// undirected one. Unknown vertices yield an empty iterator.
    pub fn neighbours(&self, vertex: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.out_slice(vertex).iter().map(|(t, _)| self.ids[*t])
    }

    /// Neighbours with edge payloads, same view as [`Graph::neighbours`].
    pub fn edges(&self, vertex: VertexId) -> impl Iterator<Item = (VertexId, &E)> + '_ {
        self.out_slice(vertex).iter().map(|(t, e)| (self.ids[*t], e))
    }

    /// Neighbours ignoring edge direction: the union of incoming and outgoing
    /// on a directed graph, the plain adjacency on an undirected one.
    pub fn neighbours_undirected(&self, vertex: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.und_slice(vertex).iter().map(|t| self.ids[*t])
    }

    pub fn out_neighbours(
        &self,
        vertex: VertexId,
    ) -> Result<impl Iterator<Item = VertexId> + '_, GraphError> {
        if !self.directed {
            return Err(GraphError::UndirectedEdgeView);
        }
        Ok(self.out_slice(vertex).iter().map(|(t, _)| self.ids[*t]))
    }

    pub fn in_neighbours(
        &self,
        vertex: VertexId,
    ) -> Result<impl Iterator<Item = VertexId> + '_, GraphError> {
        if !self.directed {
            return Err(GraphError::UndirectedEdgeView);
        }
        let slice = self
            .index
            .get(&vertex)
            .map(|&i| self.inc[i].as_slice())
            .unwrap_or(&[]);
        Ok(slice.iter().map(|(t, _)| self.ids[*t]))
    }

    pub fn degree(&self, vertex: VertexId) -> usize {
        self.out_slice(vertex).len()
    }

    pub fn degree_undirected(&self, vertex: VertexId) -> usize {
        self.und_slice(vertex).len()
    }

    fn out_slice(&self, vertex: VertexId) -> &[(usize, E)] {
        self.index
            .get(&vertex)
            .map(|&i| self.out[i].as_slice())
            .unwrap_or(&[])
    }

    fn und_slice(&self, vertex: VertexId) -> &[usize] {
        self.index
            .get(&vertex)
            .map(|&i| self.und[i].as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn index_of(&self, vertex: VertexId) -> Option<usize> {
        self.index.get(&vertex).copied()
    }

    pub(crate) fn id_of(&self, index: usize) -> VertexId {
        self.ids[index]
    }

    pub(crate) fn neighbour_ids(&self, index: usize) -> impl Iterator<Item = VertexId> + '_ {
        self.out[index].iter().map(|(t, _)| self.ids[*t])
    }

    pub(crate) fn und_neighbour_ids(&self, index: usize) -> impl Iterator<Item = VertexId> + '_ {
        self.und[index].iter().map(|t| self.ids[*t])
    }
}
