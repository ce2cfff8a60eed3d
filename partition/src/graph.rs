use petgraph::{
    graph::{node_index, UnGraph},
    visit::EdgeRef,
};

/// Undirected graph with integer edge weights, indexed by `u32` node ids `0..node_count`.
///
/// Adding an edge that already exists accumulates its weight instead of duplicating it.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: UnGraph<(), u32>,
}

impl Graph {
    pub fn new(node_count: usize) -> Self {
        let mut inner = UnGraph::with_capacity(node_count, node_count * 3);
        for _ in 0..node_count {
            inner.add_node(());
        }
        Self { inner }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Self loops are ignored.
    pub fn add_edge(&mut self, a: u32, b: u32, weight: u32) {
        if a == b {
            return;
        }
        let (a, b) = (node_index(a as usize), node_index(b as usize));

        match self.inner.find_edge(a, b) {
            Some(e) => self.inner[e] += weight,
            None => {
                self.inner.add_edge(a, b, weight);
            }
        }
    }

    /// Weight of the edge between `a` and `b`, 0 if they are not adjacent
    pub fn weight(&self, a: u32, b: u32) -> u32 {
        self.inner
            .find_edge(node_index(a as usize), node_index(b as usize))
            .map_or(0, |e| self.inner[e])
    }

    /// `(neighbour, weight)` pairs of `node`
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = node_index(node as usize);
        self.inner.edges(n).map(move |e| {
            let other = if e.source() == n { e.target() } else { e.source() };
            (other.index() as u32, *e.weight())
        })
    }

    /// The graph restricted to `nodes`, renumbered so `nodes[i]` becomes node `i`.
    pub fn induced_subgraph(&self, nodes: &[u32]) -> Graph {
        let mut local = vec![u32::MAX; self.node_count()];
        for (i, &n) in nodes.iter().enumerate() {
            local[n as usize] = i as u32;
        }

        let mut sub = Graph::new(nodes.len());
        for (i, &n) in nodes.iter().enumerate() {
            for (other, weight) in self.neighbors(n) {
                let j = local[other as usize];
                // Each edge is seen from both ends
                if j != u32::MAX && (i as u32) < j {
                    sub.inner
                        .add_edge(node_index(i), node_index(j as usize), weight);
                }
            }
        }
        sub
    }

    /// Total weight of edges whose endpoints are on different sides
    pub fn cut_cost(&self, sides: &[u8]) -> u64 {
        self.inner
            .edge_references()
            .filter(|e| sides[e.source().index()] != sides[e.target().index()])
            .map(|e| *e.weight() as u64)
            .sum()
    }
}

impl From<UnGraph<(), u32>> for Graph {
    fn from(inner: UnGraph<(), u32>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_weights_accumulate() {
        let mut g = Graph::new(3);

        g.add_edge(0, 1, 1);
        g.add_edge(1, 0, 2);
        g.add_edge(1, 2, 5);
        g.add_edge(2, 2, 7);

        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.weight(0, 1), 3);
        assert_eq!(g.weight(2, 1), 5);
        assert_eq!(g.weight(0, 2), 0);

        let mut n: Vec<_> = g.neighbors(1).collect();
        n.sort();
        assert_eq!(n, vec![(0, 3), (2, 5)]);
    }

    #[test]
    fn test_induced_subgraph() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1);
        g.add_edge(1, 2, 2);
        g.add_edge(2, 3, 3);
        g.add_edge(3, 0, 4);

        let sub = g.induced_subgraph(&[3, 2, 1]);

        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(sub.weight(0, 1), 3);
        assert_eq!(sub.weight(1, 2), 2);
        assert_eq!(sub.weight(0, 2), 0);
    }

    #[test]
    fn test_cut_cost() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1);
        g.add_edge(1, 2, 2);
        g.add_edge(2, 3, 3);

        assert_eq!(g.cut_cost(&[0, 0, 1, 1]), 2);
        assert_eq!(g.cut_cost(&[0, 1, 0, 1]), 6);
    }
}
