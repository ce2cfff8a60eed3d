use std::ops::Range;

use thiserror::Error;

use crate::{
    bisect::{Balance, Bisector, FmBisector},
    graph::Graph,
};

/// Graphs at least this large have their two halves partitioned on separate threads
const PARALLEL_NODE_THRESHOLD: usize = 2048;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitioningError {
    #[error("invalid part size range {min}..={max}")]
    InvalidPartSize { min: usize, max: usize },
    #[error("cannot bisect {nodes} nodes with side 0 in {min_left}..={max_left} (target {target_left})")]
    InvalidBalance {
        nodes: usize,
        min_left: usize,
        target_left: usize,
        max_left: usize,
    },
    #[error("bisection of {nodes} nodes left one side empty")]
    EmptySide { nodes: usize },
    #[error("bisector returned {got} sides for {expected} nodes")]
    SideCountMismatch { expected: usize, got: usize },
}

/// Nodes reordered so each part is a contiguous run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitioning {
    /// Permutation of `0..node_count`
    pub indexes: Vec<u32>,
    /// Disjoint, in order, covering `0..node_count`
    pub ranges: Vec<Range<usize>>,
}

impl Partitioning {
    /// Part number of every node
    pub fn part_of(&self) -> Vec<u32> {
        let mut parts = vec![0; self.indexes.len()];
        for (part, range) in self.ranges.iter().enumerate() {
            for &node in &self.indexes[range.clone()] {
                parts[node as usize] = part as u32;
            }
        }
        parts
    }

    pub fn parts(&self) -> impl Iterator<Item = &[u32]> {
        self.ranges.iter().map(|r| &self.indexes[r.clone()])
    }
}

/// Recursive bisection into parts of bounded size.
pub struct Partitioner {
    bisector: Box<dyn Bisector>,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(FmBisector::default())
    }
}

impl Partitioner {
    pub fn new(bisector: impl Bisector + 'static) -> Self {
        Self {
            bisector: Box::new(bisector),
        }
    }

    /// Split `graph` into parts of `min_part_size..=max_part_size` nodes. When the node count cannot
    /// be divided into parts that large, parts may shrink towards a single node.
    pub fn partition(
        &self,
        graph: &Graph,
        min_part_size: usize,
        max_part_size: usize,
    ) -> Result<Partitioning, PartitioningError> {
        if min_part_size == 0 || min_part_size > max_part_size {
            return Err(PartitioningError::InvalidPartSize {
                min: min_part_size,
                max: max_part_size,
            });
        }

        let n = graph.node_count();
        let mut indexes: Vec<u32> = (0..n as u32).collect();
        if n == 0 {
            return Ok(Partitioning::default());
        }

        let ranges =
            self.partition_recursive(graph, &mut indexes, 0, min_part_size, max_part_size)?;

        log::trace!("Partitioned {n} nodes into {} parts", ranges.len());

        Ok(Partitioning { indexes, ranges })
    }

    /// `indexes` holds the original ids of the nodes of `graph`, which is local to this subproblem.
    fn partition_recursive(
        &self,
        graph: &Graph,
        indexes: &mut [u32],
        offset: usize,
        min: usize,
        max: usize,
    ) -> Result<Vec<Range<usize>>, PartitioningError> {
        let n = indexes.len();
        if n <= max {
            return Ok(vec![offset..offset + n]);
        }

        let bisection = self.bisector.bisect(graph, &split_balance(n, min, max))?;
        if bisection.sides.len() != n {
            return Err(PartitioningError::SideCountMismatch {
                expected: n,
                got: bisection.sides.len(),
            });
        }

        let (left, right): (Vec<u32>, Vec<u32>) =
            (0..n as u32).partition(|&i| bisection.sides[i as usize] == 0);
        if left.is_empty() || right.is_empty() {
            return Err(PartitioningError::EmptySide { nodes: n });
        }

        let reordered: Vec<u32> = left
            .iter()
            .chain(&right)
            .map(|&i| indexes[i as usize])
            .collect();
        indexes.copy_from_slice(&reordered);

        let (left_indexes, right_indexes) = indexes.split_at_mut(left.len());
        let right_offset = offset + left.len();

        let mut recurse_left = move || {
            let sub = graph.induced_subgraph(&left);
            self.partition_recursive(&sub, left_indexes, offset, min, max)
        };
        let mut recurse_right = move || {
            let sub = graph.induced_subgraph(&right);
            self.partition_recursive(&sub, right_indexes, right_offset, min, max)
        };

        let (left_ranges, right_ranges) = if n >= PARALLEL_NODE_THRESHOLD {
            rayon::join(recurse_left, recurse_right)
        } else {
            (recurse_left(), recurse_right())
        };

        let mut ranges = left_ranges?;
        ranges.extend(right_ranges?);
        Ok(ranges)
    }
}

/// Window for side 0 so both halves can still be divided into parts of `min..=max`.
pub(crate) fn split_balance(n: usize, min: usize, max: usize) -> Balance {
    let parts = n.div_ceil(max);
    let left_parts = parts / 2;
    let right_parts = parts - left_parts;

    let mut lo = (left_parts * min).max(n.saturating_sub(right_parts * max));
    let mut hi = (left_parts * max).min(n.saturating_sub(right_parts * min));
    if lo > hi {
        // min is unreachable, only keep parts under max
        lo = n.saturating_sub(right_parts * max);
        hi = left_parts * max;
    }
    let lo = lo.max(1);
    let hi = hi.min(n - 1);

    Balance {
        target_left: (n * left_parts / parts).clamp(lo, hi),
        min_left: lo,
        max_left: hi,
    }
}
