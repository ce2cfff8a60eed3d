use std::collections::VecDeque;

use common::{BitArray, Heap};

use crate::{graph::Graph, PartitioningError};

/// Allowed sizes of side 0 of a bisection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub target_left: usize,
    pub min_left: usize,
    pub max_left: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bisection {
    /// 0 or 1 for each node
    pub sides: Vec<u8>,
    pub cut_cost: u64,
}

impl Bisection {
    pub fn left_count(&self) -> usize {
        self.sides.iter().filter(|&&s| s == 0).count()
    }
}

/// Splits a graph in two with a small edge cut, respecting a [`Balance`].
pub trait Bisector: Sync {
    fn bisect(&self, graph: &Graph, balance: &Balance) -> Result<Bisection, PartitioningError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BisectConfig {
    /// Maximum number of Fiduccia-Mattheyses passes. Refinement stops early once a pass gains nothing.
    pub refinement_passes: usize,
    /// Moves a pass may make past its best state before giving up
    pub max_unproductive_moves: usize,
}

impl Default for BisectConfig {
    fn default() -> Self {
        Self {
            refinement_passes: 8,
            max_unproductive_moves: 64,
        }
    }
}

/// Greedy graph growing followed by Fiduccia-Mattheyses refinement.
#[derive(Debug, Clone, Default)]
pub struct FmBisector {
    pub config: BisectConfig,
}

impl FmBisector {
    pub fn new(config: BisectConfig) -> Self {
        Self { config }
    }
}

impl Bisector for FmBisector {
    fn bisect(&self, graph: &Graph, balance: &Balance) -> Result<Bisection, PartitioningError> {
        let n = graph.node_count();

        if n < 2
            || balance.min_left == 0
            || balance.min_left > balance.target_left
            || balance.target_left > balance.max_left
            || balance.max_left >= n
        {
            return Err(PartitioningError::InvalidBalance {
                nodes: n,
                min_left: balance.min_left,
                target_left: balance.target_left,
                max_left: balance.max_left,
            });
        }

        let mut sides = grow_region(graph, balance.target_left);

        for _ in 0..self.config.refinement_passes {
            if !refine_pass(graph, &mut sides, balance, self.config.max_unproductive_moves) {
                break;
            }
        }

        let bisection = Bisection {
            cut_cost: graph.cut_cost(&sides),
            sides,
        };

        let left = bisection.left_count();
        if left == 0 || left == n {
            return Err(PartitioningError::EmptySide { nodes: n });
        }

        Ok(bisection)
    }
}

/// Last node reached by a breadth first search from `start`.
fn farthest_node(graph: &Graph, start: u32) -> u32 {
    let mut seen = BitArray::new(graph.node_count());
    let mut queue = VecDeque::from([start]);
    let mut last = start;
    seen.set_true(start as usize);

    while let Some(node) = queue.pop_front() {
        last = node;
        for (other, _) in graph.neighbors(node) {
            if !seen[other as usize] {
                seen.set_true(other as usize);
                queue.push_back(other);
            }
        }
    }
    last
}

/// Grow side 0 to exactly `target` nodes from a pseudo-peripheral seed, always absorbing the
/// frontier node most strongly connected to the region.
fn grow_region(graph: &Graph, target: usize) -> Vec<u8> {
    let n = graph.node_count();
    let mut sides = vec![1u8; n];
    let mut connection = vec![0u32; n];
    let mut frontier = Heap::with_index_capacity(n);

    let seed = farthest_node(graph, farthest_node(graph, 0));
    frontier.add(0.0, seed as usize);

    // Scan position for restarting in another component
    let mut next_unvisited = 0;

    for _ in 0..target {
        let node = match frontier.pop() {
            Some(node) => node,
            None => {
                while sides[next_unvisited] == 0 {
                    next_unvisited += 1;
                }
                next_unvisited
            }
        };

        sides[node] = 0;

        for (other, weight) in graph.neighbors(node as u32) {
            let other = other as usize;
            if sides[other] == 0 {
                continue;
            }
            connection[other] += weight;
            let key = -(connection[other] as f32);
            if frontier.is_present(other) {
                frontier.update(key, other);
            } else {
                frontier.add(key, other);
            }
        }
    }

    sides
}

/// One Fiduccia-Mattheyses pass. Every node moves at most once; the pass may wander one node
/// outside the balance window but only states inside it are kept. Returns true if the cut improved.
fn refine_pass(graph: &Graph, sides: &mut [u8], balance: &Balance, max_unproductive: usize) -> bool {
    let n = graph.node_count();

    // Reduction in cut weight if the node switched sides
    let mut gains = vec![0i64; n];
    let mut cut = 0i64;
    for node in 0..n {
        for (other, weight) in graph.neighbors(node as u32) {
            if sides[other as usize] != sides[node] {
                gains[node] += weight as i64;
                cut += weight as i64;
            } else {
                gains[node] -= weight as i64;
            }
        }
    }
    // Every cut edge was counted from both ends
    cut /= 2;

    let mut heaps = [Heap::with_index_capacity(n), Heap::with_index_capacity(n)];
    for node in 0..n {
        heaps[sides[node] as usize].add(-gains[node] as f32, node);
    }

    let mut left = sides.iter().filter(|&&s| s == 0).count();
    let lowest = balance.min_left.saturating_sub(1).max(1);
    let highest = (balance.max_left + 1).min(n - 1);

    let mut best_cut = cut;
    let mut best_deviation = left.abs_diff(balance.target_left);
    let mut best_len = 0;
    let mut moves = Vec::new();
    let mut unproductive = 0;

    loop {
        let from_left = if left > lowest { heaps[0].top() } else { None };
        let from_right = if left < highest { heaps[1].top() } else { None };

        let node = match (from_left, from_right) {
            (None, None) => break,
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (Some(a), Some(b)) => match gains[a].cmp(&gains[b]) {
                std::cmp::Ordering::Greater => a,
                std::cmp::Ordering::Less => b,
                // Break ties towards the target size
                std::cmp::Ordering::Equal if left > balance.target_left => a,
                std::cmp::Ordering::Equal => b,
            },
        };

        let from = sides[node];
        heaps[from as usize].remove(node);
        cut -= gains[node];
        sides[node] ^= 1;
        if from == 0 {
            left -= 1;
        } else {
            left += 1;
        }

        for (other, weight) in graph.neighbors(node as u32) {
            let other = other as usize;
            let side = sides[other] as usize;
            if !heaps[side].is_present(other) {
                // Already moved this pass
                continue;
            }
            if sides[other] == sides[node] {
                gains[other] -= 2 * weight as i64;
            } else {
                gains[other] += 2 * weight as i64;
            }
            heaps[side].update(-gains[other] as f32, other);
        }
        gains[node] = -gains[node];
        moves.push(node);

        let deviation = left.abs_diff(balance.target_left);
        let in_window = (balance.min_left..=balance.max_left).contains(&left);
        if in_window && (cut < best_cut || (cut == best_cut && deviation < best_deviation)) {
            best_cut = cut;
            best_deviation = deviation;
            best_len = moves.len();
            unproductive = 0;
        } else {
            unproductive += 1;
            if unproductive > max_unproductive {
                break;
            }
        }
    }

    for &node in &moves[best_len..] {
        sides[node] ^= 1;
    }

    best_len > 0
}
