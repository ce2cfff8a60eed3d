//! Balanced graph partitioning by recursive bisection.

mod bisect;
mod graph;
mod partition;

pub use bisect::{Balance, BisectConfig, Bisection, Bisector, FmBisector};
pub use graph::Graph;
pub use partition::{Partitioner, Partitioning, PartitioningError};
