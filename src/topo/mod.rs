//! 拓扑模块
//!
//! 拓扑图、生成树/根树计算，以及核心/边缘网络构建器。

pub mod core_edge;
mod graph;
mod tree;

pub use graph::{Node, Role, Topology, TopologyError};
pub use tree::{BlockedPorts, Tree, TreeError};
