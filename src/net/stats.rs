//! 统计信息
//!
//! 控制器运行期间的计数器。

/// 控制器统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ControlStats {
    pub packet_ins: u64,
    pub tree_updates: u64,
    pub tree_failures: u64,
    pub topology_warnings: u64,
    pub stats_replies: u64,
}
