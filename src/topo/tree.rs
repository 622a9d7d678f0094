//! 生成树与根树
//!
//! 在拓扑副本上计算需要阻断的端口，原拓扑不受影响。
//! 网络假定为核心/边缘二部图，因此只需检查与核心相连的链路。

use std::collections::{BTreeMap, BTreeSet};

use super::graph::Topology;
use crate::net::{Dpid, PortNo};
use tracing::{debug, trace};

/// 每个交换机上禁止泛洪的端口
pub type BlockedPorts = BTreeMap<Dpid, BTreeSet<PortNo>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("{0} is not a core switch")]
    NotCore(Dpid),
    #[error("{0} is not part of the topology")]
    UnknownNode(Dpid),
    #[error("core switch {0} is not linked to every edge switch")]
    NotFullyConnected(Dpid),
}

/// 计算结果：剪枝后的拓扑副本与阻断端口表
#[derive(Debug, Clone)]
pub struct Tree {
    pub topology: Topology,
    pub blocked: BlockedPorts,
    /// 生成树中被最后处理的主核心；根树中的根
    pub root: Option<Dpid>,
}

impl Tree {
    fn empty_blocked(topo: &Topology) -> BlockedPorts {
        topo.nodes().map(|n| (n.id(), BTreeSet::new())).collect()
    }

    pub fn blocked_for(&self, dpid: Dpid) -> Option<&BTreeSet<PortNo>> {
        self.blocked.get(&dpid)
    }

    /// 被阻断的链路数（每条链路两端各计一个端口）
    pub fn blocked_link_count(&self) -> usize {
        self.blocked.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

fn block(blocked: &mut BlockedPorts, dpid: Dpid, port: PortNo) {
    blocked.entry(dpid).or_default().insert(port);
}

impl Topology {
    /// 选出第一个（按 DPID 升序）与所有边缘节点直连的核心节点
    pub fn elect_principal_core(&self) -> Option<Dpid> {
        let edges = self.edge_ids();
        self.core_nodes()
            .find(|n| n.neighbors() == edges)
            .map(|n| n.id())
    }

    /// 反向删除法求生成树。主核心（若选出）的链路最后检查，以尽量保留。
    ///
    /// 删除一条链路后只要两端仍然连通就保持删除，并阻断两端端口；
    /// 对连通拓扑，结果恰好保留 N-1 条链路。
    #[tracing::instrument(level = "debug", skip(self), fields(nodes = self.len(), links = self.link_count()))]
    pub fn spanning_tree(&self) -> Tree {
        let principal = self.elect_principal_core();
        let mut order: Vec<Dpid> = self
            .core_nodes()
            .map(|n| n.id())
            .filter(|id| Some(*id) != principal)
            .collect();
        order.extend(principal);
        debug!(principal = ?principal, order = ?order, "核心节点处理顺序");

        let mut tree = self.clone();
        let mut blocked = Tree::empty_blocked(self);

        for core_id in order {
            let Some(core) = self.node(core_id) else {
                continue;
            };
            for (port1, peer) in core.links() {
                if self.is_core(peer.dpid) {
                    continue;
                }
                if tree
                    .remove_link(core_id, peer.dpid, port1, peer.port)
                    .is_err()
                {
                    continue;
                }
                if tree.connects(core_id, peer.dpid) {
                    trace!(core = %core_id, port = %port1, edge = %peer, "阻断链路");
                    block(&mut blocked, core_id, port1);
                    block(&mut blocked, peer.dpid, peer.port);
                } else {
                    // 割边：恢复。刚删除的链路两端端口必然空闲
                    let _ = tree.add_link(core_id, peer.dpid, port1, peer.port);
                }
            }
        }

        Tree {
            topology: tree,
            blocked,
            root: principal,
        }
    }

    /// 以 `root` 为根的星形树：其余核心与所有边缘节点的链路全部阻断。
    ///
    /// `root` 必须是核心节点且与全部边缘节点直连，否则返回错误，不产生结果。
    /// 核心之间的连通性不做保证。
    pub fn rooted_tree(&self, root: Dpid) -> Result<Tree, TreeError> {
        if !self.is_core(root) {
            return Err(TreeError::NotCore(root));
        }
        let root_node = self.node(root).ok_or(TreeError::UnknownNode(root))?;
        let edges = self.edge_ids();
        if root_node.neighbors() != edges {
            return Err(TreeError::NotFullyConnected(root));
        }

        let mut tree = self.clone();
        let mut blocked = Tree::empty_blocked(self);
        for core in self.core_nodes().filter(|n| n.id() != root) {
            for (port1, peer) in core.links() {
                if !edges.contains(&peer.dpid) {
                    continue;
                }
                if tree
                    .remove_link(core.id(), peer.dpid, port1, peer.port)
                    .is_ok()
                {
                    block(&mut blocked, core.id(), port1);
                    block(&mut blocked, peer.dpid, peer.port);
                }
            }
        }

        Ok(Tree {
            topology: tree,
            blocked,
            root: Some(root),
        })
    }
}
