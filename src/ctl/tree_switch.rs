//! 生成树策略
//!
//! 已知目的地址：单播并安装流表；未知：除入端口和阻断端口外全部泛洪（不装流表，
//! 让探索流量持续上送直到学到地址）。

use std::collections::BTreeSet;

use tracing::debug;

use super::switch::{LearningTable, PolicyCtx, SwitchBase};
use crate::net::{PacketIn, PortNo};

#[derive(Debug)]
pub struct TreeSwitch {
    base: SwitchBase,
    macs: LearningTable,
    blocked: BTreeSet<PortNo>,
}

impl TreeSwitch {
    pub fn new(base: SwitchBase) -> Self {
        Self {
            base,
            macs: LearningTable::default(),
            blocked: BTreeSet::new(),
        }
    }

    pub fn base(&self) -> &SwitchBase {
        &self.base
    }

    pub fn blocked(&self) -> &BTreeSet<PortNo> {
        &self.blocked
    }

    pub fn learned(&self) -> &LearningTable {
        &self.macs
    }

    /// 替换阻断端口集合，并清空学习表以便按新拓扑重新学习
    pub fn block_ports(&mut self, ports: BTreeSet<PortNo>) {
        debug!(dpid = %self.base.dpid(), blocked = ?ports, "更新阻断端口");
        self.blocked = ports;
        self.macs.clear();
    }

    pub fn on_packet_in(&mut self, pkt: &PacketIn, ctx: &mut PolicyCtx<'_>) {
        if !self.blocked.contains(&pkt.in_port) {
            self.macs.learn(pkt.src, pkt.in_port);
        }

        match self.macs.lookup(&pkt.dst) {
            Some(out_port) => {
                self.base
                    .forward_and_install(ctx.out, pkt, out_port, None, ctx.hard_timeout);
            }
            None => {
                let blocked = &self.blocked;
                let ports = self
                    .base
                    .flood(ctx.out, pkt, |p| p == pkt.in_port || blocked.contains(&p));
                debug!(dpid = %self.base.dpid(), ports = ?ports, "未知目的地址，泛洪");
            }
        }
    }
}
