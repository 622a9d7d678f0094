//! 主机表：边缘交换机上已发现的主机及其挂接端口
//!
//! 由外部主机发现组件填充（HostDiscovered 事件）。

use std::collections::BTreeMap;

use crate::net::{Dpid, MacAddr, PortNo};

#[derive(Debug, Default, Clone)]
pub struct HostTable {
    by_switch: BTreeMap<Dpid, BTreeMap<MacAddr, PortNo>>,
}

impl HostTable {
    pub fn learn(&mut self, dpid: Dpid, mac: MacAddr, port: PortNo) {
        self.by_switch.entry(dpid).or_default().insert(mac, port);
    }

    pub fn port_of(&self, dpid: Dpid, mac: &MacAddr) -> Option<PortNo> {
        self.by_switch.get(&dpid)?.get(mac).copied()
    }

    /// 交换机上已知主机数
    pub fn count(&self, dpid: Dpid) -> usize {
        self.by_switch.get(&dpid).map_or(0, BTreeMap::len)
    }

    pub fn forget_switch(&mut self, dpid: Dpid) {
        self.by_switch.remove(&dpid);
    }
}
