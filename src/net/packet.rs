//! PacketIn 与端口统计
//!
//! 协议栈解析后交给控制器的输入数据。

use super::id::{Dpid, MacAddr, PortNo};
use serde::{Deserialize, Serialize};

/// 交换机上送的一帧（已由协议层解析出以太网头）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub dpid: Dpid,
    pub in_port: PortNo,
    pub src: MacAddr,
    pub dst: MacAddr,
    pub ethertype: u16,
    /// 原始帧，PacketOut 时原样回放
    pub data: Vec<u8>,
}

impl PacketIn {
    pub fn new(dpid: Dpid, in_port: PortNo, src: MacAddr, dst: MacAddr) -> Self {
        Self {
            dpid,
            in_port,
            src,
            dst,
            ethertype: 0x0800,
            data: Vec::new(),
        }
    }
}

/// 单个端口的累计计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStats {
    pub port_no: PortNo,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

impl PortStats {
    pub fn total_bytes(&self) -> u64 {
        self.tx_bytes.saturating_add(self.rx_bytes)
    }
}
