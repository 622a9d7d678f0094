//! 控制器发往交换机的命令
//!
//! 协议编码由外部连接层负责；控制器只通过 [`ControlChannel`] 输出命令。

use super::id::{Dpid, MacAddr, PortNo};
use serde::Serialize;

/// 流表匹配字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FlowMatch {
    pub src: MacAddr,
    pub dst: MacAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethertype: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    PacketOut {
        dpid: Dpid,
        out_port: PortNo,
        data: Vec<u8>,
    },
    InstallFlow {
        dpid: Dpid,
        #[serde(rename = "match")]
        matching: FlowMatch,
        out_port: PortNo,
        hard_timeout: u16,
    },
    RequestPortStats {
        dpid: Dpid,
    },
}

impl Command {
    pub fn dpid(&self) -> Dpid {
        match self {
            Command::PacketOut { dpid, .. }
            | Command::InstallFlow { dpid, .. }
            | Command::RequestPortStats { dpid } => *dpid,
        }
    }
}

/// 通往交换机连接层的出口
pub trait ControlChannel {
    fn send(&mut self, cmd: Command);

    fn packet_out(&mut self, dpid: Dpid, data: &[u8], out_port: PortNo) {
        self.send(Command::PacketOut {
            dpid,
            out_port,
            data: data.to_vec(),
        });
    }

    fn install_flow(&mut self, dpid: Dpid, matching: FlowMatch, out_port: PortNo, hard_timeout: u16) {
        self.send(Command::InstallFlow {
            dpid,
            matching,
            out_port,
            hard_timeout,
        });
    }

    fn request_port_stats(&mut self, dpid: Dpid) {
        self.send(Command::RequestPortStats { dpid });
    }
}

/// 记录所有已发出命令的出口实现（CLI 与测试使用）。
#[derive(Debug, Default, Clone)]
pub struct CommandLog {
    commands: Vec<Command>,
}

impl ControlChannel for CommandLog {
    fn send(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }
}

impl CommandLog {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// 取走并清空已记录的命令
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn packet_outs(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::PacketOut { .. }))
            .count()
    }

    pub fn flow_mods(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::InstallFlow { .. }))
            .count()
    }

    pub fn stats_requests(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::RequestPortStats { .. }))
            .count()
    }
}
