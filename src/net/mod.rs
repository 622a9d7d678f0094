//! 交换机侧数据类型
//!
//! 控制器与外部协议层之间交换的值：标识符、PacketIn、端口统计与下发命令。

mod command;
mod id;
mod packet;
mod stats;

pub use command::{Command, CommandLog, ControlChannel, FlowMatch};
pub use id::{Dpid, Endpoint, MacAddr, PortNo};
pub use packet::{PacketIn, PortStats};
pub use stats::ControlStats;

/// MAC 地址字符串格式错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed MAC address: {0:?}")]
pub struct MacParseError(pub String);
