//! 事件与世界
//!
//! 所有输入（交换机连接、链路变化、PacketIn、统计回复、定时器）都以事件形式
//! 进入同一个调度序列，事件执行时独占访问世界状态。

use super::simulator::Simulator;
use std::any::Any;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);

    /// 日志中显示的事件名
    fn label(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// 事件作用的状态容器，由控制层实现；事件通过 `as_any_mut` 取得具体类型。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
