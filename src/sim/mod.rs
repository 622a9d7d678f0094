//! 事件调度模块
//!
//! 单一逻辑事件流：时间、事件、世界与调度器。所有控制器输入在此串行执行。

mod event;
mod simulator;
mod time;

pub use event::{Event, World};
pub use simulator::{EventId, Simulator};
pub use time::SimTime;
