//! 驱动层模块
//!
//! 本模块提供 Thymio 机器人的桥接驱动功能，包括：
//! - 遥测线程：订阅事件流、自动重连、会话代次隔离
//! - 命令线程：FIFO 执行动作、排队运动、程序上传
//! - 状态同步（ArcSwap 无锁读取最新状态帧）
//! - 排队运动完成通知（单槽位观察者）
//! - 钩子系统：自定义帧回调
//!
//! # 使用场景
//!
//! 适用于需要直接构造桥接请求、或自行解析遥测帧的场景。
//! 大多数用户应该使用 `thymio-client` 提供的更高级接口。

mod bridge;
mod builder;
pub mod command;
pub mod completion;
pub mod config;
pub mod connection;
mod error;
pub mod heartbeat;
pub mod hooks;
pub mod metrics;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pipeline;
pub mod state;
pub mod transport;

pub use bridge::ThymioBridge;
pub use builder::BridgeBuilder;
pub use command::{Ack, AckSet, BridgeCommand, ReplyCallback};
pub use completion::{AbandonReason, Completion, CompletionCallback, CompletionSlot, MotionHandle};
pub use config::BridgeConfig;
pub use connection::{AtomicConnectionState, ConnectionState};
pub use error::DriverError;
pub use heartbeat::TelemetryMonitor;
pub use hooks::{FrameCallback, HookManager};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockStream, MockTransport};
pub use state::BridgeContext;
pub use transport::{BridgeReply, BridgeTransport, HttpTransport, TelemetryStream, TransportError};
