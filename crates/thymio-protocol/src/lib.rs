//! # Thymio Protocol
//!
//! Thymio 机器人 Aseba HTTP 桥接协议定义（无网络依赖）
//!
//! ## 模块
//!
//! - `ids`: 遥测字段索引与动作名常量
//! - `constants`: 协议常量定义
//! - `frame`: 遥测帧（空白分隔整数消息）
//! - `stream`: 事件流（SSE）行解码
//! - `feedback`: 传感器读数解码
//! - `color`: 色相到 RGB 的映射
//! - `control`: 动作请求与排队运动请求构建
//! - `motion`: 运动规划（距离/角度/半径 → 时长与轮速）
//!
//! ## 数值约定
//!
//! 所有发往桥接的数值都经过 [`to_wire_int`] 截断为整数（向零取整）。

pub mod color;
pub mod constants;
pub mod control;
pub mod feedback;
pub mod frame;
pub mod ids;
pub mod motion;
pub mod stream;

// 重新导出常用类型
pub use color::*;
pub use constants::*;
pub use control::*;
pub use feedback::*;
pub use frame::*;
pub use ids::*;
pub use motion::*;
pub use stream::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty telemetry message")]
    EmptyFrame,

    #[error("Invalid frame length: expected at least {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown {menu} option: {value}")]
    UnknownOption { menu: &'static str, value: String },
}
