//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use thymio_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use crate::client::{
    LedCommander, MotionCommander, Observer, SoundCommander, Thymio, ThymioBuilder,
};
pub use crate::client::types::*;

// 驱动层常用类型
pub use crate::driver::{
    AbandonReason, Ack, AckSet, BridgeConfig, Completion, ConnectionState, MotionHandle,
};

// 错误类型
pub use crate::client::ClientError;
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;

pub use crate::init_logging;
