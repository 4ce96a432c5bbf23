//! 客户端接口模块
//!
//! 本模块提供 Thymio 机器人的用户友好接口：
//!
//! - [`Thymio`]：入口，持有驱动层桥接
//! - Commander/Observer 模式（读写分离）：[`Observer`] 只读取遥测，
//!   [`MotionCommander`]、[`LedCommander`]、[`SoundCommander`] 只发送命令
//! - 菜单类型（电机选择、LED 分组、表盘方向）
//!
//! 需要直接发送桥接请求时，可以通过 [`Thymio::bridge`] 使用驱动层。

pub mod builder;
pub mod error;
pub mod leds;
pub mod motion;
pub mod observer;
pub mod sound;
pub mod thymio;
pub mod types;

pub use builder::ThymioBuilder;
pub use error::{ClientError, Result};
pub use leds::LedCommander;
pub use motion::MotionCommander;
pub use observer::Observer;
pub use sound::SoundCommander;
pub use thymio::Thymio;
pub use types::*;
