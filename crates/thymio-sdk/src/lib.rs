//! Thymio SDK - 通过 Aseba HTTP 桥接控制 Thymio 机器人
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 遥测帧解析、传感器解码、动作请求编码、运动规划
//! - **驱动层** (`driver`): HTTP 传输、事件流线程、命令线程、运动完成跟踪
//! - **客户端层** (`client`): 类型安全、易用的控制接口
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use thymio_sdk::prelude::*;
//!
//! init_logging();
//! let thymio = ThymioBuilder::new()
//!     .wait_for_telemetry(Duration::from_secs(2))
//!     .build()?;
//!
//! thymio.leds().set_hue(LedGroup::All, 66)?;
//! thymio.motion().turn(90.0)?.wait()?;
//! if thymio.observer().touching(SensorZone::Front) {
//!     thymio.sound().system(1.0)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! 需要直接发送桥接请求的用户可以使用驱动层：
//!
//! ```rust,no_run
//! use thymio_sdk::driver::BridgeBuilder;
//! use thymio_sdk::protocol::HttpMethod;
//!
//! let bridge = BridgeBuilder::new().build()?;
//! bridge.request_send(HttpMethod::Post, "Q_add_motion", [100.0, 320.0, 320.0])?;
//! # Ok::<(), thymio_sdk::DriverError>(())
//! ```

pub use thymio_client as client;
pub use thymio_driver as driver;
pub use thymio_protocol as protocol;

pub mod logging;
pub mod prelude;

pub use logging::{init_logging, init_logging_with};

// 协议层错误
pub use protocol::ProtocolError;

// 驱动层（高级用户使用），不直接导出 ThymioBridge 以外的构造器，避免与客户端 Builder 混淆
pub use driver::{DriverError, ThymioBridge};

// 客户端层（普通用户使用）
pub use client::{
    ClientError, LedCommander, MotionCommander, Observer, SoundCommander, Thymio, ThymioBuilder,
};

/// 驱动层桥接的别名
pub type Driver = driver::ThymioBridge;
