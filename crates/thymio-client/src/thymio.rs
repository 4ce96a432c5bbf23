//! Thymio（客户端入口）
//!
//! [`Thymio`] 持有驱动层桥接，并按功能拆分出几个命令器：
//!
//! - [`Observer`]：传感器读数
//! - [`MotionCommander`]：运动和电机
//! - [`LedCommander`]：LED
//! - [`SoundCommander`]：声音

use crate::error::{ClientError, Result};
use crate::leds::LedCommander;
use crate::motion::MotionCommander;
use crate::observer::Observer;
use crate::sound::SoundCommander;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thymio_driver::{Ack, ConnectionState, ThymioBridge};
use thymio_protocol::ActionRequest;
use tracing::info;

/// 等待遥测时的轮询间隔
const TELEMETRY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Thymio 机器人客户端
///
/// 可克隆；所有克隆共享同一个桥接和 LED 影子状态。
///
/// # 示例
///
/// ```rust,no_run
/// use std::time::Duration;
/// use thymio_client::ThymioBuilder;
///
/// let thymio = ThymioBuilder::new().build()?;
/// thymio.wait_for_telemetry(Duration::from_secs(2))?;
///
/// let handle = thymio.motion().move_by(100.0)?;
/// handle.wait()?;
/// println!("front: {}", thymio.observer().proximity(2));
/// # Ok::<(), thymio_client::ClientError>(())
/// ```
#[derive(Clone)]
pub struct Thymio {
    bridge: Arc<ThymioBridge>,
    observer: Observer,
    motion: MotionCommander,
    leds: LedCommander,
    sound: SoundCommander,
}

impl Thymio {
    pub fn new(bridge: ThymioBridge) -> Self {
        Self::from_shared(Arc::new(bridge))
    }

    pub fn from_shared(bridge: Arc<ThymioBridge>) -> Self {
        Self {
            observer: Observer::new(bridge.clone()),
            motion: MotionCommander::new(bridge.clone()),
            leds: LedCommander::new(bridge.clone()),
            sound: SoundCommander::new(bridge.clone()),
            bridge,
        }
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn motion(&self) -> &MotionCommander {
        &self.motion
    }

    pub fn leds(&self) -> &LedCommander {
        &self.leds
    }

    pub fn sound(&self) -> &SoundCommander {
        &self.sound
    }

    /// 底层桥接（高级用户）
    pub fn bridge(&self) -> &Arc<ThymioBridge> {
        &self.bridge
    }

    /// 订阅事件流（已有订阅时会先断开旧的）
    pub fn connect(&self) -> Result<()> {
        info!("Connecting to Thymio node {}", self.bridge.node());
        Ok(self.bridge.connect()?)
    }

    /// 断开事件流，可重复调用
    pub fn disconnect(&self) {
        self.bridge.disconnect();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.bridge.connection_state()
    }

    /// 阻塞直到收到第一条状态更新
    ///
    /// # 错误
    ///
    /// - `ClientError::TelemetryTimeout`: 超时仍未收到
    pub fn wait_for_telemetry(&self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.bridge.has_telemetry() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(ClientError::TelemetryTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            std::thread::sleep(TELEMETRY_POLL_INTERVAL);
        }
    }

    /// 通过红外通信发送一个值
    pub fn emit(&self, value: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::emit(value))?)
    }

    /// 最近一次红外通信收到的值
    pub fn received(&self) -> i32 {
        self.observer.received()
    }

    /// 上传 Aseba 程序，确认后自动重新订阅
    pub fn upload_program(&self, program: Vec<u8>) -> Result<Ack> {
        Ok(self.bridge.upload_program(program)?)
    }
}
