//! Observer（只读传感器视图）
//!
//! 每次查询都读取调用时刻的最新状态帧，不做缓存。
//! 尚未收到状态更新时，所有读数返回 0 / false。

use std::sync::Arc;
use std::time::Duration;
use thymio_driver::{ConnectionState, ThymioBridge};
use thymio_protocol::{
    Button, DetectionRange, GROUND_SENSOR_COUNT, OdometerAxis, PROXIMITY_SENSOR_COUNT,
    SensorReadings, SensorZone, TelemetryFrame, TiltAxis, Wheel,
};

/// 传感器观察者
///
/// 可克隆，可在其它线程中长期持有。
#[derive(Clone)]
pub struct Observer {
    bridge: Arc<ThymioBridge>,
}

impl Observer {
    pub(crate) fn new(bridge: Arc<ThymioBridge>) -> Self {
        Self { bridge }
    }

    fn with<T>(&self, read: impl FnOnce(SensorReadings<'_>) -> T) -> T {
        let frame = self.bridge.latest_frame();
        read(SensorReadings::new(frame.as_deref()))
    }

    /// 最新状态帧
    pub fn frame(&self) -> Option<Arc<TelemetryFrame>> {
        self.bridge.latest_frame()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.bridge.connection_state()
    }

    /// 遥测是否过期（从未收到也算过期）
    pub fn is_stale(&self) -> bool {
        self.bridge.is_stale()
    }

    pub fn telemetry_age(&self) -> Option<Duration> {
        self.bridge.telemetry_age()
    }

    // ==================== 距离传感器 ====================

    /// 单个水平距离传感器（0-6）
    pub fn proximity(&self, sensor: usize) -> i32 {
        self.with(|r| r.proximity(sensor))
    }

    pub fn proximity_horizontal(&self) -> [i32; PROXIMITY_SENSOR_COUNT] {
        self.with(|r| r.proximity_horizontal())
    }

    /// 7 个水平传感器，空格分隔
    pub fn proximity_horizontal_text(&self) -> String {
        self.with(|r| r.proximity_horizontal_text())
    }

    /// 地面传感器（0 左，1 右）
    pub fn ground(&self, sensor: usize) -> i32 {
        self.with(|r| r.ground(sensor))
    }

    pub fn ground_delta(&self) -> [i32; GROUND_SENSOR_COUNT] {
        self.with(|r| r.ground_delta())
    }

    pub fn ground_delta_text(&self) -> String {
        self.with(|r| r.ground_delta_text())
    }

    pub fn distance(&self, zone: SensorZone) -> i32 {
        self.with(|r| r.distance(zone))
    }

    pub fn angle(&self, zone: SensorZone) -> i32 {
        self.with(|r| r.angle(zone))
    }

    pub fn touching(&self, zone: SensorZone) -> bool {
        self.with(|r| r.touching(zone))
    }

    pub fn touching_threshold(&self, zone: SensorZone, range: DetectionRange) -> bool {
        self.with(|r| r.touching_threshold(zone, range))
    }

    // ==================== 声音 / 按钮 / 姿态 ====================

    pub fn mic_intensity(&self) -> i32 {
        self.with(|r| r.mic_intensity())
    }

    pub fn sound_detected(&self) -> bool {
        self.with(|r| r.sound_detected())
    }

    pub fn button(&self, button: Button) -> bool {
        self.with(|r| r.button(button))
    }

    pub fn tilt(&self, axis: TiltAxis) -> i32 {
        self.with(|r| r.tilt(axis))
    }

    /// 三轴平均值是否超过阈值
    pub fn bump(&self, threshold: i32) -> bool {
        self.with(|r| r.bump(threshold))
    }

    // ==================== 里程计 / 电机 / 通信 ====================

    pub fn odometer(&self, axis: OdometerAxis) -> i32 {
        self.with(|r| r.odometer(axis))
    }

    pub fn motor(&self, wheel: Wheel) -> i32 {
        self.with(|r| r.motor(wheel))
    }

    /// 最近一次红外通信收到的值
    pub fn received(&self) -> i32 {
        self.with(|r| r.received())
    }
}
