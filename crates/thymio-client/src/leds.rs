//! LedCommander（LED 控制）
//!
//! RGB LED 组的更新按 LED 独立发送、由 [`AckSet`] 汇合；
//! 每个 LED 的色相影子状态只在其自身请求被确认后更新。

use crate::error::Result;
use crate::types::{DialDirection, LedGroup, LedTarget};
use parking_lot::Mutex;
use std::sync::Arc;
use thymio_driver::{Ack, AckSet, ThymioBridge};
use thymio_protocol::{
    ActionRequest, DIAL_LED_LEVEL, Rgb, clamp_led, hue_to_rgb, normalize_hue,
};
use tracing::debug;

/// LED 的客户端状态
#[derive(Debug, Default)]
struct LedState {
    /// 上次成功设置的色相（顶部、左下、右下）
    hues: [i32; 3],
    /// 表盘位置，`None` 表示尚未点亮
    dial: Option<usize>,
}

/// LED 控制器
#[derive(Clone)]
pub struct LedCommander {
    bridge: Arc<ThymioBridge>,
    state: Arc<Mutex<LedState>>,
}

impl LedCommander {
    pub(crate) fn new(bridge: Arc<ThymioBridge>) -> Self {
        Self {
            bridge,
            state: Arc::new(Mutex::new(LedState::default())),
        }
    }

    /// 设置分组颜色（各分量钳位到 0-32）
    pub fn rgb(&self, group: LedGroup, r: f64, g: f64, b: f64) -> Result<AckSet> {
        let rgb = Rgb::new(clamp_led(r), clamp_led(g), clamp_led(b));
        let mut acks = AckSet::new();
        for target in group.targets() {
            acks.push(self.bridge.send_action_acked(target.action(rgb))?);
        }
        Ok(acks)
    }

    /// 设置分组色相（绝对值）
    pub fn set_hue(&self, group: LedGroup, hue: i64) -> Result<AckSet> {
        let hue = normalize_hue(hue);
        debug!("Set leds {} to hue {}", group, hue);
        let mut acks = AckSet::new();
        for target in group.targets() {
            acks.push(self.send_hue(target, hue)?);
        }
        Ok(acks)
    }

    /// 在每个 LED 上次的色相上增加 `delta`
    ///
    /// 基准是已确认的色相。连续调用时若不等待前一次的 [`AckSet`]，
    /// 两次都从同一基准出发，前一次的增量会丢失。
    pub fn change_hue(&self, group: LedGroup, delta: i64) -> Result<AckSet> {
        let mut acks = AckSet::new();
        for target in group.targets() {
            let current = self.state.lock().hues[target.index()];
            let hue = normalize_hue(i64::from(current) + delta);
            acks.push(self.send_hue(target, hue)?);
        }
        Ok(acks)
    }

    fn send_hue(&self, target: LedTarget, hue: i32) -> Result<Ack> {
        let state = self.state.clone();
        let (ack, on_reply) = Ack::channel_with(move |result| {
            if result.is_ok() {
                state.lock().hues[target.index()] = hue;
            }
        });
        self.bridge
            .send_action_then(target.action(hue_to_rgb(i64::from(hue))), on_reply)?;
        Ok(ack)
    }

    /// 影子状态中的色相（顶部、左下、右下）
    pub fn hues(&self) -> [i32; 3] {
        self.state.lock().hues
    }

    /// 熄灭圆环、顶部和底部 LED
    pub fn clear(&self) -> Result<AckSet> {
        let actions = [
            ActionRequest::leds_circle([0.0; 8]),
            ActionRequest::leds_top(Rgb::BLACK),
            ActionRequest::leds_bottom(0, Rgb::BLACK),
            ActionRequest::leds_bottom(1, Rgb::BLACK),
        ];
        let mut acks = AckSet::new();
        for action in actions {
            acks.push(self.bridge.send_action_acked(action)?);
        }
        Ok(acks)
    }

    /// 表盘前进一格：第一次调用点亮位置 0
    pub fn next_dial(&self, direction: DialDirection) -> Result<()> {
        let position = {
            let mut state = self.state.lock();
            let next = match (state.dial, direction) {
                (None, _) => 0,
                (Some(p), DialDirection::Left) => (p + 1) % 8,
                (Some(p), DialDirection::Right) => (p + 7) % 8,
            };
            state.dial = Some(next);
            next
        };

        let mut levels = [0.0; 8];
        levels[position] = f64::from(DIAL_LED_LEVEL);
        Ok(self.bridge.send_action(ActionRequest::leds_circle(levels))?)
    }

    pub fn dial_position(&self) -> Option<usize> {
        self.state.lock().dial
    }

    // ==================== 单色 LED ====================

    /// 圆环 8 个 LED
    pub fn circle(&self, levels: [f64; 8]) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::leds_circle(levels))?)
    }

    /// 水平距离传感器 LED（前左、前左中、前中、前右中、前右、后右、后左、第 8 个）
    pub fn prox_h(&self, levels: [f64; 8]) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::leds_prox_h(levels))?)
    }

    pub fn prox_v(&self, left: f64, right: f64) -> Result<()> {
        Ok(self
            .bridge
            .send_action(ActionRequest::leds_prox_v(left, right))?)
    }

    pub fn buttons(&self, forward: f64, right: f64, backward: f64, left: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::leds_buttons(
            forward, right, backward, left,
        ))?)
    }

    pub fn temperature(&self, hot: f64, cold: f64) -> Result<()> {
        Ok(self
            .bridge
            .send_action(ActionRequest::leds_temperature(hot, cold))?)
    }

    pub fn rc(&self, level: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::leds_rc(level))?)
    }

    pub fn sound(&self, level: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::leds_sound(level))?)
    }
}
