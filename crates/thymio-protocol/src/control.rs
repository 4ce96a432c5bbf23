//! 控制请求构建
//!
//! 桥接接受两种写请求：
//!
//! - **动作**：`GET /nodes/<node>/<action>/<a1>/<a2>/...`，参数全部为整数
//! - **排队运动**：`POST /nodes/<node>/Q_add_motion`，请求体 `[3,<ticks>,<left>,<right>]`
//!
//! 所有数值在发送前经 [`to_wire_int`] 截断为整数；电机速度和 LED 亮度另外先钳位。

use crate::color::Rgb;
use crate::constants::*;
use crate::ids::*;
use smallvec::SmallVec;
use std::fmt;

/// 动作参数（绝大多数动作不超过 8 个参数，避免堆分配）
pub type ActionArgs = SmallVec<[i32; 8]>;

/// 浮点数 → 线上整数
///
/// 向零截断；NaN 和无穷大变为 0；超出 `i32` 范围时饱和。
pub fn to_wire_int(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    // `as` 对有限值向零截断并饱和
    value as i32
}

/// 电机速度钳位到 [-500, 500] 后取整
pub fn clamp_velocity(value: f64) -> i32 {
    to_wire_int(value.clamp(f64::from(VELOCITY_MIN), f64::from(VELOCITY_MAX)))
}

/// LED 亮度钳位到 [0, 32] 后取整
pub fn clamp_led(value: f64) -> i32 {
    to_wire_int(value.clamp(f64::from(LED_MIN), f64::from(LED_MAX)))
}

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
}

impl HttpMethod {
    /// 从数字编码构建：1 = GET，2 = POST，3 = PUT，其它按 GET 处理
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => Self::Post,
            3 => Self::Put,
            _ => Self::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// 整数数组，以 JSON 形式发送（`application/x-www-form-urlencoded` 头）
    Values(Vec<i32>),
    /// 原始字节（程序上传）
    Raw(Vec<u8>),
}

/// 发往桥接的一次 HTTP 请求（路径相对于桥接根地址）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<RequestBody>,
}

impl BridgeRequest {
    /// 结构化发送：`<method> /nodes/<node>/<name>`，请求体 `[3,a,b,c]`
    ///
    /// `name` 是节点下的事件名（如 `Q_add_motion`）。
    pub fn structured(node: &str, method: HttpMethod, name: &str, values: [f64; 3]) -> Self {
        let mut body = Vec::with_capacity(4);
        body.push(QUEUED_MOTION_QUID);
        body.extend(values.iter().map(|&v| to_wire_int(v)));
        Self {
            method,
            path: format!("/nodes/{node}/{name}"),
            body: Some(RequestBody::Values(body)),
        }
    }

    /// 上传程序：`PUT /nodes/<node>`
    pub fn upload(node: &str, program: Vec<u8>) -> Self {
        Self {
            method: HttpMethod::Put,
            path: format!("/nodes/{node}"),
            body: Some(RequestBody::Raw(program)),
        }
    }

    /// 事件流订阅路径
    pub fn events_path(node: &str) -> String {
        format!("/nodes/{node}/events")
    }
}

/// 一个桥接动作（名字 + 整数参数）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: String,
    pub args: ActionArgs,
}

impl ActionRequest {
    /// 通用构造：参数逐个经 [`to_wire_int`] 取整，不钳位
    pub fn new(action: impl Into<String>, args: &[f64]) -> Self {
        Self {
            action: action.into(),
            args: args.iter().map(|&v| to_wire_int(v)).collect(),
        }
    }

    fn with_ints(action: &str, args: &[i32]) -> Self {
        Self {
            action: action.to_string(),
            args: SmallVec::from_slice(args),
        }
    }

    fn leds(action: &str, levels: &[f64]) -> Self {
        Self {
            action: action.to_string(),
            args: levels.iter().map(|&v| clamp_led(v)).collect(),
        }
    }

    /// 相对于桥接根地址的路径：`/nodes/<node>/<action>/<a1>/<a2>/...`
    pub fn path(&self, node: &str) -> String {
        let mut path = format!("/nodes/{node}/{}", self.action);
        for arg in &self.args {
            path.push('/');
            path.push_str(&arg.to_string());
        }
        path
    }

    pub fn to_bridge_request(&self, node: &str) -> BridgeRequest {
        BridgeRequest {
            method: HttpMethod::Get,
            path: self.path(node),
            body: None,
        }
    }

    // ------------------------------------------------------------------
    // 电机
    // ------------------------------------------------------------------

    pub fn motor_left(velocity: f64) -> Self {
        Self::with_ints(ACTION_MOTOR_LEFT, &[clamp_velocity(velocity)])
    }

    pub fn motor_right(velocity: f64) -> Self {
        Self::with_ints(ACTION_MOTOR_RIGHT, &[clamp_velocity(velocity)])
    }

    /// 设置里程计（方向、x、y）
    pub fn set_odometer(theta: f64, x: f64, y: f64) -> Self {
        Self::new(ACTION_SET_ODOMETER, &[theta, x, y])
    }

    // ------------------------------------------------------------------
    // LED
    // ------------------------------------------------------------------

    /// 顶部 RGB LED
    pub fn leds_top(rgb: Rgb) -> Self {
        Self::leds(
            ACTION_LEDS_TOP,
            &[f64::from(rgb.r), f64::from(rgb.g), f64::from(rgb.b)],
        )
    }

    /// 底部 RGB LED（0 左，1 右）
    pub fn leds_bottom(side: i32, rgb: Rgb) -> Self {
        let mut request = Self::leds(
            ACTION_LEDS_BOTTOM,
            &[f64::from(rgb.r), f64::from(rgb.g), f64::from(rgb.b)],
        );
        request.args.insert(0, side);
        request
    }

    /// 圆环 8 个 LED
    pub fn leds_circle(levels: [f64; 8]) -> Self {
        Self::leds(ACTION_LEDS_CIRCLE, &levels)
    }

    /// 水平距离传感器 8 个指示 LED
    pub fn leds_prox_h(levels: [f64; 8]) -> Self {
        Self::leds(ACTION_LEDS_PROX_H, &levels)
    }

    /// 地面传感器 2 个指示 LED
    pub fn leds_prox_v(left: f64, right: f64) -> Self {
        Self::leds(ACTION_LEDS_PROX_V, &[left, right])
    }

    /// 方向按钮 4 个 LED（前、右、后、左）
    pub fn leds_buttons(forward: f64, right: f64, backward: f64, left: f64) -> Self {
        Self::leds(ACTION_LEDS_BUTTONS, &[forward, right, backward, left])
    }

    /// 温度 LED（红、蓝）
    pub fn leds_temperature(hot: f64, cold: f64) -> Self {
        Self::leds(ACTION_LEDS_TEMPERATURE, &[hot, cold])
    }

    /// 遥控接收 LED
    pub fn leds_rc(level: f64) -> Self {
        Self::leds(ACTION_LEDS_RC, &[level])
    }

    /// 声音 LED
    pub fn leds_sound(level: f64) -> Self {
        Self::leds(ACTION_LEDS_SOUND, &[level])
    }

    // ------------------------------------------------------------------
    // 声音
    // ------------------------------------------------------------------

    pub fn sound_system(sound: f64) -> Self {
        Self::new(ACTION_SOUND_SYSTEM, &[sound])
    }

    /// 播放频率，时长单位为秒（线上为 1/60 秒）
    pub fn sound_freq(hz: f64, seconds: f64) -> Self {
        Self::new(ACTION_SOUND_FREQ, &[hz, seconds * SOUND_DURATION_SCALE])
    }

    pub fn sound_play(sound: f64) -> Self {
        Self::new(ACTION_SOUND_PLAY, &[sound])
    }

    pub fn sound_record(sound: f64) -> Self {
        Self::new(ACTION_SOUND_RECORD, &[sound])
    }

    pub fn sound_replay(sound: f64) -> Self {
        Self::new(ACTION_SOUND_REPLAY, &[sound])
    }

    // ------------------------------------------------------------------
    // 通信
    // ------------------------------------------------------------------

    /// 通过红外通信发送一个值
    pub fn emit(value: f64) -> Self {
        Self::new(ACTION_EMIT, &[value])
    }
}

/// 排队运动：在 `duration_ticks`（1/100 秒）内以给定轮速运动
///
/// 速度不再二次钳位，保持规划结果原样。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedMotion {
    pub duration_ticks: f64,
    pub left: f64,
    pub right: f64,
}

impl QueuedMotion {
    pub fn new(duration_ticks: f64, left: f64, right: f64) -> Self {
        Self {
            duration_ticks,
            left,
            right,
        }
    }

    /// 线上请求体 `[3, ticks, left, right]`
    pub fn body(&self) -> [i32; 4] {
        [
            QUEUED_MOTION_QUID,
            to_wire_int(self.duration_ticks),
            to_wire_int(self.left),
            to_wire_int(self.right),
        ]
    }

    pub fn to_bridge_request(&self, node: &str) -> BridgeRequest {
        BridgeRequest::structured(
            node,
            HttpMethod::Post,
            ACTION_QUEUE_MOTION,
            [self.duration_ticks, self.left, self.right],
        )
    }
}
