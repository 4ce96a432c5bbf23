//! 协议常量定义

/// 桥接服务默认地址
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// 默认节点名
pub const DEFAULT_NODE: &str = "thymio-II";

/// 状态更新消息的标签（第一个 token）
pub const STATE_UPDATE_TAG: &str = "R_state_update";

/// 排队运动执行完毕时机器人发出的事件前缀
pub const MOTION_DONE_PREFIX: &str = "Q_motion_noneleft";

/// 状态更新消息的最少 token 数（含标签）
pub const STATE_FIELD_COUNT: usize = 24;

/// 排队运动请求体中的运动队列标识
pub const QUEUED_MOTION_QUID: i32 = 3;

/// 电机速度下限（Aseba 内部单位）
pub const VELOCITY_MIN: i32 = -500;

/// 电机速度上限（Aseba 内部单位）
pub const VELOCITY_MAX: i32 = 500;

/// LED 亮度下限
pub const LED_MIN: i32 = 0;

/// LED 亮度上限
pub const LED_MAX: i32 = 32;

/// mm/s → Aseba 速度单位的换算系数（500 单位 ≈ 156.25 mm/s）
pub const SPEED_TO_VELOCITY: f64 = 3.2;

/// 用户可请求的最大线速度（mm/s）
pub const MAX_SPEED_MM_S: f64 = 156.25;

/// 排队运动时长单位：每秒 100 tick
pub const TICKS_PER_SECOND: f64 = 100.0;

/// 色轮步数
pub const HUE_STEPS: i32 = 198;

/// 色轮每个扇区的步数
pub const HUE_SECTOR: i32 = 33;

/// 里程计坐标的缩放系数
pub const ODOMETER_SCALE: i32 = 28;

/// 麦克风强度超过此值视为检测到声音
pub const SOUND_DETECT_LEVEL: i32 = 2;

/// 播放频率时，秒 → 1/60 秒
pub const SOUND_DURATION_SCALE: f64 = 60.0;

/// 拨盘 LED 点亮时的亮度
pub const DIAL_LED_LEVEL: i32 = 32;

/// 转向时的角度修正系数
pub const TURN_ANGLE_FACTOR: f64 = 0.78;
