//! 遥测字段索引与动作名
//!
//! 索引从状态消息的第一个 token（标签）开始计数，即索引 0 是 `R_state_update`。

// ============================================================================
// 状态消息字段索引
// ============================================================================

/// 加速度计打包字（3 × 5 bit）
pub const IDX_ACCELEROMETER: usize = 1;
/// 按钮位 + 麦克风强度打包字
pub const IDX_BUTTONS: usize = 2;
/// 后向/地面角度打包字
pub const IDX_ANGLE: usize = 3;
/// 前向角度
pub const IDX_FRONT_ANGLE: usize = 4;
/// 前向/后向距离打包字
pub const IDX_DISTANCE: usize = 5;
/// 左电机速度
pub const IDX_MOTOR_LEFT: usize = 8;
/// 右电机速度
pub const IDX_MOTOR_RIGHT: usize = 9;
/// 里程计方向
pub const IDX_ODOMETER_DIRECTION: usize = 10;
/// 里程计 x（需除以缩放系数）
pub const IDX_ODOMETER_X: usize = 11;
/// 里程计 y（需除以缩放系数）
pub const IDX_ODOMETER_Y: usize = 12;
/// 红外通信收到的值
pub const IDX_RECEIVE: usize = 13;
/// 地面传感器起始索引（2 个）
pub const IDX_GROUND_BASE: usize = 15;
/// 水平距离传感器起始索引（7 个）
pub const IDX_PROXIMITY_BASE: usize = 17;

/// 地面传感器数量
pub const GROUND_SENSOR_COUNT: usize = 2;
/// 水平距离传感器数量
pub const PROXIMITY_SENSOR_COUNT: usize = 7;

// ============================================================================
// 桥接动作名
// ============================================================================

pub const ACTION_MOTOR_LEFT: &str = "M_motor_left";
pub const ACTION_MOTOR_RIGHT: &str = "M_motor_right";
pub const ACTION_QUEUE_MOTION: &str = "Q_add_motion";
pub const ACTION_SET_ODOMETER: &str = "Q_set_odometer";
pub const ACTION_LEDS_TOP: &str = "V_leds_top";
pub const ACTION_LEDS_BOTTOM: &str = "V_leds_bottom";
pub const ACTION_LEDS_CIRCLE: &str = "V_leds_circle";
pub const ACTION_LEDS_PROX_H: &str = "V_leds_prox_h";
pub const ACTION_LEDS_PROX_V: &str = "V_leds_prox_v";
pub const ACTION_LEDS_BUTTONS: &str = "V_leds_buttons";
pub const ACTION_LEDS_TEMPERATURE: &str = "V_leds_temperature";
pub const ACTION_LEDS_RC: &str = "V_leds_rc";
pub const ACTION_LEDS_SOUND: &str = "V_leds_sound";
pub const ACTION_SOUND_SYSTEM: &str = "A_sound_system";
pub const ACTION_SOUND_FREQ: &str = "A_sound_freq";
pub const ACTION_SOUND_PLAY: &str = "A_sound_play";
pub const ACTION_SOUND_RECORD: &str = "A_sound_record";
pub const ACTION_SOUND_REPLAY: &str = "A_sound_replay";
pub const ACTION_EMIT: &str = "prox.comm.tx";
