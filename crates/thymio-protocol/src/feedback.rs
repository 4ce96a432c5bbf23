//! 传感器读数解码
//!
//! 把一条完整的 `R_state_update` 帧映射为强类型的传感器读数。
//! 这里只有纯函数：没有 IO，也不保存除传入帧之外的任何状态。
//!
//! 所有读取都不会失败：在第一帧到达之前（`frame == None`），数值读数为 0，布尔读数为 `false`。

use crate::constants::{ODOMETER_SCALE, SOUND_DETECT_LEVEL};
use crate::frame::TelemetryFrame;
use crate::ids::*;
use crate::ProtocolError;
use bilge::prelude::*;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// 打包字位域
// ============================================================================

/// 按钮与麦克风打包字（索引 2）
///
/// - Bit 0: 右按钮
/// - Bit 1: 左按钮
/// - Bit 2: 前按钮
/// - Bit 3: 中间按钮
/// - Bit 4: 后按钮
/// - Bit 5-7: 保留
/// - Bit 8-10: 麦克风强度（0-7）
/// - Bit 11-15: 保留
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct ButtonWord {
    pub right: bool,     // Bit 0
    pub left: bool,      // Bit 1
    pub front: bool,     // Bit 2
    pub center: bool,    // Bit 3
    pub back: bool,      // Bit 4
    pub reserved: u3,    // Bit 5-7
    pub microphone: u3,  // Bit 8-10
    pub reserved_hi: u5, // Bit 11-15
}

/// 加速度计打包字（索引 1），每轴 5 bit，偏移 16
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct AccelerometerWord {
    pub top_bottom: u5, // Bit 0-4
    pub front_back: u5, // Bit 5-9
    pub left_right: u5, // Bit 10-14
    pub reserved: u1,   // Bit 15
}

/// 距离打包字（索引 5）：低字节前向，高字节后向
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct DistanceWord {
    pub front: u8, // Bit 0-7
    pub back: u8,  // Bit 8-15
}

/// 角度打包字（索引 3）：低字节后向，高字节地面，均偏移 90
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct AngleWord {
    pub back: u8,   // Bit 0-7
    pub ground: u8, // Bit 8-15
}

/// 取打包字的低 16 位
///
/// 所有打包字段都位于低 16 位内，对非负值这与逐位移位取模的结果完全一致。
fn word(raw: i32) -> u16 {
    raw as u16
}

// ============================================================================
// 菜单枚举
// ============================================================================

macro_rules! menu_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $menu:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// 菜单中的文字
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ProtocolError::UnknownOption {
                        menu: $menu,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

menu_enum! {
    /// 传感器区域
    ///
    /// `distance`/`angle`/`touching` 只区分前、后，其余区域都按地面处理。
    SensorZone, "sensor zone" {
        Front => "front",
        Left => "left",
        Right => "right",
        Back => "back",
        Ground => "ground",
    }
}

menu_enum! {
    /// 接近检测距离档位
    DetectionRange, "detection range" {
        Near => "near",
        Far => "far",
    }
}

menu_enum! {
    /// 机身按钮
    Button, "button" {
        Center => "center",
        Front => "front",
        Back => "back",
        Left => "left",
        Right => "right",
    }
}

menu_enum! {
    /// 加速度计轴
    TiltAxis, "tilt axis" {
        LeftRight => "left-right",
        FrontBack => "front-back",
        TopBottom => "top-bottom",
    }
}

menu_enum! {
    /// 里程计分量
    OdometerAxis, "odometer axis" {
        Direction => "direction",
        X => "x",
        Y => "y",
    }
}

menu_enum! {
    /// 驱动轮
    Wheel, "wheel" {
        Left => "left",
        Right => "right",
    }
}

impl DetectionRange {
    /// 水平距离传感器阈值
    pub fn horizontal_limit(&self) -> i32 {
        match self {
            Self::Far => 1000,
            Self::Near => 3000,
        }
    }

    /// 地面传感器阈值
    pub fn ground_limit(&self) -> i32 {
        match self {
            Self::Far => 50,
            Self::Near => 600,
        }
    }
}

// ============================================================================
// 解码器
// ============================================================================

/// 基于某一帧遥测的传感器读数视图
///
/// # 示例
///
/// ```rust
/// use thymio_protocol::{Button, SensorReadings, TelemetryFrame};
///
/// let mut tokens = vec!["R_state_update".to_string()];
/// tokens.extend((1..24).map(|i| if i == 2 { "9".to_string() } else { "0".to_string() }));
/// let frame = TelemetryFrame::from_tokens(tokens);
///
/// let readings = SensorReadings::new(Some(&frame));
/// assert!(readings.button(Button::Right));
/// assert!(readings.button(Button::Center));
/// assert!(!readings.button(Button::Left));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorReadings<'a> {
    frame: Option<&'a TelemetryFrame>,
}

impl<'a> SensorReadings<'a> {
    pub fn new(frame: Option<&'a TelemetryFrame>) -> Self {
        Self { frame }
    }

    /// 是否已有遥测帧
    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }

    fn read<T: Default>(&self, f: impl FnOnce(&TelemetryFrame) -> T) -> T {
        self.frame.map(f).unwrap_or_default()
    }

    fn sum(frame: &TelemetryFrame, indices: std::ops::Range<usize>) -> i32 {
        indices.fold(0i32, |acc, i| acc.saturating_add(frame.field(i)))
    }

    /// 水平距离传感器（0-6），越界返回 0
    pub fn proximity(&self, sensor: usize) -> i32 {
        if sensor >= PROXIMITY_SENSOR_COUNT {
            return 0;
        }
        self.read(|f| f.field(IDX_PROXIMITY_BASE + sensor))
    }

    /// 7 个水平距离传感器
    pub fn proximity_horizontal(&self) -> [i32; PROXIMITY_SENSOR_COUNT] {
        std::array::from_fn(|i| self.proximity(i))
    }

    /// 7 个水平距离传感器，空格分隔
    pub fn proximity_horizontal_text(&self) -> String {
        self.proximity_horizontal()
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 地面传感器（0 左，1 右），越界返回 0
    pub fn ground(&self, sensor: usize) -> i32 {
        if sensor >= GROUND_SENSOR_COUNT {
            return 0;
        }
        self.read(|f| f.field(IDX_GROUND_BASE + sensor))
    }

    /// 两个地面传感器（左、右）
    pub fn ground_delta(&self) -> [i32; GROUND_SENSOR_COUNT] {
        [self.ground(0), self.ground(1)]
    }

    /// 两个地面传感器，空格分隔
    pub fn ground_delta_text(&self) -> String {
        let [left, right] = self.ground_delta();
        format!("{left} {right}")
    }

    /// 障碍物距离
    ///
    /// - 前向：0-190
    /// - 后向：0-125
    /// - 其它：地面两个传感器之和大于 1000 时为 0，否则为 500
    ///
    /// 前向和后向距离同样从打包字的无符号低 16 位解码。
    pub fn distance(&self, zone: SensorZone) -> i32 {
        self.read(|f| {
            let packed = DistanceWord::from(u16::new(word(f.field(IDX_DISTANCE))));
            match zone {
                SensorZone::Front => i32::from(packed.front()).clamp(0, 190),
                SensorZone::Back => i32::from(packed.back()).clamp(0, 125),
                _ => {
                    if Self::sum(f, IDX_GROUND_BASE..IDX_GROUND_BASE + 2) > 1000 {
                        0
                    } else {
                        500
                    }
                }
            }
        })
    }

    /// 障碍物角度
    ///
    /// 后向和地面角度从打包字的无符号低 16 位解码；原始值为负时结果与按有符号数移位不同。
    pub fn angle(&self, zone: SensorZone) -> i32 {
        self.read(|f| {
            if zone == SensorZone::Front {
                return f.field(IDX_FRONT_ANGLE);
            }
            let packed = AngleWord::from(u16::new(word(f.field(IDX_ANGLE))));
            match zone {
                SensorZone::Back => i32::from(packed.back()) - 90,
                _ => i32::from(packed.ground()) - 90,
            }
        })
    }

    /// 是否检测到接触
    ///
    /// - 前向：前 5 个水平传感器之和为正
    /// - 后向：后 2 个水平传感器之和为正
    /// - 其它：地面两个传感器之和大于 50
    pub fn touching(&self, zone: SensorZone) -> bool {
        self.read(|f| match zone {
            SensorZone::Front => Self::sum(f, IDX_PROXIMITY_BASE..IDX_PROXIMITY_BASE + 5) > 0,
            SensorZone::Back => Self::sum(f, IDX_PROXIMITY_BASE + 5..IDX_PROXIMITY_BASE + 7) > 0,
            _ => Self::sum(f, IDX_GROUND_BASE..IDX_GROUND_BASE + 2) > 50,
        })
    }

    /// 按区域和距离档位判断是否检测到物体
    ///
    /// 前向只看中间传感器（索引 19）；左、右、后各看一对传感器，任一超过阈值即为真。
    /// 地面使用单独的阈值（远 50，近 600）。
    pub fn touching_threshold(&self, zone: SensorZone, range: DetectionRange) -> bool {
        self.read(|f| {
            let over = |indices: &[usize], limit: i32| indices.iter().any(|&i| f.field(i) > limit);
            let limit = range.horizontal_limit();
            match zone {
                SensorZone::Front => over(&[IDX_PROXIMITY_BASE + 2], limit),
                SensorZone::Left => over(&[IDX_PROXIMITY_BASE, IDX_PROXIMITY_BASE + 1], limit),
                SensorZone::Right => {
                    over(&[IDX_PROXIMITY_BASE + 3, IDX_PROXIMITY_BASE + 4], limit)
                }
                SensorZone::Back => over(&[IDX_PROXIMITY_BASE + 5, IDX_PROXIMITY_BASE + 6], limit),
                SensorZone::Ground => over(
                    &[IDX_GROUND_BASE, IDX_GROUND_BASE + 1],
                    range.ground_limit(),
                ),
            }
        })
    }

    /// 麦克风强度（0-7）
    pub fn mic_intensity(&self) -> i32 {
        self.read(|f| {
            let packed = ButtonWord::from(u16::new(word(f.field(IDX_BUTTONS))));
            i32::from(packed.microphone().value())
        })
    }

    /// 麦克风强度是否超过检测阈值
    pub fn sound_detected(&self) -> bool {
        self.mic_intensity() > SOUND_DETECT_LEVEL
    }

    /// 按钮是否按下
    pub fn button(&self, button: Button) -> bool {
        self.read(|f| {
            let packed = ButtonWord::from(u16::new(word(f.field(IDX_BUTTONS))));
            match button {
                Button::Right => packed.right(),
                Button::Left => packed.left(),
                Button::Front => packed.front(),
                Button::Center => packed.center(),
                Button::Back => packed.back(),
            }
        })
    }

    /// 加速度（-32..=30）
    pub fn tilt(&self, axis: TiltAxis) -> i32 {
        self.read(|f| {
            let packed = AccelerometerWord::from(u16::new(word(f.field(IDX_ACCELEROMETER))));
            let raw = match axis {
                TiltAxis::LeftRight => packed.left_right(),
                TiltAxis::FrontBack => packed.front_back(),
                TiltAxis::TopBottom => packed.top_bottom(),
            };
            (i32::from(raw.value()) - 16) * 2
        })
    }

    /// 三轴加速度的平均值（向零截断）是否超过阈值
    pub fn bump(&self, threshold: i32) -> bool {
        if !self.has_frame() {
            return false;
        }
        let total = self.tilt(TiltAxis::LeftRight)
            + self.tilt(TiltAxis::FrontBack)
            + self.tilt(TiltAxis::TopBottom);
        total / 3 > threshold
    }

    /// 里程计
    pub fn odometer(&self, axis: OdometerAxis) -> i32 {
        self.read(|f| match axis {
            OdometerAxis::Direction => f.field(IDX_ODOMETER_DIRECTION),
            OdometerAxis::X => f.field(IDX_ODOMETER_X) / ODOMETER_SCALE,
            OdometerAxis::Y => f.field(IDX_ODOMETER_Y) / ODOMETER_SCALE,
        })
    }

    /// 电机实际速度
    pub fn motor(&self, wheel: Wheel) -> i32 {
        self.read(|f| match wheel {
            Wheel::Left => f.field(IDX_MOTOR_LEFT),
            Wheel::Right => f.field(IDX_MOTOR_RIGHT),
        })
    }

    /// 红外通信最近收到的值
    pub fn received(&self) -> i32 {
        self.read(|f| f.field(IDX_RECEIVE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STATE_FIELD_COUNT;

    fn frame_with(fields: &[(usize, i32)]) -> TelemetryFrame {
        let mut values = vec![0i32; STATE_FIELD_COUNT];
        for &(i, v) in fields {
            values[i] = v;
        }
        let mut tokens = vec!["R_state_update".to_string()];
        tokens.extend(values[1..].iter().map(i32::to_string));
        TelemetryFrame::from_tokens(tokens)
    }

    #[test]
    fn test_button_word_bit_order() {
        let packed = ButtonWord::from(u16::new(0b0000_0011_0000_1001));
        assert!(packed.right(), "Bit 0 应该是右按钮");
        assert!(!packed.left());
        assert!(!packed.front());
        assert!(packed.center(), "Bit 3 应该是中间按钮");
        assert!(!packed.back());
        assert_eq!(packed.microphone().value(), 3);
    }

    #[test]
    fn test_buttons_from_frame() {
        let frame = frame_with(&[(IDX_BUTTONS, 9)]);
        let r = SensorReadings::new(Some(&frame));
        assert!(r.button(Button::Right));
        assert!(r.button(Button::Center));
        assert!(!r.button(Button::Left));
        assert!(!r.button(Button::Front));
        assert!(!r.button(Button::Back));
    }

    #[test]
    fn test_mic_intensity_and_detection() {
        let quiet = frame_with(&[(IDX_BUTTONS, 2 << 8)]);
        let loud = frame_with(&[(IDX_BUTTONS, (3 << 8) | 0b1_0000)]);
        assert_eq!(SensorReadings::new(Some(&quiet)).mic_intensity(), 2);
        assert!(!SensorReadings::new(Some(&quiet)).sound_detected());
        let r = SensorReadings::new(Some(&loud));
        assert_eq!(r.mic_intensity(), 3);
        assert!(r.sound_detected());
        assert!(r.button(Button::Back));
    }

    #[test]
    fn test_distance_zones() {
        let frame = frame_with(&[(IDX_DISTANCE, (200 << 8) | 250)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.distance(SensorZone::Front), 190);
        assert_eq!(r.distance(SensorZone::Back), 125);
        assert_eq!(r.distance(SensorZone::Ground), 500);

        let frame = frame_with(&[(IDX_DISTANCE, (40 << 8) | 80), (15, 600), (16, 600)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.distance(SensorZone::Front), 80);
        assert_eq!(r.distance(SensorZone::Back), 40);
        assert_eq!(r.distance(SensorZone::Ground), 0);
    }

    #[test]
    fn test_angle_zones() {
        let frame = frame_with(&[(IDX_FRONT_ANGLE, -12), (IDX_ANGLE, (100 << 8) | 120)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.angle(SensorZone::Front), -12);
        assert_eq!(r.angle(SensorZone::Back), 30);
        assert_eq!(r.angle(SensorZone::Ground), 10);
    }

    #[test]
    fn test_angle_negative_word_uses_low_bits() {
        let frame = frame_with(&[(IDX_ANGLE, -1)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.angle(SensorZone::Back), 165);
        assert_eq!(r.angle(SensorZone::Ground), 165);

        // 高于 16 位的部分被丢弃
        let frame = frame_with(&[(IDX_ANGLE, (1 << 16) | (100 << 8) | 120)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.angle(SensorZone::Back), 30);
        assert_eq!(r.angle(SensorZone::Ground), 10);
    }

    #[test]
    fn test_touching() {
        let frame = frame_with(&[(19, 1100)]);
        let r = SensorReadings::new(Some(&frame));
        assert!(r.touching(SensorZone::Front));
        assert!(!r.touching(SensorZone::Back));
        assert!(!r.touching(SensorZone::Ground));

        let frame = frame_with(&[(22, 1), (15, 30), (16, 21)]);
        let r = SensorReadings::new(Some(&frame));
        assert!(!r.touching(SensorZone::Front));
        assert!(r.touching(SensorZone::Back));
        assert!(r.touching(SensorZone::Ground));
    }

    #[test]
    fn test_touching_threshold_horizontal() {
        let frame = frame_with(&[(19, 2000), (18, 3500), (21, 1001), (23, 999)]);
        let r = SensorReadings::new(Some(&frame));
        assert!(r.touching_threshold(SensorZone::Front, DetectionRange::Far));
        assert!(!r.touching_threshold(SensorZone::Front, DetectionRange::Near));
        assert!(r.touching_threshold(SensorZone::Left, DetectionRange::Near));
        assert!(r.touching_threshold(SensorZone::Right, DetectionRange::Far));
        assert!(!r.touching_threshold(SensorZone::Right, DetectionRange::Near));
        assert!(!r.touching_threshold(SensorZone::Back, DetectionRange::Far));
    }

    #[test]
    fn test_touching_threshold_ground() {
        let frame = frame_with(&[(16, 100)]);
        let r = SensorReadings::new(Some(&frame));
        assert!(r.touching_threshold(SensorZone::Ground, DetectionRange::Far));
        assert!(!r.touching_threshold(SensorZone::Ground, DetectionRange::Near));
    }

    #[test]
    fn test_tilt_and_bump() {
        // left-right = 20, front-back = 16, top-bottom = 31
        let packed = (20 << 10) | (16 << 5) | 31;
        let frame = frame_with(&[(IDX_ACCELEROMETER, packed)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.tilt(TiltAxis::LeftRight), 8);
        assert_eq!(r.tilt(TiltAxis::FrontBack), 0);
        assert_eq!(r.tilt(TiltAxis::TopBottom), 30);
        // (8 + 0 + 30) / 3 = 12
        assert!(r.bump(11));
        assert!(!r.bump(12));
    }

    #[test]
    fn test_tilt_at_rest_is_negative() {
        let frame = frame_with(&[]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.tilt(TiltAxis::LeftRight), -32);
        assert!(!r.bump(-32));
        assert!(r.bump(-33));
    }

    #[test]
    fn test_odometer_truncates() {
        let frame = frame_with(&[(10, 45), (11, 57), (12, -57)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.odometer(OdometerAxis::Direction), 45);
        assert_eq!(r.odometer(OdometerAxis::X), 2);
        assert_eq!(r.odometer(OdometerAxis::Y), -2);
    }

    #[test]
    fn test_proximity_and_ground_ranges() {
        let fields: Vec<(usize, i32)> = (0..7).map(|i| (17 + i, (i as i32 + 1) * 10)).collect();
        let mut fields = fields;
        fields.push((15, 700));
        fields.push((16, 800));
        let frame = frame_with(&fields);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.proximity(0), 10);
        assert_eq!(r.proximity(6), 70);
        assert_eq!(r.proximity(7), 0);
        assert_eq!(r.proximity_horizontal_text(), "10 20 30 40 50 60 70");
        assert_eq!(r.ground(0), 700);
        assert_eq!(r.ground(1), 800);
        assert_eq!(r.ground(2), 0);
        assert_eq!(r.ground_delta(), [700, 800]);
        assert_eq!(r.ground_delta_text(), "700 800");
    }

    #[test]
    fn test_motors_and_receive() {
        let frame = frame_with(&[(8, 120), (9, -80), (13, 42)]);
        let r = SensorReadings::new(Some(&frame));
        assert_eq!(r.motor(Wheel::Left), 120);
        assert_eq!(r.motor(Wheel::Right), -80);
        assert_eq!(r.received(), 42);
    }

    #[test]
    fn test_reads_without_frame_are_defaults() {
        let r = SensorReadings::new(None);
        assert_eq!(r.proximity(0), 0);
        assert_eq!(r.distance(SensorZone::Ground), 0);
        assert_eq!(r.angle(SensorZone::Back), 0);
        assert_eq!(r.tilt(TiltAxis::TopBottom), 0);
        assert!(!r.touching(SensorZone::Front));
        assert!(!r.button(Button::Center));
        assert!(!r.sound_detected());
        assert!(!r.bump(-100));
        assert_eq!(r.proximity_horizontal_text(), "0 0 0 0 0 0 0");
    }

    #[test]
    fn test_menu_parsing() {
        assert_eq!("front".parse::<SensorZone>(), Ok(SensorZone::Front));
        assert_eq!("left-right".parse::<TiltAxis>(), Ok(TiltAxis::LeftRight));
        assert_eq!("far".parse::<DetectionRange>(), Ok(DetectionRange::Far));
        assert_eq!(Button::Center.to_string(), "center");
        assert!(matches!(
            "sideways".parse::<SensorZone>(),
            Err(ProtocolError::UnknownOption { menu: "sensor zone", .. })
        ));
    }
}
