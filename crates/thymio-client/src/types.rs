//! 客户端层类型
//!
//! 菜单类选项（电机、LED 组、表盘方向），以及重新导出的传感器菜单。

use std::fmt;
use std::str::FromStr;
use thymio_protocol::{ActionRequest, ProtocolError, Rgb};

pub use thymio_protocol::{
    Button, DetectionRange, OdometerAxis, SensorZone, TiltAxis, Wheel,
};

/// 电机选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotorSelection {
    Left,
    Right,
    /// 先左后右
    #[default]
    All,
}

impl MotorSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::All => "all",
        }
    }
}

impl FromStr for MotorSelection {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "all" => Ok(Self::All),
            other => Err(ProtocolError::UnknownOption {
                menu: "motor",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MotorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个可控 RGB LED
///
/// 顺序与色相影子状态的下标一致：顶部 0，左下 1，右下 2。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedTarget {
    Top,
    BottomLeft,
    BottomRight,
}

impl LedTarget {
    pub const ALL: [LedTarget; 3] = [Self::Top, Self::BottomLeft, Self::BottomRight];

    /// 影子状态下标
    pub fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::BottomLeft => 1,
            Self::BottomRight => 2,
        }
    }

    /// 分组掩码中的位
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// 设置该 LED 颜色的动作
    pub fn action(self, rgb: Rgb) -> ActionRequest {
        match self {
            Self::Top => ActionRequest::leds_top(rgb),
            Self::BottomLeft => ActionRequest::leds_bottom(0, rgb),
            Self::BottomRight => ActionRequest::leds_bottom(1, rgb),
        }
    }
}

/// RGB LED 分组
///
/// | 分组 | 掩码 |
/// |---|---|
/// | top | 1 |
/// | bottom-left | 2 |
/// | bottom-right | 4 |
/// | bottom | 6 |
/// | all | 7 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LedGroup {
    #[default]
    All,
    Top,
    Bottom,
    BottomLeft,
    BottomRight,
}

impl LedGroup {
    /// 宽松解析：无法识别的名字按 `All` 处理
    pub fn from_menu(name: &str) -> Self {
        name.parse().unwrap_or(Self::All)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    pub fn mask(&self) -> u8 {
        match self {
            Self::Top => 1,
            Self::BottomLeft => 2,
            Self::BottomRight => 4,
            Self::Bottom => 6,
            Self::All => 7,
        }
    }

    /// 分组包含的 LED（按顶部、左下、右下的顺序）
    pub fn targets(&self) -> impl Iterator<Item = LedTarget> + use<> {
        let mask = self.mask();
        LedTarget::ALL
            .into_iter()
            .filter(move |target| mask & target.bit() != 0)
    }
}

impl FromStr for LedGroup {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(ProtocolError::UnknownOption {
                menu: "led group",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 表盘 LED 前进方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialDirection {
    /// 位置 +1
    Left,
    /// 位置 -1
    Right,
}

impl FromStr for DialDirection {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(ProtocolError::UnknownOption {
                menu: "dial direction",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_masks_and_targets() {
        assert_eq!(LedGroup::Top.mask(), 1);
        assert_eq!(LedGroup::Bottom.mask(), 6);
        assert_eq!(
            LedGroup::Bottom.targets().collect::<Vec<_>>(),
            vec![LedTarget::BottomLeft, LedTarget::BottomRight]
        );
        assert_eq!(LedGroup::All.targets().count(), 3);
        assert_eq!(
            LedGroup::BottomRight.targets().collect::<Vec<_>>(),
            vec![LedTarget::BottomRight]
        );
    }

    #[test]
    fn test_unknown_group_falls_back_to_all() {
        assert_eq!(LedGroup::from_menu("bottom-left"), LedGroup::BottomLeft);
        assert_eq!(LedGroup::from_menu("sideways"), LedGroup::All);
        assert!("sideways".parse::<LedGroup>().is_err());
    }

    #[test]
    fn test_target_actions() {
        let rgb = Rgb::new(1, 2, 3);
        assert_eq!(LedTarget::Top.action(rgb).args.as_slice(), &[1, 2, 3]);
        assert_eq!(LedTarget::BottomRight.action(rgb).args.as_slice(), &[1, 1, 2, 3]);
        assert_eq!(LedTarget::BottomLeft.action(rgb).action, "V_leds_bottom");
    }

    #[test]
    fn test_motor_selection_parse() {
        assert_eq!("all".parse::<MotorSelection>(), Ok(MotorSelection::All));
        assert_eq!(MotorSelection::Left.to_string(), "left");
        assert!("both".parse::<MotorSelection>().is_err());
    }
}
