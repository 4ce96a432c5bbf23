//! 色轮映射
//!
//! 198 步色轮，6 个扇区（红→黄→绿→青→蓝→品红→红），每扇区 33 级线性过渡。

use crate::constants::{HUE_SECTOR, HUE_STEPS};

/// RGB 三元组（每个分量 0..=33）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [i32; 3] {
        [self.r, self.g, self.b]
    }
}

/// 把任意整数色相归一化到 `0..198`
pub fn normalize_hue(hue: i64) -> i32 {
    hue.rem_euclid(i64::from(HUE_STEPS)) as i32
}

/// 色相 → RGB
///
/// 先对 198 取模，再按扇区（`h / 33`）和扇区内偏移（`h % 33`）线性插值。
pub fn hue_to_rgb(hue: i64) -> Rgb {
    let h = normalize_hue(hue);
    let offset = h % HUE_SECTOR;
    let full = HUE_SECTOR;
    match h / HUE_SECTOR {
        0 => Rgb::new(full, offset, 0),
        1 => Rgb::new(full - offset, full, 0),
        2 => Rgb::new(0, full, offset),
        3 => Rgb::new(0, full - offset, full),
        4 => Rgb::new(offset, 0, full),
        _ => Rgb::new(full, 0, full - offset),
    }
}
