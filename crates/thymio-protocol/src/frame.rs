//! 遥测帧
//!
//! 桥接事件流中的每条消息都是一行以空白分隔的 token。第一个 token 是标签：
//! `R_state_update` 表示完整的传感器快照，其它标签（如 `Q_motion_noneleft`）是机器人发出的事件。

use crate::constants::{STATE_FIELD_COUNT, STATE_UPDATE_TAG};
use crate::ProtocolError;
use std::str::FromStr;

/// 一条遥测消息（已按空白拆分）
///
/// 字段读取永不失败：缺失或非数字的 token 读作 0，
/// 这样在第一帧到达之前，上层查询也能拿到确定的值。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryFrame {
    tokens: Vec<String>,
}

impl TelemetryFrame {
    /// 从已拆分的 token 构建
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// 消息标签（第一个 token），空消息返回 `""`
    pub fn tag(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or("")
    }

    /// 是否为状态更新消息
    pub fn is_state_update(&self) -> bool {
        self.tag() == STATE_UPDATE_TAG
    }

    /// 状态更新消息是否包含全部字段
    pub fn is_complete_state(&self) -> bool {
        self.is_state_update() && self.tokens.len() >= STATE_FIELD_COUNT
    }

    /// 标签是否以给定前缀开头
    pub fn tag_starts_with(&self, prefix: &str) -> bool {
        !self.tokens.is_empty() && self.tag().starts_with(prefix)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// 原始 token
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// 读取整数字段（缺失或非数字读作 0）
    pub fn field(&self, index: usize) -> i32 {
        self.token(index).map(parse_int).unwrap_or(0)
    }

    /// 按空格重新拼接（用于日志）
    pub fn to_message(&self) -> String {
        self.tokens.join(" ")
    }
}

impl FromStr for TelemetryFrame {
    type Err = ProtocolError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let frame = Self::from_tokens(payload.split_whitespace());
        if frame.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }
        Ok(frame)
    }
}

/// 宽松整数解析
///
/// 跳过前导空白，接受可选符号，然后读取尽可能多的十进制数字；
/// 小数部分被截断（`"12.7"` → 12），没有数字时返回 0，超出范围时饱和到 `i32`。
pub fn parse_int(token: &str) -> i32 {
    let s = token.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if !seen {
        return 0;
    }

    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_frame() -> TelemetryFrame {
        let mut tokens = vec!["R_state_update".to_string()];
        tokens.extend((1..STATE_FIELD_COUNT).map(|i| i.to_string()));
        TelemetryFrame::from_tokens(tokens)
    }

    #[test]
    fn test_parse_splits_on_whitespace() {
        let frame: TelemetryFrame = "R_state_update 1  2\t3".parse().unwrap();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.tag(), "R_state_update");
        assert_eq!(frame.field(3), 3);
        assert!(frame.is_state_update());
        assert!(!frame.is_complete_state());
    }

    #[test]
    fn test_parse_empty_payload() {
        assert_eq!("   ".parse::<TelemetryFrame>(), Err(ProtocolError::EmptyFrame));
        assert_eq!("".parse::<TelemetryFrame>(), Err(ProtocolError::EmptyFrame));
    }

    #[test]
    fn test_complete_state_frame() {
        let frame = state_frame();
        assert_eq!(frame.len(), STATE_FIELD_COUNT);
        assert!(frame.is_complete_state());
        assert_eq!(frame.field(23), 23);
    }

    #[test]
    fn test_missing_fields_read_as_zero() {
        let frame = TelemetryFrame::default();
        assert_eq!(frame.tag(), "");
        assert_eq!(frame.field(5), 0);
        assert_eq!(state_frame().field(100), 0);
    }

    #[test]
    fn test_event_prefix() {
        let frame: TelemetryFrame = "Q_motion_noneleft 0".parse().unwrap();
        assert!(frame.tag_starts_with("Q_motion_noneleft"));
        assert!(!frame.is_state_update());
        assert!(!TelemetryFrame::default().tag_starts_with(""));
    }

    #[test]
    fn test_parse_int_lenient() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("-17"), -17);
        assert_eq!(parse_int("+5"), 5);
        assert_eq!(parse_int("12.7"), 12);
        assert_eq!(parse_int("  9abc"), 9);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn test_parse_int_saturates() {
        assert_eq!(parse_int("99999999999999999999"), i32::MAX);
        assert_eq!(parse_int("-99999999999999999999"), i32::MIN);
    }

    #[test]
    fn test_to_message() {
        let frame: TelemetryFrame = "Q_motion_noneleft  1 2".parse().unwrap();
        assert_eq!(frame.to_message(), "Q_motion_noneleft 1 2");
    }
}
