//! 事件流行解码
//!
//! 桥接以 Server-Sent Events 推送遥测。每条 `data:` 行携带一条消息；
//! `event:`、`id:`、`retry:` 字段和 `:` 开头的注释行被忽略。
//! 不带字段名的非空行按原始消息处理，以兼容直接逐行推送的桥接实现。

/// 解码事件流中的一行，返回消息负载
///
/// 行尾的 `\r`/`\n` 会被去掉；空行和非数据字段返回 `None`。
pub fn decode_stream_line(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }

    if let Some(rest) = line.strip_prefix("data:") {
        let payload = rest.strip_prefix(' ').unwrap_or(rest);
        return if payload.trim().is_empty() {
            None
        } else {
            Some(payload)
        };
    }

    for field in ["event:", "id:", "retry:"] {
        if line.starts_with(field) {
            return None;
        }
    }

    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_line() {
        assert_eq!(
            decode_stream_line("data: R_state_update 1 2 3\r\n"),
            Some("R_state_update 1 2 3")
        );
        assert_eq!(decode_stream_line("data:Q_motion_noneleft"), Some("Q_motion_noneleft"));
    }

    #[test]
    fn test_ignored_lines() {
        assert_eq!(decode_stream_line(""), None);
        assert_eq!(decode_stream_line("\r\n"), None);
        assert_eq!(decode_stream_line(": keep-alive"), None);
        assert_eq!(decode_stream_line("event: message"), None);
        assert_eq!(decode_stream_line("id: 7"), None);
        assert_eq!(decode_stream_line("retry: 1000"), None);
        assert_eq!(decode_stream_line("data:   "), None);
    }

    #[test]
    fn test_raw_line() {
        assert_eq!(decode_stream_line("R_state_update 0 0"), Some("R_state_update 0 0"));
    }
}
