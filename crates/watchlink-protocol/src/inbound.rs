//! 设备上行请求
//!
//! 上行消息只携带一个整数字段（键 [`KEY_REQUEST`]），取值范围 101..=106。

use crate::constants::KEY_REQUEST;
use crate::{Dictionary, ProtocolError};
use num_enum::TryFromPrimitive;

/// 上行请求码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum RequestCode {
    /// 切换跟随模式（开 ↔ 关）
    ModeFollow = 101,
    /// 切换到下一个跟随类型（循环）
    CycleFollowType = 102,
    /// 原地悬停
    Pause = 103,
    /// 切换到返航（RTL）模式
    ModeRtl = 104,
    /// 连接飞行器（任何请求都会触发按需连接，此码本身无额外动作）
    Connect = 105,
    /// 断开并拆除会话
    Disconnect = 106,
}

impl RequestCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// 上行消息
///
/// `transaction_id` 由设备端分配，确认（ACK）时原样返回。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InboundMessage {
    pub transaction_id: u8,
    pub data: Dictionary,
}

impl InboundMessage {
    pub fn new(transaction_id: u8, data: Dictionary) -> Self {
        Self {
            transaction_id,
            data,
        }
    }

    /// 便捷构造：只携带一个请求码的消息
    pub fn request(transaction_id: u8, code: i32) -> Self {
        let mut data = Dictionary::new();
        data.add_integer(KEY_REQUEST, code);
        Self::new(transaction_id, data)
    }

    /// 解析请求码
    ///
    /// 缺少请求键返回 `MissingKey`，未知码返回 `UnknownRequest`。
    pub fn request_code(&self) -> Result<RequestCode, ProtocolError> {
        let raw = self.data.get_integer(KEY_REQUEST)?;
        RequestCode::try_from(raw).map_err(|_| ProtocolError::UnknownRequest(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let cases = [
            (101, RequestCode::ModeFollow),
            (102, RequestCode::CycleFollowType),
            (103, RequestCode::Pause),
            (104, RequestCode::ModeRtl),
            (105, RequestCode::Connect),
            (106, RequestCode::Disconnect),
        ];
        for (raw, expected) in cases {
            let msg = InboundMessage::request(1, raw);
            assert_eq!(msg.request_code().unwrap(), expected);
            assert_eq!(expected.code(), raw);
        }
    }

    #[test]
    fn test_unknown_code() {
        let msg = InboundMessage::request(9, 107);
        assert_eq!(msg.request_code(), Err(ProtocolError::UnknownRequest(107)));

        let msg = InboundMessage::request(9, 100);
        assert_eq!(msg.request_code(), Err(ProtocolError::UnknownRequest(100)));
    }

    #[test]
    fn test_missing_request_key() {
        let msg = InboundMessage::new(3, Dictionary::new());
        assert_eq!(
            msg.request_code(),
            Err(ProtocolError::MissingKey { key: KEY_REQUEST })
        );
    }

    #[test]
    fn test_request_as_string_is_wrong_type() {
        let mut data = Dictionary::new();
        data.add_string(KEY_REQUEST, "101");
        let msg = InboundMessage::new(3, data);
        assert!(matches!(
            msg.request_code(),
            Err(ProtocolError::WrongType { .. })
        ));
    }
}
