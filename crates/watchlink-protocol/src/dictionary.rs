//! 整数键字典
//!
//! 伴侣设备链路上的每条消息都是一个 `u32 -> Value` 的有序映射。
//! 使用 `BTreeMap` 保证迭代顺序与键序一致，方便日志输出和测试断言。

use crate::ProtocolError;
use std::collections::BTreeMap;

/// 字典值
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Str(String),
    Int(i32),
}

/// 整数键字典
///
/// # Example
///
/// ```rust
/// use watchlink_protocol::{Dictionary, KEY_MODE};
///
/// let mut dict = Dictionary::new();
/// dict.add_string(KEY_MODE, "Loiter");
/// assert_eq!(dict.get_string(KEY_MODE).unwrap(), "Loiter");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dictionary {
    entries: BTreeMap<u32, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字符串字段（同键覆盖）
    pub fn add_string(&mut self, key: u32, value: impl Into<String>) {
        self.entries.insert(key, Value::Str(value.into()));
    }

    /// 写入整数字段（同键覆盖）
    pub fn add_integer(&mut self, key: u32, value: i32) {
        self.entries.insert(key, Value::Int(value));
    }

    pub fn get(&self, key: u32) -> Option<&Value> {
        self.entries.get(&key)
    }

    /// 读取字符串字段
    pub fn get_string(&self, key: u32) -> Result<&str, ProtocolError> {
        match self.entries.get(&key) {
            Some(Value::Str(s)) => Ok(s.as_str()),
            Some(_) => Err(ProtocolError::WrongType {
                key,
                expected: "string",
            }),
            None => Err(ProtocolError::MissingKey { key }),
        }
    }

    /// 读取整数字段
    pub fn get_integer(&self, key: u32) -> Result<i32, ProtocolError> {
        match self.entries.get(&key) {
            Some(Value::Int(v)) => Ok(*v),
            Some(_) => Err(ProtocolError::WrongType {
                key,
                expected: "integer",
            }),
            None => Err(ProtocolError::MissingKey { key }),
        }
    }

    pub fn contains_key(&self, key: u32) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按键升序迭代
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}
