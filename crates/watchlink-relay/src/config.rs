//! # 中继配置
//!
//! 从 TOML 文件加载，所有字段都有默认值，缺省的段落按默认值补齐。
//!
//! ```toml
//! telemetry_interval_ms = 500
//! foreground_title = "Watch relay running"
//! battery_display = "zeroed"
//! channel_capacity = 64
//!
//! [transport]
//! stream_rate_hz = 10
//!
//! [transport.link]
//! type = "usb"
//! baud_rate = 57600
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 飞行器链路
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transport {
    /// USB 数传
    Usb { baud_rate: u32 },
    /// UDP（监听端口）
    Udp { port: u16 },
    /// TCP（连接远端）
    Tcp { host: String, port: u16 },
}

impl Default for Transport {
    fn default() -> Self {
        Transport::Usb { baud_rate: 57600 }
    }
}

/// 飞行器连接参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParameter {
    pub link: Transport,
    /// 遥测流速率（Hz）
    pub stream_rate_hz: u16,
}

impl Default for ConnectionParameter {
    fn default() -> Self {
        Self {
            link: Transport::default(),
            stream_rate_hz: 10,
        }
    }
}

/// 电池电压显示策略
///
/// 早期版本在格式化前总是把已上报的电压置为 0.0。这一行为被视为缺陷但尚未得到
/// 产品确认，默认保留；`Measured` 显示真实读数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryDisplay {
    #[default]
    Zeroed,
    Measured,
}

/// 中继配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 常规优先级遥测的最小发送间隔（毫秒）
    pub telemetry_interval_ms: u64,
    /// 飞行器连接参数
    pub transport: ConnectionParameter,
    /// 前台状态标题
    pub foreground_title: String,
    pub battery_display: BatteryDisplay,
    /// 中继事件队列容量
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: 500,
            transport: ConnectionParameter::default(),
            foreground_title: "Watch relay running".to_string(),
            battery_display: BatteryDisplay::default(),
            channel_capacity: 64,
        }
    }
}

impl RelayConfig {
    /// 默认配置文件路径
    ///
    /// - Linux: `~/.config/watchlink/config.toml`
    /// - macOS: `~/Library/Application Support/watchlink/config.toml`
    /// - Windows: `%APPDATA%\watchlink\config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("watchlink").join("config.toml"))
    }

    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 保存到文件（父目录不存在时创建）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }
        if self.transport.stream_rate_hz == 0 {
            return Err(ConfigError::Invalid(
                "transport.stream_rate_hz must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.telemetry_interval(), Duration::from_millis(500));
        assert_eq!(config.transport.link, Transport::Usb { baud_rate: 57600 });
        assert_eq!(config.transport.stream_rate_hz, 10);
        assert_eq!(config.battery_display, BatteryDisplay::Zeroed);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = RelayConfig::from_toml_str("telemetry_interval_ms = 250\n").unwrap();
        assert_eq!(config.telemetry_interval_ms, 250);
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(config.foreground_title, "Watch relay running");
    }

    #[test]
    fn test_transport_variants() {
        let toml = r#"
battery_display = "measured"

[transport]
stream_rate_hz = 4

[transport.link]
type = "tcp"
host = "10.0.0.2"
port = 5760
"#;
        let config = RelayConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.battery_display, BatteryDisplay::Measured);
        assert_eq!(config.transport.stream_rate_hz, 4);
        assert_eq!(
            config.transport.link,
            Transport::Tcp {
                host: "10.0.0.2".to_string(),
                port: 5760
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            RelayConfig::from_toml_str("channel_capacity = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RelayConfig::from_toml_str("telemetry_interval_ms = \"fast\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = RelayConfig::default();
        config.transport.link = Transport::Udp { port: 14550 };
        config.save_to_file(&path).unwrap();

        let loaded = RelayConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = RelayConfig::load_from_file("/nonexistent/watchlink.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
