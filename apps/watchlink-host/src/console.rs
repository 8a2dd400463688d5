//! 控制台伴侣设备
//!
//! 下行消息以 JSON 打印到 stdout；上行请求从 stdin 逐行读取，
//! 每行是一个请求码（`101`）或别名（`follow`、`cycle`、`pause`、`rtl`、`connect`、`disconnect`）。

use std::io::{self, BufRead, Write};
use tracing::{info, warn};
use watchlink_protocol::{APP_UUID, Dictionary, InboundMessage, RequestCode};
use watchlink_relay::{HostStatus, LinkError, PeripheralChannel, UserNotifier};

/// stdout 上的伴侣设备通道
#[derive(Debug, Default)]
pub struct ConsolePeripheral;

impl PeripheralChannel for ConsolePeripheral {
    fn send_ack(&mut self, transaction_id: u8) -> Result<(), LinkError> {
        info!("ACK transaction {}", transaction_id);
        Ok(())
    }

    fn send_data(&mut self, data: &Dictionary) -> Result<(), LinkError> {
        let json = serde_json::to_string(data).map_err(|e| LinkError::Io(e.to_string()))?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", json).map_err(|e| LinkError::Io(e.to_string()))
    }

    fn launch_app(&mut self) -> Result<(), LinkError> {
        info!("Launching companion app {}", APP_UUID);
        Ok(())
    }
}

/// 以日志代替 toast
#[derive(Debug, Default)]
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn notify(&mut self, text: &str) {
        info!("Notice: {}", text);
    }
}

/// 以日志代替前台通知
#[derive(Debug, Default)]
pub struct LogHostStatus;

impl HostStatus for LogHostStatus {
    fn start_foreground(&mut self, title: &str) {
        info!("Foreground: {}", title);
    }

    fn stop_foreground(&mut self) {
        info!("Foreground released");
    }
}

/// 控制台输入
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Request(i32),
    Quit,
}

/// 解析一行输入，空行返回 `None`
pub fn parse_line(line: &str) -> Option<ConsoleInput> {
    let word = line.trim();
    if word.is_empty() {
        return None;
    }
    let code = match word.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Some(ConsoleInput::Quit),
        "follow" => RequestCode::ModeFollow.code(),
        "cycle" => RequestCode::CycleFollowType.code(),
        "pause" => RequestCode::Pause.code(),
        "rtl" => RequestCode::ModeRtl.code(),
        "connect" => RequestCode::Connect.code(),
        "disconnect" => RequestCode::Disconnect.code(),
        other => match other.parse::<i32>() {
            Ok(code) => code,
            Err(_) => {
                warn!("Unrecognized input: {}", word);
                return None;
            },
        },
    };
    Some(ConsoleInput::Request(code))
}

/// 从 stdin 读取请求，直到 EOF 或 `quit`
///
/// 事务号在 `u8` 范围内循环递增。
pub fn read_requests(mut on_request: impl FnMut(InboundMessage) -> bool) {
    let stdin = io::stdin();
    let mut transaction_id: u8 = 0;
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        match parse_line(&line) {
            Some(ConsoleInput::Request(code)) => {
                if !on_request(InboundMessage::request(transaction_id, code)) {
                    break;
                }
                transaction_id = transaction_id.wrapping_add(1);
            },
            Some(ConsoleInput::Quit) => break,
            None => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases_and_codes() {
        assert_eq!(parse_line("follow"), Some(ConsoleInput::Request(101)));
        assert_eq!(parse_line("  RTL "), Some(ConsoleInput::Request(104)));
        assert_eq!(parse_line("106"), Some(ConsoleInput::Request(106)));
        assert_eq!(parse_line("999"), Some(ConsoleInput::Request(999)));
        assert_eq!(parse_line("quit"), Some(ConsoleInput::Quit));
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("hover"), None);
    }
}
