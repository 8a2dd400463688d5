//! 协议常量定义

// ============================================================================
// 下行（relay → watch）字典键
// ============================================================================

/// 飞行模式标签
pub const KEY_MODE: u32 = 0;
/// 跟随类型标签
pub const KEY_FOLLOW_TYPE: u32 = 1;
/// 多行遥测文本（电池 / 高度 / 速度）
pub const KEY_TELEM: u32 = 2;
/// 协议版本标签（设备端据此做兼容性校验）
pub const KEY_APP_VERSION: u32 = 3;

// ============================================================================
// 上行（watch → relay）字典键
// ============================================================================

/// 请求码所在的键
pub const KEY_REQUEST: u32 = 100;

/// 当前协议版本
///
/// 设备端期望值不一致时会丢弃整条消息。
pub const PROTOCOL_VERSION: &str = "one";

/// 伴侣应用标识（启动设备端应用时使用）
pub const APP_UUID: &str = "1de866f1-22fa-4add-ba55-e7722167a3b4";

/// 跟随类型为空时下发的字面值
pub const FOLLOW_TYPE_NONE: &str = "none";
