//! 飞行器数据模型
//!
//! 与飞行器服务协作者交换的属性类型、事件类型。所有类型都是纯数据，
//! 每次读取都会重新构造，不在中继内部缓存。

use std::fmt;

// ==================== 飞行模式 ====================

/// 多旋翼飞行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleMode {
    Stabilize,
    Acro,
    AltHold,
    Auto,
    Guided,
    Loiter,
    /// 返航（Return To Launch）
    Rtl,
    Circle,
    Land,
    Drift,
    Sport,
    PosHold,
    Brake,
}

impl VehicleMode {
    /// 显示标签
    pub fn label(self) -> &'static str {
        match self {
            VehicleMode::Stabilize => "Stabilize",
            VehicleMode::Acro => "Acro",
            VehicleMode::AltHold => "Alt Hold",
            VehicleMode::Auto => "Auto",
            VehicleMode::Guided => "Guided",
            VehicleMode::Loiter => "Loiter",
            VehicleMode::Rtl => "RTL",
            VehicleMode::Circle => "Circle",
            VehicleMode::Land => "Land",
            VehicleMode::Drift => "Drift",
            VehicleMode::Sport => "Sport",
            VehicleMode::PosHold => "PosHold",
            VehicleMode::Brake => "Brake",
        }
    }
}

impl fmt::Display for VehicleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==================== 跟随 ====================

/// 跟随类型
///
/// 枚举顺序即循环切换顺序，见 [`FollowType::ALL`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowType {
    Leash,
    Lead,
    Right,
    Left,
    Circle,
    Above,
}

impl FollowType {
    /// 固定的循环顺序
    pub const ALL: [FollowType; 6] = [
        FollowType::Leash,
        FollowType::Lead,
        FollowType::Right,
        FollowType::Left,
        FollowType::Circle,
        FollowType::Above,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FollowType::Leash => "Leash",
            FollowType::Lead => "Lead",
            FollowType::Right => "Right",
            FollowType::Left => "Left",
            FollowType::Circle => "Circle",
            FollowType::Above => "Above",
        }
    }
}

impl fmt::Display for FollowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 跟随状态种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowStateKind {
    Start,
    Running,
    End,
    Invalid,
    DroneDisconnected,
    DroneNotArmed,
}

/// 跟随状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowState {
    pub kind: FollowStateKind,
    /// 当前跟随类型（服务端可能尚未选定）
    pub follow_type: Option<FollowType>,
}

impl FollowState {
    pub fn new(kind: FollowStateKind, follow_type: Option<FollowType>) -> Self {
        Self { kind, follow_type }
    }

    /// 仅 Start / Running 视为已启用
    pub fn is_enabled(&self) -> bool {
        matches!(self.kind, FollowStateKind::Start | FollowStateKind::Running)
    }
}

// ==================== 其他属性 ====================

/// 飞行器基本状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleState {
    pub armed: bool,
    pub connected: bool,
    pub mode: Option<VehicleMode>,
}

/// 引导模式状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidedState {
    /// 处于引导模式但没有活动目标（原地保持）
    pub idle: bool,
}

/// 电池
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    /// 电压（V），飞控尚未上报时为 `None`
    pub voltage: Option<f64>,
}

/// 速度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed {
    /// 空速（m/s）
    pub air_speed: f64,
}

/// 高度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Altitude {
    /// 相对高度（m）
    pub altitude: f64,
}

/// 属性种类（`read_attribute` 的查询键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    State,
    Battery,
    Speed,
    Altitude,
    FollowState,
    GuidedState,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::State => "STATE",
            AttributeKind::Battery => "BATTERY",
            AttributeKind::Speed => "SPEED",
            AttributeKind::Altitude => "ALTITUDE",
            AttributeKind::FollowState => "FOLLOW_STATE",
            AttributeKind::GuidedState => "GUIDED_STATE",
        };
        f.write_str(name)
    }
}

/// 属性值（按种类标记的联合体）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute {
    State(VehicleState),
    Battery(Battery),
    Speed(Speed),
    Altitude(Altitude),
    FollowState(FollowState),
    GuidedState(GuidedState),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::State(_) => AttributeKind::State,
            Attribute::Battery(_) => AttributeKind::Battery,
            Attribute::Speed(_) => AttributeKind::Speed,
            Attribute::Altitude(_) => AttributeKind::Altitude,
            Attribute::FollowState(_) => AttributeKind::FollowState,
            Attribute::GuidedState(_) => AttributeKind::GuidedState,
        }
    }
}

// ==================== 事件 ====================

/// 飞行器生命周期事件
///
/// 协作者以字符串命名事件，在边界处由 [`VehicleEvent::from_name`] 收敛为封闭枚举，
/// 路由器对其做穷尽匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleEvent {
    Connected,
    Disconnected,
    ModeChanged,
    BatteryUpdated,
    SpeedUpdated,
    FollowStarted,
    FollowStopped,
}

impl VehicleEvent {
    /// 从协作者的事件名映射
    ///
    /// 接受裸名（`STATE_CONNECTED`）或带包名前缀的全名
    /// （`com.example.attribute.event.STATE_CONNECTED`）。无法识别的名字返回 `None`。
    pub fn from_name(name: &str) -> Option<Self> {
        let action = name.rsplit('.').next().unwrap_or(name);
        match action {
            "STATE_CONNECTED" => Some(VehicleEvent::Connected),
            "STATE_DISCONNECTED" => Some(VehicleEvent::Disconnected),
            "STATE_VEHICLE_MODE" => Some(VehicleEvent::ModeChanged),
            "BATTERY_UPDATED" => Some(VehicleEvent::BatteryUpdated),
            "SPEED_UPDATED" => Some(VehicleEvent::SpeedUpdated),
            "FOLLOW_START" => Some(VehicleEvent::FollowStarted),
            "FOLLOW_STOP" => Some(VehicleEvent::FollowStopped),
            _ => None,
        }
    }
}
