//! 内存模拟协作者
//!
//! 所有模拟对象都是 `Clone` 的共享句柄：交给中继一份，测试保留一份用于断言。
//! 每次调用都会被记录，不访问任何真实设备。

use crate::config::ConnectionParameter;
use crate::link::*;
use crate::vehicle::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use watchlink_protocol::Dictionary;

// ==================== 飞行器 ====================

/// 记录的飞行器调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleCall {
    Start,
    Connect(ConnectionParameter),
    Disconnect,
    EnableFollow(Option<FollowType>),
    DisableFollow,
    PauseAtCurrentLocation,
    ChangeMode(VehicleMode),
    Destroy,
}

#[derive(Debug, Default, Clone)]
struct VehicleInner {
    attributes: HashMap<AttributeKind, Attribute>,
    started: bool,
    connected: bool,
    /// connect() 调用后立即视为已连接
    auto_connect: bool,
    /// 非空时所有飞行器操作都被拒绝
    reject_reason: Option<String>,
    calls: Vec<VehicleCall>,
}

/// 模拟飞行器句柄
#[derive(Debug, Clone, Default)]
pub struct MockVehicle {
    inner: Arc<Mutex<VehicleInner>>,
}

impl MockVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_inner(inner: VehicleInner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn set_attribute(&self, attribute: Attribute) {
        self.inner
            .lock()
            .attributes
            .insert(attribute.kind(), attribute);
    }

    pub fn remove_attribute(&self, kind: AttributeKind) {
        self.inner.lock().attributes.remove(&kind);
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().connected = connected;
    }

    pub fn reject_operations(&self, reason: Option<&str>) {
        self.inner.lock().reject_reason = reason.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<VehicleCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn connect_count(&self) -> usize {
        self.count(|c| matches!(c, VehicleCall::Connect(_)))
    }

    pub fn count(&self, pred: impl Fn(&VehicleCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn operation(&self, call: VehicleCall) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call.clone());
        if let Some(reason) = &inner.reject_reason {
            return Err(LinkError::Rejected(reason.clone()));
        }
        match call {
            VehicleCall::EnableFollow(follow_type) => {
                let follow_type = follow_type.or_else(|| current_follow_type(&inner));
                inner.attributes.insert(
                    AttributeKind::FollowState,
                    Attribute::FollowState(FollowState::new(FollowStateKind::Start, follow_type)),
                );
            },
            VehicleCall::DisableFollow => {
                let follow_type = current_follow_type(&inner);
                inner.attributes.insert(
                    AttributeKind::FollowState,
                    Attribute::FollowState(FollowState::new(FollowStateKind::End, follow_type)),
                );
            },
            VehicleCall::ChangeMode(mode) => {
                if let Some(Attribute::State(state)) =
                    inner.attributes.get_mut(&AttributeKind::State)
                {
                    state.mode = Some(mode);
                }
            },
            _ => {},
        }
        Ok(())
    }
}

fn current_follow_type(inner: &VehicleInner) -> Option<FollowType> {
    match inner.attributes.get(&AttributeKind::FollowState) {
        Some(Attribute::FollowState(f)) => f.follow_type,
        _ => None,
    }
}

impl VehicleLink for MockVehicle {
    fn read_attribute(&self, kind: AttributeKind) -> Option<Attribute> {
        self.inner.lock().attributes.get(&kind).copied()
    }

    fn start(&mut self) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(VehicleCall::Start);
        inner.started = true;
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.inner.lock().started
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    fn connect(&mut self, parameter: &ConnectionParameter) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(VehicleCall::Connect(parameter.clone()));
        if inner.auto_connect {
            inner.connected = true;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(VehicleCall::Disconnect);
        inner.connected = false;
        Ok(())
    }

    fn enable_follow(&mut self, follow_type: Option<FollowType>) -> Result<(), LinkError> {
        self.operation(VehicleCall::EnableFollow(follow_type))
    }

    fn disable_follow(&mut self) -> Result<(), LinkError> {
        self.operation(VehicleCall::DisableFollow)
    }

    fn pause_at_current_location(&mut self) -> Result<(), LinkError> {
        self.operation(VehicleCall::PauseAtCurrentLocation)
    }

    fn change_mode(&mut self, mode: VehicleMode) -> Result<(), LinkError> {
        self.operation(VehicleCall::ChangeMode(mode))
    }

    fn destroy(&mut self) {
        let mut inner = self.inner.lock();
        inner.calls.push(VehicleCall::Destroy);
        inner.started = false;
        inner.connected = false;
    }
}

// ==================== 飞行器服务 ====================

#[derive(Debug, Default)]
struct ServiceInner {
    bind_count: usize,
    unbind_count: usize,
    fail_bind: bool,
    /// 新句柄的初始状态
    template: VehicleInner,
    vehicles: Vec<MockVehicle>,
}

/// 模拟飞行器服务
#[derive(Debug, Clone, Default)]
pub struct MockVehicleService {
    inner: Arc<Mutex<ServiceInner>>,
}

impl MockVehicleService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新句柄在 connect() 后立即视为已连接
    pub fn with_auto_connect(self) -> Self {
        self.inner.lock().template.auto_connect = true;
        self
    }

    /// 为之后创建的句柄预置属性
    pub fn preset_attribute(&self, attribute: Attribute) {
        self.inner
            .lock()
            .template
            .attributes
            .insert(attribute.kind(), attribute);
    }

    pub fn fail_bind(&self, fail: bool) {
        self.inner.lock().fail_bind = fail;
    }

    pub fn bind_count(&self) -> usize {
        self.inner.lock().bind_count
    }

    pub fn unbind_count(&self) -> usize {
        self.inner.lock().unbind_count
    }

    pub fn vehicles_created(&self) -> usize {
        self.inner.lock().vehicles.len()
    }

    /// 最近创建的句柄（尚未创建时返回一个游离句柄）
    pub fn vehicle(&self) -> MockVehicle {
        self.inner.lock().vehicles.last().cloned().unwrap_or_default()
    }
}

impl VehicleService for MockVehicleService {
    type Vehicle = MockVehicle;

    fn bind(&mut self) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        if inner.fail_bind {
            return Err(LinkError::NotAvailable);
        }
        inner.bind_count += 1;
        Ok(())
    }

    fn unbind(&mut self) {
        self.inner.lock().unbind_count += 1;
    }

    fn create_vehicle(&mut self) -> MockVehicle {
        let mut inner = self.inner.lock();
        let mut state = inner.template.clone();
        state.calls.clear();
        let vehicle = MockVehicle::from_inner(state);
        inner.vehicles.push(vehicle.clone());
        vehicle
    }
}

// ==================== 伴侣设备 ====================

#[derive(Debug, Default)]
struct PeripheralInner {
    acks: Vec<u8>,
    sent: Vec<Dictionary>,
    launches: usize,
    fail_send: bool,
}

/// 模拟伴侣设备通道
#[derive(Debug, Clone, Default)]
pub struct MockPeripheral {
    inner: Arc<Mutex<PeripheralInner>>,
}

impl MockPeripheral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acks(&self) -> Vec<u8> {
        self.inner.lock().acks.clone()
    }

    pub fn sent(&self) -> Vec<Dictionary> {
        self.inner.lock().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.inner.lock().sent.len()
    }

    pub fn launches(&self) -> usize {
        self.inner.lock().launches
    }

    pub fn fail_send(&self, fail: bool) {
        self.inner.lock().fail_send = fail;
    }
}

impl PeripheralChannel for MockPeripheral {
    fn send_ack(&mut self, transaction_id: u8) -> Result<(), LinkError> {
        self.inner.lock().acks.push(transaction_id);
        Ok(())
    }

    fn send_data(&mut self, data: &Dictionary) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        if inner.fail_send {
            return Err(LinkError::Io("watch not reachable".to_string()));
        }
        inner.sent.push(data.clone());
        Ok(())
    }

    fn launch_app(&mut self) -> Result<(), LinkError> {
        self.inner.lock().launches += 1;
        Ok(())
    }
}

// ==================== 宿主 / 提示 ====================

#[derive(Debug, Default)]
struct HostInner {
    starts: Vec<String>,
    stops: usize,
}

/// 模拟宿主前台状态
#[derive(Debug, Clone, Default)]
pub struct MockHostStatus {
    inner: Arc<Mutex<HostInner>>,
}

impl MockHostStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_count(&self) -> usize {
        self.inner.lock().starts.len()
    }

    pub fn stop_count(&self) -> usize {
        self.inner.lock().stops
    }

    pub fn titles(&self) -> Vec<String> {
        self.inner.lock().starts.clone()
    }
}

impl HostStatus for MockHostStatus {
    fn start_foreground(&mut self, title: &str) {
        self.inner.lock().starts.push(title.to_string());
    }

    fn stop_foreground(&mut self) {
        self.inner.lock().stops += 1;
    }
}

/// 模拟用户提示
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl UserNotifier for MockNotifier {
    fn notify(&mut self, text: &str) {
        self.messages.lock().push(text.to_string());
    }
}
