//! 连接生命周期管理
//!
//! 持有唯一的飞行器服务绑定和唯一的飞行器句柄，以及宿主进程前台状态。
//!
//! # 状态机
//!
//! ```text
//!            ensure_connected()            is_connected()
//!   Idle ─────────────────────> Connecting ─────────────> Connected
//!    ^                              │                         │
//!    └──────────── teardown() ──────┴─────────────────────────┘
//! ```
//!
//! 阶段由句柄推导而来，不单独存储：没有句柄即 `Idle`，句柄已连接即 `Connected`，
//! 其余为 `Connecting`。任何时刻最多只存在一个句柄，只有在 `vehicle` 为空时才会
//! 创建新句柄。

use crate::config::ConnectionParameter;
use crate::error::RelayError;
use crate::link::{HostStatus, VehicleLink, VehicleService};
use tracing::{debug, info, warn};

/// 连接阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// 没有飞行器句柄
    #[default]
    Idle,
    /// 句柄已创建，尚未连接
    Connecting,
    /// 已连接
    Connected,
}

impl ConnectionPhase {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// 连接生命周期管理器
pub struct ConnectionManager<S: VehicleService, H: HostStatus> {
    service: S,
    host: H,
    parameter: ConnectionParameter,
    foreground_title: String,
    /// 已发起服务绑定
    bind_requested: bool,
    /// 服务已回报绑定完成
    service_ready: bool,
    vehicle: Option<S::Vehicle>,
    /// 已对当前句柄发出 connect 请求
    connect_requested: bool,
    foreground: bool,
}

impl<S: VehicleService, H: HostStatus> ConnectionManager<S, H> {
    pub fn new(
        service: S,
        host: H,
        parameter: ConnectionParameter,
        foreground_title: impl Into<String>,
    ) -> Self {
        Self {
            service,
            host,
            parameter,
            foreground_title: foreground_title.into(),
            bind_requested: false,
            service_ready: false,
            vehicle: None,
            connect_requested: false,
            foreground: false,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        match &self.vehicle {
            None => ConnectionPhase::Idle,
            Some(v) if v.is_connected() => ConnectionPhase::Connected,
            Some(_) => ConnectionPhase::Connecting,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.phase().is_connected()
    }

    pub fn is_started(&self) -> bool {
        self.vehicle.as_ref().is_some_and(|v| v.is_started())
    }

    pub fn is_bound(&self) -> bool {
        self.bind_requested
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn has_vehicle(&self) -> bool {
        self.vehicle.is_some()
    }

    pub fn vehicle(&self) -> Option<&S::Vehicle> {
        self.vehicle.as_ref()
    }

    /// 仅在已连接时返回句柄
    pub fn connected_vehicle_mut(&mut self) -> Option<&mut S::Vehicle> {
        self.vehicle.as_mut().filter(|v| v.is_connected())
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn parameter(&self) -> &ConnectionParameter {
        &self.parameter
    }

    /// 确保服务已绑定、句柄已创建、前台状态已申请
    ///
    /// 幂等：已绑定/已有句柄/已在前台时对应步骤为空操作。
    pub fn ensure_service_bound(&mut self) -> Result<(), RelayError> {
        if !self.bind_requested {
            self.service.bind()?;
            self.bind_requested = true;
            info!("Vehicle service bind requested");
        }

        if self.vehicle.is_none() {
            self.vehicle = Some(self.service.create_vehicle());
            self.connect_requested = false;
            debug!("Vehicle handle created");
        }

        if !self.foreground {
            self.host.start_foreground(&self.foreground_title);
            self.foreground = true;
        }

        Ok(())
    }

    /// 按需连接（不阻塞）
    ///
    /// 已连接时为空操作。服务尚未就绪时只做绑定，真正的 connect 在
    /// [`Self::on_service_connected`] 中发出。
    pub fn ensure_connected(&mut self) -> Result<(), RelayError> {
        if self.is_connected() {
            return Ok(());
        }
        self.ensure_service_bound()?;
        if self.service_ready && !self.connect_requested {
            self.request_connect()?;
        }
        Ok(())
    }

    /// 服务绑定完成回调：启动句柄并发起连接
    ///
    /// 拆除之后到达的迟到回调（没有句柄）直接忽略。
    pub fn on_service_connected(&mut self) -> Result<(), RelayError> {
        if !self.bind_requested {
            debug!("Ignoring service-connected callback: no binding requested");
            return Ok(());
        }
        self.service_ready = true;
        if self.vehicle.is_none() {
            debug!("Ignoring service-connected callback: no live vehicle handle");
            return Ok(());
        }
        self.request_connect()
    }

    /// 连接失败回调：允许下一次按需连接重新发起
    pub fn on_connection_failed(&mut self, reason: &str) {
        warn!("Vehicle connection failed: {}", reason);
        self.connect_requested = false;
    }

    /// 服务中断回调：销毁并释放句柄，解除绑定
    ///
    /// 前台状态保留到 [`Self::teardown`]。
    pub fn on_service_interrupted(&mut self) {
        if let Some(mut vehicle) = self.vehicle.take() {
            vehicle.destroy();
            info!("Vehicle handle destroyed after service interruption");
        }
        if self.bind_requested {
            self.service.unbind();
            self.bind_requested = false;
        }
        self.service_ready = false;
        self.connect_requested = false;
    }

    /// 完整拆除
    ///
    /// 任何状态下都可以调用，调用后回到 `Idle`；重复调用是安全的。
    /// 返回是否实际释放了资源。
    pub fn teardown(&mut self) -> bool {
        let mut released = false;

        if let Some(mut vehicle) = self.vehicle.take() {
            if let Err(e) = vehicle.disconnect() {
                warn!("Vehicle disconnect failed during teardown: {}", e);
            }
            released = true;
        }

        if self.bind_requested {
            self.service.unbind();
            self.bind_requested = false;
            released = true;
        }

        if self.foreground {
            self.host.stop_foreground();
            self.foreground = false;
            released = true;
        }

        self.service_ready = false;
        self.connect_requested = false;

        if released {
            info!("Session torn down");
        }
        released
    }

    fn request_connect(&mut self) -> Result<(), RelayError> {
        let vehicle = self.vehicle.as_mut().ok_or(RelayError::NoVehicle)?;
        if !vehicle.is_started() {
            vehicle.start()?;
        }
        if !vehicle.is_connected() {
            vehicle.connect(&self.parameter)?;
            info!("Vehicle connect requested: {:?}", self.parameter.link);
        }
        self.connect_requested = true;
        Ok(())
    }
}
