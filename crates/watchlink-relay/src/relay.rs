//! 中继核心
//!
//! [`Relay`] 持有会话的全部可变状态（连接管理器、伴侣设备通道、限流器、编码器、
//! 提示器、指标），所有修改都经由 [`Relay::process`] 串行进入。
//!
//! ```text
//! VehicleEvent ──> router ──(RateLimiter)──> TelemetryEncoder ──> PeripheralChannel
//! InboundMessage ──> ACK ──> ensure_connected ──> dispatcher ──> VehicleLink
//! ```
//!
//! 路由和分派中的错误在这里被记录并吞掉（`warn!` + `errors_suppressed`），
//! 单个异常事件不会终止会话。

use crate::config::RelayConfig;
use crate::dispatcher::{self, DispatchOutcome};
use crate::error::RelayError;
use crate::lifecycle::{ConnectionManager, ConnectionPhase};
use crate::link::{HostStatus, PeripheralChannel, UserNotifier, VehicleLink, VehicleService};
use crate::metrics::RelayMetrics;
use crate::rate_limiter::{RateLimiter, SendPriority};
use crate::router::{self, RouteAction};
use crate::snapshot::VehicleSnapshot;
use crate::telemetry::TelemetryEncoder;
use crate::vehicle::{Attribute, AttributeKind, VehicleEvent};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use watchlink_protocol::InboundMessage;

/// 进入中继的事件
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// 飞行器生命周期事件
    Vehicle(VehicleEvent),
    /// 伴侣设备上行消息
    Inbound(InboundMessage),
    /// 飞行器服务绑定完成
    ServiceConnected,
    /// 飞行器服务意外中断
    ServiceInterrupted(String),
    /// 飞行器连接失败
    ConnectionFailed(String),
    /// 结束会话并停止中继
    Shutdown,
}

/// 中继核心
pub struct Relay<S, P, H, N>
where
    S: VehicleService,
    P: PeripheralChannel,
    H: HostStatus,
    N: UserNotifier,
{
    connection: ConnectionManager<S, H>,
    peripheral: P,
    notifier: N,
    limiter: RateLimiter,
    encoder: TelemetryEncoder,
    metrics: Arc<RelayMetrics>,
}

impl<S, P, H, N> Relay<S, P, H, N>
where
    S: VehicleService,
    P: PeripheralChannel,
    H: HostStatus,
    N: UserNotifier,
{
    /// 创建中继（校验配置）
    pub fn new(
        config: &RelayConfig,
        service: S,
        peripheral: P,
        host: H,
        notifier: N,
    ) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self {
            connection: ConnectionManager::new(
                service,
                host,
                config.transport.clone(),
                config.foreground_title.clone(),
            ),
            peripheral,
            notifier,
            limiter: RateLimiter::new(config.telemetry_interval()),
            encoder: TelemetryEncoder::new(config.battery_display),
            metrics: Arc::new(RelayMetrics::new()),
        })
    }

    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    pub fn connection(&self) -> &ConnectionManager<S, H> {
        &self.connection
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.connection.phase()
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// 处理一个事件
    ///
    /// 返回 `ControlFlow::Break(())` 表示收到 [`RelayEvent::Shutdown`]，会话已拆除。
    pub fn process(&mut self, event: RelayEvent, now: Instant) -> ControlFlow<()> {
        match event {
            RelayEvent::Vehicle(event) => self.handle_vehicle_event(event, now),
            RelayEvent::Inbound(message) => self.handle_inbound(message),
            RelayEvent::ServiceConnected => {
                info!("Vehicle service connected");
                if let Err(e) = self.connection.on_service_connected() {
                    self.suppress("service connected", &e);
                }
            },
            RelayEvent::ServiceInterrupted(reason) => {
                warn!("Vehicle service interrupted: {}", reason);
                self.connection.on_service_interrupted();
            },
            RelayEvent::ConnectionFailed(reason) => {
                self.connection.on_connection_failed(&reason);
            },
            RelayEvent::Shutdown => {
                info!("Relay shutdown requested");
                self.teardown();
                return ControlFlow::Break(());
            },
        }
        ControlFlow::Continue(())
    }

    /// 请求发送一次遥测
    ///
    /// 返回是否真正发送了消息。被限流或数据缺失时返回 `Ok(false)`，
    /// 只有发送成功才会推进限流窗口。
    pub fn request_send(
        &mut self,
        priority: SendPriority,
        now: Instant,
    ) -> Result<bool, RelayError> {
        if !self.limiter.permits(now, priority) {
            trace!("Telemetry send throttled");
            RelayMetrics::incr(&self.metrics.telemetry_throttled);
            return Ok(false);
        }

        let vehicle = self.connection.vehicle().ok_or(RelayError::NoVehicle)?;
        let snapshot = VehicleSnapshot::read(vehicle);
        let message = match self.encoder.encode(&snapshot) {
            Ok(message) => message,
            Err(e) if e.is_missing_data() => {
                trace!("Telemetry send skipped: {}", e);
                RelayMetrics::incr(&self.metrics.telemetry_skipped);
                return Ok(false);
            },
            Err(e) => return Err(e),
        };

        self.peripheral.send_data(&message.to_dictionary())?;
        self.limiter.record_sent(now);
        RelayMetrics::incr(&self.metrics.telemetry_sent);
        trace!("Telemetry sent: mode={}", message.mode_label);
        Ok(true)
    }

    /// 完整拆除当前会话（幂等）
    ///
    /// 限流窗口跨会话保留。
    pub fn teardown(&mut self) {
        self.connection.teardown();
    }

    // ==================== 事件路由 ====================

    fn handle_vehicle_event(&mut self, event: VehicleEvent, now: Instant) {
        debug!("Vehicle event: {:?}", event);
        if let Err(e) = self.route_vehicle_event(event, now) {
            self.suppress("vehicle event", &e);
        }
    }

    fn route_vehicle_event(&mut self, event: VehicleEvent, now: Instant) -> Result<(), RelayError> {
        let action = router::route(event);

        // 拆除之后迟到的回调：没有存活句柄，只有拆除本身是安全的
        if !self.connection.has_vehicle() && action != RouteAction::Teardown {
            debug!("Ignoring {:?}: no live vehicle handle", event);
            return Ok(());
        }

        match action {
            RouteAction::Teardown => {
                self.teardown();
                Ok(())
            },
            RouteAction::LaunchApp => {
                info!("Vehicle connected, launching companion app");
                self.peripheral.launch_app()?;
                Ok(())
            },
            RouteAction::Send {
                priority,
                notify_follow,
            } => {
                let sent = self.request_send(priority, now);
                if notify_follow {
                    self.notify_follow_status();
                }
                sent.map(|_| ())
            },
        }
    }

    fn notify_follow_status(&mut self) {
        let follow = self
            .connection
            .vehicle()
            .and_then(|v| v.read_attribute(AttributeKind::FollowState))
            .and_then(|attribute| match attribute {
                Attribute::FollowState(follow) => Some(follow),
                _ => None,
            });
        if let Some(text) = router::follow_status_text(follow) {
            self.notifier.notify(&text);
        }
    }

    // ==================== 指令分派 ====================

    fn handle_inbound(&mut self, message: InboundMessage) {
        match self.peripheral.send_ack(message.transaction_id) {
            Ok(()) => RelayMetrics::incr(&self.metrics.acks_sent),
            Err(e) => self.suppress("ack", &RelayError::from(e)),
        }

        if let Err(e) = self.connection.ensure_connected() {
            self.suppress("connect on demand", &e);
        }

        let Some(vehicle) = self.connection.connected_vehicle_mut() else {
            debug!(
                "Request {} ignored: vehicle not connected",
                message.transaction_id
            );
            RelayMetrics::incr(&self.metrics.commands_ignored);
            return;
        };

        let code = match message.request_code() {
            Ok(code) => code,
            Err(e) => {
                debug!("Request {} ignored: {}", message.transaction_id, e);
                RelayMetrics::incr(&self.metrics.commands_ignored);
                return;
            },
        };

        match dispatcher::dispatch(vehicle, code) {
            Ok(DispatchOutcome::TeardownRequested) => {
                info!("Disconnect requested by companion");
                self.teardown();
                RelayMetrics::incr(&self.metrics.commands_dispatched);
            },
            Ok(outcome) => {
                debug!("Request {:?} dispatched: {:?}", code, outcome);
                RelayMetrics::incr(&self.metrics.commands_dispatched);
            },
            Err(e) => self.suppress("command dispatch", &e),
        }
    }

    fn suppress(&self, context: &str, error: &RelayError) {
        warn!("Error suppressed while handling {}: {}", context, error);
        RelayMetrics::incr(&self.metrics.errors_suppressed);
    }
}
