//! 中继运行时
//!
//! 把 [`Relay`] 放进一个独立线程，由有界 `crossbeam-channel` 喂入事件。
//! 所有协作者回调（飞行器事件、上行消息、服务回调）都通过 [`RelayHandle`]
//! 投递到同一个线程，保证会话状态只在一个执行上下文中被修改。
//!
//! # Example
//!
//! ```
//! use watchlink_relay::mock::{MockHostStatus, MockNotifier, MockPeripheral, MockVehicleService};
//! use watchlink_relay::{Relay, RelayConfig, RelayEvent, spawn_relay};
//! use watchlink_protocol::InboundMessage;
//!
//! let config = RelayConfig::default();
//! let relay = Relay::new(
//!     &config,
//!     MockVehicleService::new(),
//!     MockPeripheral::new(),
//!     MockHostStatus::new(),
//!     MockNotifier::new(),
//! )
//! .unwrap();
//!
//! let runtime = spawn_relay(relay, config.channel_capacity).unwrap();
//! runtime
//!     .handle()
//!     .post(RelayEvent::Inbound(InboundMessage::request(1, 105)))
//!     .unwrap();
//! runtime.shutdown().unwrap();
//! ```

use crate::error::RelayError;
use crate::link::{HostStatus, PeripheralChannel, UserNotifier, VehicleService};
use crate::metrics::RelayMetrics;
use crate::relay::{Relay, RelayEvent};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info};

/// 中继线程名
pub const RELAY_THREAD_NAME: &str = "watchlink-relay";

/// 事件投递句柄
///
/// 可以跨线程克隆；中继线程退出后所有投递返回 [`RelayError::ChannelClosed`]。
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: Sender<RelayEvent>,
}

impl RelayHandle {
    /// 投递事件（队列满时阻塞）
    pub fn post(&self, event: RelayEvent) -> Result<(), RelayError> {
        self.tx.send(event).map_err(|_| RelayError::ChannelClosed)
    }

    /// 投递事件（不阻塞）
    ///
    /// # 错误
    /// - `RelayError::ChannelFull`: 队列已满，事件被丢弃
    /// - `RelayError::ChannelClosed`: 中继线程已退出
    pub fn try_post(&self, event: RelayEvent) -> Result<(), RelayError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RelayError::ChannelFull),
            Err(TrySendError::Disconnected(_)) => Err(RelayError::ChannelClosed),
        }
    }
}

/// 运行中的中继
///
/// Drop 时投递 `Shutdown` 并等待线程退出。
pub struct RelayRuntime {
    handle: RelayHandle,
    metrics: Arc<RelayMetrics>,
    thread: Option<JoinHandle<()>>,
}

impl RelayRuntime {
    pub fn handle(&self) -> RelayHandle {
        self.handle.clone()
    }

    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// 拆除会话，停止中继线程并等待其退出
    pub fn shutdown(mut self) -> Result<(), RelayError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), RelayError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // 线程可能已经因 Shutdown 退出，此时通道已关闭
        let _ = self.handle.post(RelayEvent::Shutdown);
        thread
            .join()
            .map_err(|_| RelayError::Thread("relay thread panicked".to_string()))
    }
}

impl Drop for RelayRuntime {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop relay: {}", e);
        }
    }
}

/// 在独立线程中启动中继
///
/// `capacity` 为事件队列容量（至少为 1）。
pub fn spawn_relay<S, P, H, N>(
    relay: Relay<S, P, H, N>,
    capacity: usize,
) -> Result<RelayRuntime, RelayError>
where
    S: VehicleService,
    P: PeripheralChannel,
    H: HostStatus,
    N: UserNotifier,
    Relay<S, P, H, N>: Send + 'static,
{
    let (tx, rx) = bounded(capacity.max(1));
    let metrics = relay.metrics().clone();

    let thread = thread::Builder::new()
        .name(RELAY_THREAD_NAME.to_string())
        .spawn(move || relay_loop(relay, rx))
        .map_err(|e| RelayError::Thread(e.to_string()))?;

    Ok(RelayRuntime {
        handle: RelayHandle { tx },
        metrics,
        thread: Some(thread),
    })
}

fn relay_loop<S, P, H, N>(mut relay: Relay<S, P, H, N>, rx: Receiver<RelayEvent>)
where
    S: VehicleService,
    P: PeripheralChannel,
    H: HostStatus,
    N: UserNotifier,
{
    info!("Relay thread started");
    loop {
        let Ok(event) = rx.recv() else {
            // 所有句柄都已释放
            debug!("Relay channel disconnected");
            relay.teardown();
            break;
        };
        if relay.process(event, Instant::now()).is_break() {
            break;
        }
    }
    let metrics = relay.metrics().snapshot();
    info!(
        "Relay thread stopped: sent={}, throttled={}, acks={}, dispatched={}",
        metrics.telemetry_sent,
        metrics.telemetry_throttled,
        metrics.acks_sent,
        metrics.commands_dispatched
    );
}
