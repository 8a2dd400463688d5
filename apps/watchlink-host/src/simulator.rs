//! 模拟飞行器服务
//!
//! 没有真实飞控时使用：绑定立即完成，connect 立即成功，遥测由一个后台
//! 线程按固定频率加噪声更新，并以 `RelayEvent` 的形式投递给中继。
//!
//! 所有回调都通过 `try_post` 投递：绑定/连接发生在中继线程上，阻塞投递
//! 可能在队列满时自锁。

use parking_lot::Mutex;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use watchlink_relay::{
    Altitude, Attribute, AttributeKind, Battery, ConnectionParameter, FollowState,
    FollowStateKind, FollowType, GuidedState, LinkError, RelayEvent, RelayHandle, Speed,
    VehicleEvent, VehicleLink, VehicleMode, VehicleService, VehicleState,
};

/// 中继句柄在中继线程启动后才存在，这里延迟注入
pub type EventSink = Arc<OnceLock<RelayHandle>>;

fn post(sink: &EventSink, event: RelayEvent) {
    let Some(handle) = sink.get() else {
        debug!("Relay not running, dropping {:?}", event);
        return;
    };
    if let Err(e) = handle.try_post(event) {
        warn!("Simulator event dropped: {}", e);
    }
}

#[derive(Debug, Clone)]
struct SimState {
    started: bool,
    connected: bool,
    armed: bool,
    mode: VehicleMode,
    follow: FollowState,
    guided_idle: bool,
    voltage: f64,
    air_speed: f64,
    altitude: f64,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            started: false,
            connected: false,
            armed: true,
            mode: VehicleMode::Loiter,
            follow: FollowState::new(FollowStateKind::End, Some(FollowType::Leash)),
            guided_idle: false,
            voltage: 12.6,
            air_speed: 0.0,
            altitude: 20.0,
        }
    }
}

/// 模拟飞行器服务
pub struct SimulatedService {
    sink: EventSink,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedService {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// 启动遥测发生器线程
    pub fn spawn_telemetry(&self, rate_hz: f64, running: Arc<AtomicBool>) -> JoinHandle<()> {
        let state = self.state.clone();
        let sink = self.sink.clone();
        let period = Duration::from_secs_f64(1.0 / rate_hz);

        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let mut tick: u64 = 0;
            while running.load(Ordering::Acquire) {
                thread::sleep(period);
                let event = {
                    let mut s = state.lock();
                    if !s.connected {
                        continue;
                    }
                    s.air_speed = (s.air_speed + rng.gen_range(-0.4..0.4)).clamp(0.0, 15.0);
                    s.altitude = (s.altitude + rng.gen_range(-0.5..0.5)).max(0.0);
                    s.voltage = (s.voltage - rng.gen_range(0.0..0.01)).max(9.0);
                    if tick % 2 == 0 {
                        VehicleEvent::SpeedUpdated
                    } else {
                        VehicleEvent::BatteryUpdated
                    }
                };
                tick += 1;
                post(&sink, RelayEvent::Vehicle(event));
            }
            debug!("Telemetry generator stopped");
        })
    }
}

impl VehicleService for SimulatedService {
    type Vehicle = SimulatedVehicle;

    fn bind(&mut self) -> Result<(), LinkError> {
        info!("Simulated vehicle service bound");
        post(&self.sink, RelayEvent::ServiceConnected);
        Ok(())
    }

    fn unbind(&mut self) {
        info!("Simulated vehicle service unbound");
    }

    fn create_vehicle(&mut self) -> SimulatedVehicle {
        SimulatedVehicle {
            sink: self.sink.clone(),
            state: self.state.clone(),
            live: true,
        }
    }
}

/// 模拟飞行器句柄
pub struct SimulatedVehicle {
    sink: EventSink,
    state: Arc<Mutex<SimState>>,
    live: bool,
}

impl SimulatedVehicle {
    fn ensure_live(&self) -> Result<(), LinkError> {
        if self.live && self.state.lock().connected {
            Ok(())
        } else {
            Err(LinkError::NotAvailable)
        }
    }

    fn set_follow(&self, kind: FollowStateKind, follow_type: Option<FollowType>) {
        {
            let mut s = self.state.lock();
            s.follow = FollowState::new(kind, follow_type.or(s.follow.follow_type));
        }
        let event = match kind {
            FollowStateKind::Start | FollowStateKind::Running => VehicleEvent::FollowStarted,
            _ => VehicleEvent::FollowStopped,
        };
        post(&self.sink, RelayEvent::Vehicle(event));
    }
}

impl VehicleLink for SimulatedVehicle {
    fn read_attribute(&self, kind: AttributeKind) -> Option<Attribute> {
        if !self.live {
            return None;
        }
        let s = self.state.lock();
        let attribute = match kind {
            AttributeKind::State => Attribute::State(VehicleState {
                armed: s.armed,
                connected: s.connected,
                mode: Some(s.mode),
            }),
            AttributeKind::FollowState => Attribute::FollowState(s.follow),
            AttributeKind::GuidedState => Attribute::GuidedState(GuidedState {
                idle: s.guided_idle,
            }),
            AttributeKind::Battery => Attribute::Battery(Battery {
                voltage: Some(s.voltage),
            }),
            AttributeKind::Speed => Attribute::Speed(Speed {
                air_speed: s.air_speed,
            }),
            AttributeKind::Altitude => Attribute::Altitude(Altitude {
                altitude: s.altitude,
            }),
        };
        Some(attribute)
    }

    fn start(&mut self) -> Result<(), LinkError> {
        self.state.lock().started = true;
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.live && self.state.lock().started
    }

    fn is_connected(&self) -> bool {
        self.live && self.state.lock().connected
    }

    fn connect(&mut self, parameter: &ConnectionParameter) -> Result<(), LinkError> {
        if !self.live {
            return Err(LinkError::NotAvailable);
        }
        info!(
            "Simulated vehicle connecting over {:?} at {} Hz",
            parameter.link, parameter.stream_rate_hz
        );
        self.state.lock().connected = true;
        post(&self.sink, RelayEvent::Vehicle(VehicleEvent::Connected));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        let was_connected = std::mem::replace(&mut self.state.lock().connected, false);
        if was_connected {
            post(&self.sink, RelayEvent::Vehicle(VehicleEvent::Disconnected));
        }
        Ok(())
    }

    fn enable_follow(&mut self, follow_type: Option<FollowType>) -> Result<(), LinkError> {
        self.ensure_live()?;
        if !self.state.lock().armed {
            self.set_follow(FollowStateKind::DroneNotArmed, follow_type);
            return Err(LinkError::Rejected("vehicle not armed".to_string()));
        }
        self.set_follow(FollowStateKind::Start, follow_type);
        Ok(())
    }

    fn disable_follow(&mut self) -> Result<(), LinkError> {
        self.ensure_live()?;
        self.set_follow(FollowStateKind::End, None);
        Ok(())
    }

    fn pause_at_current_location(&mut self) -> Result<(), LinkError> {
        self.ensure_live()?;
        {
            let mut s = self.state.lock();
            s.mode = VehicleMode::Guided;
            s.guided_idle = true;
            s.follow.kind = FollowStateKind::End;
        }
        post(&self.sink, RelayEvent::Vehicle(VehicleEvent::ModeChanged));
        Ok(())
    }

    fn change_mode(&mut self, mode: VehicleMode) -> Result<(), LinkError> {
        self.ensure_live()?;
        {
            let mut s = self.state.lock();
            s.mode = mode;
            s.guided_idle = false;
        }
        post(&self.sink, RelayEvent::Vehicle(VehicleEvent::ModeChanged));
        Ok(())
    }

    fn destroy(&mut self) {
        self.live = false;
        let mut s = self.state.lock();
        s.started = false;
        s.connected = false;
    }
}
