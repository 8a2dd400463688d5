//! 上行指令分派集成测试
//!
//! 通过 `Relay::process` 驱动完整路径：ACK → 按需连接 → 分派 → 飞行器调用。

use std::time::Instant;
use watchlink_protocol::{InboundMessage, RequestCode};
use watchlink_relay::mock::{
    MockHostStatus, MockNotifier, MockPeripheral, MockVehicleService, VehicleCall,
};
use watchlink_relay::{
    Attribute, ConnectionPhase, FollowState, FollowStateKind, FollowType, Relay, RelayConfig,
    RelayEvent,
};

type TestRelay = Relay<MockVehicleService, MockPeripheral, MockHostStatus, MockNotifier>;

struct Fixture {
    relay: TestRelay,
    service: MockVehicleService,
    peripheral: MockPeripheral,
    host: MockHostStatus,
}

fn fixture() -> Fixture {
    let service = MockVehicleService::new().with_auto_connect();
    let peripheral = MockPeripheral::new();
    let host = MockHostStatus::new();
    let relay = Relay::new(
        &RelayConfig::default(),
        service.clone(),
        peripheral.clone(),
        host.clone(),
        MockNotifier::new(),
    )
    .unwrap();
    Fixture {
        relay,
        service,
        peripheral,
        host,
    }
}

fn request(tid: u8, code: RequestCode) -> RelayEvent {
    RelayEvent::Inbound(InboundMessage::request(tid, code.code()))
}

impl Fixture {
    fn process(&mut self, event: RelayEvent) {
        let _ = self.relay.process(event, Instant::now());
    }

    fn connect_with_follow(&mut self, kind: FollowStateKind, follow_type: Option<FollowType>) {
        self.process(request(0, RequestCode::Connect));
        self.process(RelayEvent::ServiceConnected);
        assert_eq!(self.relay.phase(), ConnectionPhase::Connected);

        let vehicle = self.service.vehicle();
        vehicle.set_attribute(Attribute::FollowState(FollowState::new(kind, follow_type)));
        vehicle.clear_calls();
    }
}

#[test]
fn test_disconnect_while_disconnected_acks_without_fault() {
    let mut f = fixture();
    f.process(request(42, RequestCode::Disconnect));

    assert_eq!(f.peripheral.acks(), vec![42]);
    assert!(f.service.vehicle().calls().is_empty());
    assert_eq!(f.relay.metrics().snapshot().errors_suppressed, 0);
    assert_eq!(f.relay.metrics().snapshot().commands_dispatched, 0);

    // 再次断开和拆除都是安全的
    f.process(request(43, RequestCode::Disconnect));
    f.relay.teardown();
    f.relay.teardown();
    assert_eq!(f.peripheral.acks(), vec![42, 43]);
    assert_eq!(f.relay.phase(), ConnectionPhase::Idle);
    assert_eq!(f.host.stop_count(), 1);
}

#[test]
fn test_toggle_while_enabled_disables_exactly_once() {
    let mut f = fixture();
    f.connect_with_follow(FollowStateKind::Running, Some(FollowType::Left));

    f.process(request(1, RequestCode::ModeFollow));

    let calls = f.service.vehicle().calls();
    assert_eq!(calls, vec![VehicleCall::DisableFollow]);
    assert!(
        !calls
            .iter()
            .any(|c| matches!(c, VehicleCall::EnableFollow(_)))
    );
}

#[test]
fn test_toggle_twice_restores_previous_type() {
    let mut f = fixture();
    f.connect_with_follow(FollowStateKind::Running, Some(FollowType::Left));

    f.process(request(1, RequestCode::ModeFollow));
    f.process(request(2, RequestCode::ModeFollow));

    assert_eq!(
        f.service.vehicle().calls(),
        vec![
            VehicleCall::DisableFollow,
            VehicleCall::EnableFollow(Some(FollowType::Left))
        ]
    );
}

#[test]
fn test_cycle_follow_type_walks_full_order_and_wraps() {
    let mut f = fixture();
    f.connect_with_follow(FollowStateKind::End, Some(FollowType::Circle));

    for tid in 1..=3 {
        f.process(request(tid, RequestCode::CycleFollowType));
    }

    assert_eq!(
        f.service.vehicle().calls(),
        vec![
            VehicleCall::EnableFollow(Some(FollowType::Above)),
            VehicleCall::EnableFollow(Some(FollowType::Leash)),
            VehicleCall::EnableFollow(Some(FollowType::Lead)),
        ]
    );
}

#[test]
fn test_cycle_without_current_type_starts_at_first() {
    let mut f = fixture();
    f.connect_with_follow(FollowStateKind::End, None);

    f.process(request(1, RequestCode::CycleFollowType));

    assert_eq!(
        f.service.vehicle().calls(),
        vec![VehicleCall::EnableFollow(Some(FollowType::Leash))]
    );
}

#[test]
fn test_connect_on_demand_then_command_runs_once_connected() {
    let mut f = fixture();

    // 未连接：只发起绑定，不执行操作
    f.process(request(1, RequestCode::Pause));
    assert_eq!(f.relay.phase(), ConnectionPhase::Connecting);
    assert!(f.service.vehicle().calls().is_empty());

    // 绑定完成后自动连接
    f.process(RelayEvent::ServiceConnected);
    assert_eq!(f.relay.phase(), ConnectionPhase::Connected);
    f.service.vehicle().clear_calls();

    f.process(request(2, RequestCode::Pause));
    assert_eq!(
        f.service.vehicle().calls(),
        vec![VehicleCall::PauseAtCurrentLocation]
    );
    assert_eq!(f.peripheral.acks(), vec![1, 2]);
}

#[test]
fn test_connection_failure_retries_on_next_command() {
    let service = MockVehicleService::new();
    let mut relay = Relay::new(
        &RelayConfig::default(),
        service.clone(),
        MockPeripheral::new(),
        MockHostStatus::new(),
        MockNotifier::new(),
    )
    .unwrap();
    let now = Instant::now();

    let _ = relay.process(request(1, RequestCode::Connect), now);
    let _ = relay.process(RelayEvent::ServiceConnected, now);
    assert_eq!(service.vehicle().connect_count(), 1);

    let _ = relay.process(RelayEvent::ConnectionFailed("timeout".into()), now);
    let _ = relay.process(request(2, RequestCode::Connect), now);
    assert_eq!(service.vehicle().connect_count(), 2);
    assert_eq!(relay.phase(), ConnectionPhase::Connecting);
}

#[test]
fn test_unknown_code_is_acked_and_ignored() {
    let mut f = fixture();
    f.connect_with_follow(FollowStateKind::End, None);

    f.process(RelayEvent::Inbound(InboundMessage::request(9, 107)));
    f.process(RelayEvent::Inbound(InboundMessage::request(10, -1)));

    assert_eq!(f.peripheral.acks(), vec![0, 9, 10]);
    assert!(f.service.vehicle().calls().is_empty());
    assert_eq!(f.relay.metrics().snapshot().errors_suppressed, 0);
}

#[test]
fn test_disconnect_request_releases_everything() {
    let mut f = fixture();
    f.connect_with_follow(FollowStateKind::Running, Some(FollowType::Lead));

    f.process(request(1, RequestCode::Disconnect));

    assert_eq!(f.relay.phase(), ConnectionPhase::Idle);
    assert_eq!(f.service.vehicle().calls(), vec![VehicleCall::Disconnect]);
    assert_eq!(f.service.unbind_count(), 1);
    assert_eq!(f.host.stop_count(), 1);

    // 之后的请求重新走按需连接，创建新的句柄
    f.process(request(2, RequestCode::Connect));
    assert_eq!(f.service.vehicles_created(), 2);
    assert_eq!(f.host.start_count(), 2);
}
