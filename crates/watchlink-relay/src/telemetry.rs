//! 遥测编码器
//!
//! 把稀疏的 [`VehicleSnapshot`] 映射为固定结构的 [`TelemetryMessage`]。
//! 必需字段缺失时返回 [`RelayError::MissingData`]，绝不产生部分消息。

use crate::config::BatteryDisplay;
use crate::error::RelayError;
use crate::snapshot::VehicleSnapshot;
use crate::vehicle::AttributeKind;
use watchlink_protocol::{FOLLOW_TYPE_NONE, TelemetryMessage};

/// 模式标签覆盖值
pub const LABEL_DISARMED: &str = "Disarmed";
pub const LABEL_FOLLOW: &str = "Follow";
pub const LABEL_PAUSED: &str = "Paused";

/// 四舍五入到一位小数（半数向上取整）
///
/// 等价于 `floor(v * 10 + 0.5) / 10`：`0.05 → 0.1`，`-0.05 → 0.0`，`-0.15 → -0.1`。
/// 结果中的 `-0.0` 归一化为 `0.0`，避免显示 `"-0.0"`。
pub fn round_to_one_decimal(value: f64) -> f64 {
    ((value * 10.0 + 0.5).floor() / 10.0) + 0.0
}

/// 格式化为一位小数（`50.0`、`3.3`）
fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", round_to_one_decimal(value))
}

/// 遥测编码器
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryEncoder {
    battery_display: BatteryDisplay,
}

impl TelemetryEncoder {
    pub fn new(battery_display: BatteryDisplay) -> Self {
        Self { battery_display }
    }

    pub fn battery_display(&self) -> BatteryDisplay {
        self.battery_display
    }

    /// 编码快照
    ///
    /// 检查顺序：跟随状态与飞行器状态 → 飞行模式 → 其余按需读取的属性。
    pub fn encode(&self, snapshot: &VehicleSnapshot) -> Result<TelemetryMessage, RelayError> {
        let follow = snapshot
            .follow
            .ok_or(RelayError::MissingData(AttributeKind::FollowState))?;
        let state = snapshot
            .state
            .ok_or(RelayError::MissingData(AttributeKind::State))?;
        let mode = state
            .mode
            .ok_or(RelayError::MissingData(AttributeKind::State))?;

        let mode_label = if !state.armed {
            LABEL_DISARMED
        } else if follow.is_enabled() {
            LABEL_FOLLOW
        } else {
            // 引导状态只在这一分支才会被用到
            let guided = snapshot
                .guided
                .ok_or(RelayError::MissingData(AttributeKind::GuidedState))?;
            if guided.idle { LABEL_PAUSED } else { mode.label() }
        };

        let follow_type_label = follow
            .follow_type
            .map(|t| t.label())
            .unwrap_or(FOLLOW_TYPE_NONE);

        let telemetry_text = self.telemetry_text(snapshot)?;

        Ok(TelemetryMessage::new(
            mode_label,
            follow_type_label,
            telemetry_text,
        ))
    }

    /// 三行遥测文本：`Bat:<v>V` / `Alt: <v>` / `Speed: <v>`
    fn telemetry_text(&self, snapshot: &VehicleSnapshot) -> Result<String, RelayError> {
        let voltage = snapshot
            .battery
            .and_then(|b| b.voltage)
            .ok_or(RelayError::MissingData(AttributeKind::Battery))?;
        let voltage = match self.battery_display {
            BatteryDisplay::Zeroed => 0.0,
            BatteryDisplay::Measured => voltage,
        };
        let speed = snapshot
            .speed
            .ok_or(RelayError::MissingData(AttributeKind::Speed))?;
        let altitude = snapshot
            .altitude
            .ok_or(RelayError::MissingData(AttributeKind::Altitude))?;

        Ok(format!(
            "Bat:{}V\nAlt: {}\nSpeed: {}",
            format_one_decimal(voltage),
            format_one_decimal(altitude.altitude),
            format_one_decimal(speed.air_speed),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::*;
    use proptest::prelude::*;

    fn full_snapshot(armed: bool, follow: FollowStateKind, guided_idle: bool) -> VehicleSnapshot {
        VehicleSnapshot::default()
            .with(Attribute::State(VehicleState {
                armed,
                connected: true,
                mode: Some(VehicleMode::Loiter),
            }))
            .with(Attribute::FollowState(FollowState::new(follow, None)))
            .with(Attribute::GuidedState(GuidedState { idle: guided_idle }))
            .with(Attribute::Battery(Battery {
                voltage: Some(11.1),
            }))
            .with(Attribute::Speed(Speed { air_speed: 3.26 }))
            .with(Attribute::Altitude(Altitude { altitude: 50.04 }))
    }

    #[test]
    fn test_loiter_scenario_with_zeroed_battery() {
        let snapshot = full_snapshot(true, FollowStateKind::End, false);
        let msg = TelemetryEncoder::default().encode(&snapshot).unwrap();

        assert_eq!(msg.mode_label, "Loiter");
        assert_eq!(msg.follow_type_label, "none");
        assert_eq!(msg.telemetry_text, "Bat:0.0V\nAlt: 50.0\nSpeed: 3.3");
        assert_eq!(msg.protocol_version, "one");
    }

    #[test]
    fn test_measured_battery_display() {
        let snapshot = full_snapshot(true, FollowStateKind::End, false);
        let msg = TelemetryEncoder::new(BatteryDisplay::Measured)
            .encode(&snapshot)
            .unwrap();
        assert_eq!(msg.telemetry_text, "Bat:11.1V\nAlt: 50.0\nSpeed: 3.3");
    }

    #[test]
    fn test_mode_label_priority() {
        let encoder = TelemetryEncoder::default();

        let msg = encoder
            .encode(&full_snapshot(true, FollowStateKind::Running, true))
            .unwrap();
        assert_eq!(msg.mode_label, "Follow");

        let msg = encoder
            .encode(&full_snapshot(true, FollowStateKind::End, true))
            .unwrap();
        assert_eq!(msg.mode_label, "Paused");

        let msg = encoder
            .encode(&full_snapshot(false, FollowStateKind::Start, true))
            .unwrap();
        assert_eq!(msg.mode_label, "Disarmed");
    }

    #[test]
    fn test_follow_type_label() {
        let snapshot = full_snapshot(true, FollowStateKind::Running, false).with(
            Attribute::FollowState(FollowState::new(
                FollowStateKind::Running,
                Some(FollowType::Circle),
            )),
        );
        let msg = TelemetryEncoder::default().encode(&snapshot).unwrap();
        assert_eq!(msg.follow_type_label, "Circle");
    }

    #[test]
    fn test_missing_follow_or_state_skips() {
        let encoder = TelemetryEncoder::default();

        let mut snapshot = full_snapshot(true, FollowStateKind::End, false);
        snapshot.follow = None;
        assert!(matches!(
            encoder.encode(&snapshot),
            Err(RelayError::MissingData(AttributeKind::FollowState))
        ));

        let mut snapshot = full_snapshot(true, FollowStateKind::End, false);
        snapshot.state = None;
        assert!(matches!(
            encoder.encode(&snapshot),
            Err(RelayError::MissingData(AttributeKind::State))
        ));
    }

    #[test]
    fn test_missing_mode_skips() {
        let mut snapshot = full_snapshot(true, FollowStateKind::End, false);
        snapshot.state = Some(VehicleState {
            armed: true,
            connected: true,
            mode: None,
        });
        assert!(TelemetryEncoder::default().encode(&snapshot).is_err());
    }

    #[test]
    fn test_guided_state_only_required_when_consulted() {
        let encoder = TelemetryEncoder::default();

        let mut disarmed = full_snapshot(false, FollowStateKind::End, false);
        disarmed.guided = None;
        assert_eq!(encoder.encode(&disarmed).unwrap().mode_label, "Disarmed");

        let mut armed = full_snapshot(true, FollowStateKind::End, false);
        armed.guided = None;
        assert!(matches!(
            encoder.encode(&armed),
            Err(RelayError::MissingData(AttributeKind::GuidedState))
        ));
    }

    #[test]
    fn test_missing_voltage_skips() {
        let snapshot = full_snapshot(true, FollowStateKind::End, false)
            .with(Attribute::Battery(Battery { voltage: None }));
        for display in [BatteryDisplay::Zeroed, BatteryDisplay::Measured] {
            assert!(matches!(
                TelemetryEncoder::new(display).encode(&snapshot),
                Err(RelayError::MissingData(AttributeKind::Battery))
            ));
        }
    }

    #[test]
    fn test_rounding_boundaries() {
        assert_eq!(round_to_one_decimal(3.26), 3.3);
        assert_eq!(round_to_one_decimal(50.04), 50.0);
        assert_eq!(round_to_one_decimal(0.05), 0.1);
        assert_eq!(round_to_one_decimal(-0.05), 0.0);
        assert_eq!(round_to_one_decimal(-0.15), -0.1);
        assert_eq!(round_to_one_decimal(-2.25), -2.2);
        assert_eq!(format_one_decimal(-0.04), "0.0");
        assert_eq!(format_one_decimal(12.0), "12.0");
    }

    #[test]
    fn test_rounding_idempotent_on_representative_set() {
        let values = [
            0.0, 0.05, 0.15, 0.25, 1.05, 2.45, 3.26, 50.04, 99.95, -0.05, -0.15, -1.05, -3.26,
            -99.95, 1234.56,
        ];
        for v in values {
            let once = round_to_one_decimal(v);
            assert_eq!(round_to_one_decimal(once), once, "value {}", v);
        }
    }

    proptest! {
        #[test]
        fn rounding_is_idempotent(v in -10_000.0..10_000.0f64) {
            let once = round_to_one_decimal(v);
            prop_assert_eq!(round_to_one_decimal(once), once);
        }

        #[test]
        fn disarmed_overrides_every_other_field(
            follow_idx in 0usize..6,
            guided_idle in any::<bool>(),
            follow_type_idx in 0usize..7,
        ) {
            let kinds = [
                FollowStateKind::Start,
                FollowStateKind::Running,
                FollowStateKind::End,
                FollowStateKind::Invalid,
                FollowStateKind::DroneDisconnected,
                FollowStateKind::DroneNotArmed,
            ];
            let follow_type = FollowType::ALL.get(follow_type_idx).copied();
            let snapshot = full_snapshot(false, kinds[follow_idx], guided_idle)
                .with(Attribute::FollowState(FollowState::new(kinds[follow_idx], follow_type)));
            let msg = TelemetryEncoder::default().encode(&snapshot).unwrap();
            prop_assert_eq!(msg.mode_label, "Disarmed");
        }
    }
}
