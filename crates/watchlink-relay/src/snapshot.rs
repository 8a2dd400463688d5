//! 飞行器快照读取
//!
//! 每次需要编码时从协作者现读一份快照，任何字段都可能缺失。

use crate::link::VehicleLink;
use crate::vehicle::*;

/// 飞行器快照（临时对象，每次读取重新构造）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleSnapshot {
    pub state: Option<VehicleState>,
    pub follow: Option<FollowState>,
    pub guided: Option<GuidedState>,
    pub battery: Option<Battery>,
    pub speed: Option<Speed>,
    pub altitude: Option<Altitude>,
}

impl VehicleSnapshot {
    /// 从飞行器句柄读取所有属性（只读，不修改协作者状态）
    pub fn read<V: VehicleLink + ?Sized>(vehicle: &V) -> Self {
        let mut snapshot = Self::default();
        for kind in [
            AttributeKind::State,
            AttributeKind::FollowState,
            AttributeKind::GuidedState,
            AttributeKind::Battery,
            AttributeKind::Speed,
            AttributeKind::Altitude,
        ] {
            if let Some(attribute) = vehicle.read_attribute(kind) {
                snapshot.apply(attribute);
            }
        }
        snapshot
    }

    /// 写入单个属性
    ///
    /// 属性值按自身种类归位，与查询键无关。
    pub fn apply(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::State(v) => self.state = Some(v),
            Attribute::FollowState(v) => self.follow = Some(v),
            Attribute::GuidedState(v) => self.guided = Some(v),
            Attribute::Battery(v) => self.battery = Some(v),
            Attribute::Speed(v) => self.speed = Some(v),
            Attribute::Altitude(v) => self.altitude = Some(v),
        }
    }

    pub fn with(mut self, attribute: Attribute) -> Self {
        self.apply(attribute);
        self
    }

    pub fn mode(&self) -> Option<VehicleMode> {
        self.state.and_then(|s| s.mode)
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_some_and(|s| s.armed)
    }

    pub fn follow_enabled(&self) -> bool {
        self.follow.is_some_and(|f| f.is_enabled())
    }

    pub fn follow_type(&self) -> Option<FollowType> {
        self.follow.and_then(|f| f.follow_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_style_apply() {
        let snapshot = VehicleSnapshot::default()
            .with(Attribute::State(VehicleState {
                armed: true,
                connected: true,
                mode: Some(VehicleMode::Loiter),
            }))
            .with(Attribute::FollowState(FollowState::new(
                FollowStateKind::Running,
                Some(FollowType::Lead),
            )));

        assert_eq!(snapshot.mode(), Some(VehicleMode::Loiter));
        assert!(snapshot.is_armed());
        assert!(snapshot.follow_enabled());
        assert_eq!(snapshot.follow_type(), Some(FollowType::Lead));
        assert!(snapshot.battery.is_none());
    }

    #[test]
    fn test_empty_snapshot_accessors() {
        let snapshot = VehicleSnapshot::default();
        assert_eq!(snapshot.mode(), None);
        assert!(!snapshot.is_armed());
        assert!(!snapshot.follow_enabled());
        assert_eq!(snapshot.follow_type(), None);
    }
}
