//! Common test utilities and fixtures

use curtain_skill_rust::{
    config::SkillConfig,
    mock::{MockCommandSink, MockDeviceStore},
    registry::{CommandChannel, CurtainDevice, MotionState},
    skill::CurtainSkill,
};
use std::sync::Arc;
use std::time::Duration;

/// Build a device with idle motion and a known position
#[allow(dead_code)]
pub fn test_device(key: &str, name: &str, room: &str, position: u8) -> CurtainDevice {
    let mut device = CurtainDevice::new(
        key,
        name,
        room,
        CommandChannel::new(format!("assistant/{key}/set")).expect("valid test topic"),
    );
    device.position = Some(position);
    device.motion = MotionState::Idle;
    device
}

/// Standard three-device registry fixture
#[allow(dead_code)]
pub fn test_devices() -> Vec<CurtainDevice> {
    vec![
        test_device("curtain-living", "Living Room Curtain", "living room", 0),
        test_device("curtain-bedroom", "Bedroom Curtain", "bedroom", 100),
        test_device("blind-office", "Office Blind", "office", 50),
    ]
}

/// Config with a generous TTL so tests control refresh timing explicitly
#[allow(dead_code)]
pub fn test_config() -> SkillConfig {
    SkillConfig {
        cache_ttl: Duration::from_secs(60),
        staleness_ceiling: Duration::from_secs(600),
        ..Default::default()
    }
}

/// Full skill harness over mock collaborators
#[allow(dead_code)]
pub struct SkillHarness {
    pub skill: CurtainSkill,
    pub store: Arc<MockDeviceStore>,
    pub sink: Arc<MockCommandSink>,
}

/// Create a skill wired to mocks seeded with [`test_devices`]
#[allow(dead_code)]
pub fn skill_harness() -> SkillHarness {
    skill_harness_with(test_devices())
}

/// Create a skill wired to mocks seeded with the given devices
#[allow(dead_code)]
pub fn skill_harness_with(devices: Vec<CurtainDevice>) -> SkillHarness {
    let store = Arc::new(MockDeviceStore::with_devices(devices));
    let sink = Arc::new(MockCommandSink::new());
    let skill = CurtainSkill::new(test_config(), store.clone(), sink.clone())
        .expect("test config is valid");
    SkillHarness { skill, store, sink }
}
