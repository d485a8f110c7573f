//! Action dispatcher tests
//!
//! Exercises the motion state machine end to end against the registry and
//! the recording driver sink: idempotent re-issues, supersedes, stop
//! semantics, position validation, and partial-failure fan-out.

mod common;

use common::*;
use curtain_skill_rust::{
    config::TransitBehavior,
    dispatch::{ActionDispatcher, CurtainCommand, DispatchResult, OutcomeStatus},
    intent::{CurtainAction, Intent, MatchTier, ResolvedTarget},
    mock::{MockCommandSink, MockDeviceStore},
    registry::{DeviceRegistry, MotionState},
};
use std::sync::Arc;

struct DispatchHarness {
    dispatcher: ActionDispatcher,
    registry: Arc<DeviceRegistry>,
    sink: Arc<MockCommandSink>,
}

fn dispatch_harness(devices: Vec<curtain_skill_rust::registry::CurtainDevice>) -> DispatchHarness {
    let config = test_config();
    let store = Arc::new(MockDeviceStore::with_devices(devices));
    let registry = Arc::new(DeviceRegistry::new(
        store,
        config.cache_ttl,
        config.staleness_ceiling,
    ));
    let sink = Arc::new(MockCommandSink::new());
    let dispatcher = ActionDispatcher::new(registry.clone(), sink.clone(), config);
    DispatchHarness {
        dispatcher,
        registry,
        sink,
    }
}

async fn resolved_for(registry: &DeviceRegistry, keys: &[&str], tier: MatchTier) -> ResolvedTarget {
    let mut devices = Vec::new();
    for key in keys {
        devices.push(registry.get(key).await.unwrap());
    }
    ResolvedTarget { devices, tier }
}

#[tokio::test]
async fn open_transitions_idle_device_and_issues_one_command() {
    let h = dispatch_harness(test_devices());
    let intent = Intent::new(CurtainAction::Open, vec!["living room".to_string()]);
    let target = resolved_for(&h.registry, &["curtain-living"], MatchTier::Room).await;

    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();
    assert!(result.all_succeeded());

    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.motion, MotionState::Opening);
    assert_eq!(
        h.sink.commands_for("curtain-living").await,
        vec![CurtainCommand::Open]
    );
}

#[tokio::test]
async fn open_while_opening_is_idempotent_without_driver_call() {
    let h = dispatch_harness(test_devices());
    h.registry
        .update("curtain-living", None, MotionState::Opening)
        .await
        .unwrap();

    let intent = Intent::new(CurtainAction::Open, vec!["living room".to_string()]);
    let target = resolved_for(&h.registry, &["curtain-living"], MatchTier::Room).await;
    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();

    assert!(result.all_succeeded());
    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.motion, MotionState::Opening);
    // No duplicate command reached the driver.
    assert!(h.sink.commands_for("curtain-living").await.is_empty());
}

#[tokio::test]
async fn close_supersedes_opening_transit() {
    let h = dispatch_harness(test_devices());
    h.registry
        .update("curtain-living", None, MotionState::Opening)
        .await
        .unwrap();

    let intent = Intent::new(CurtainAction::Close, vec!["living room".to_string()]);
    let target = resolved_for(&h.registry, &["curtain-living"], MatchTier::Room).await;
    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();

    assert!(result.all_succeeded());
    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.motion, MotionState::Closing);
    assert_eq!(
        h.sink.commands_for("curtain-living").await,
        vec![CurtainCommand::Close]
    );
}

#[tokio::test]
async fn stop_on_idle_device_succeeds_without_command() {
    let h = dispatch_harness(test_devices());
    let intent = Intent::new(CurtainAction::Stop, vec!["living room".to_string()]);
    let target = resolved_for(&h.registry, &["curtain-living"], MatchTier::Room).await;

    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();
    assert!(result.all_succeeded());
    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.motion, MotionState::Idle);
    assert!(h.sink.history().await.is_empty());
}

#[tokio::test]
async fn stop_halts_a_moving_device() {
    let h = dispatch_harness(test_devices());
    h.registry
        .update("curtain-living", None, MotionState::Closing)
        .await
        .unwrap();

    let intent = Intent::new(CurtainAction::Stop, vec!["living room".to_string()]);
    let target = resolved_for(&h.registry, &["curtain-living"], MatchTier::Room).await;
    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();

    assert!(result.all_succeeded());
    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.motion, MotionState::Stopped);
    assert_eq!(
        h.sink.commands_for("curtain-living").await,
        vec![CurtainCommand::Stop]
    );
}

#[tokio::test]
async fn set_position_writes_target_and_stays_idle() {
    let h = dispatch_harness(test_devices());
    let intent = Intent::new(CurtainAction::SetPosition, vec!["bedroom".to_string()])
        .with_position(25);
    let target = resolved_for(&h.registry, &["curtain-bedroom"], MatchTier::Room).await;

    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();
    assert!(result.all_succeeded());
    let device = h.registry.get("curtain-bedroom").await.unwrap();
    assert_eq!(device.position, Some(25));
    assert_eq!(device.motion, MotionState::Idle);
    assert_eq!(
        h.sink.commands_for("curtain-bedroom").await,
        vec![CurtainCommand::SetPosition(25)]
    );
}

#[tokio::test]
async fn set_position_out_of_range_leaves_device_untouched() {
    let h = dispatch_harness(test_devices());
    let intent = Intent::new(
        CurtainAction::SetPosition,
        vec!["Living Room Curtain".to_string()],
    )
    .with_position(150);
    let target = resolved_for(&h.registry, &["curtain-living"], MatchTier::ExactName).await;

    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();
    assert!(result.all_invalid_position());
    assert_eq!(
        result.outcomes()[0].status,
        OutcomeStatus::InvalidPosition
    );

    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.position, Some(0));
    assert_eq!(device.motion, MotionState::Idle);
    assert!(h.sink.history().await.is_empty());
}

#[tokio::test]
async fn simulated_transit_reports_travel_direction() {
    let mut devices = test_devices();
    for device in &mut devices {
        device.device_type = "jalousie".to_string();
    }
    let mut config = test_config();
    config
        .transit
        .insert("jalousie".to_string(), TransitBehavior::Simulated);

    let store = Arc::new(MockDeviceStore::with_devices(devices));
    let registry = Arc::new(DeviceRegistry::new(
        store,
        config.cache_ttl,
        config.staleness_ceiling,
    ));
    let sink = Arc::new(MockCommandSink::new());
    let dispatcher = ActionDispatcher::new(registry.clone(), sink, config);

    // Office blind sits at 50; moving to 80 opens, the state machine
    // reports the direction until the driver confirms arrival.
    let intent = Intent::new(CurtainAction::SetPosition, vec!["office".to_string()])
        .with_position(80);
    let target = resolved_for(&registry, &["blind-office"], MatchTier::Room).await;
    let result = dispatcher.dispatch(&intent, &target).await.unwrap();

    assert!(result.all_succeeded());
    let device = registry.get("blind-office").await.unwrap();
    assert_eq!(device.motion, MotionState::Opening);
    assert_eq!(device.position, Some(80));
}

#[tokio::test]
async fn multi_device_failure_does_not_block_siblings() {
    let h = dispatch_harness(test_devices());
    h.sink.fail_device("curtain-bedroom").await;

    let intent = Intent::new(CurtainAction::Close, vec!["all".to_string()]);
    let target = resolved_for(
        &h.registry,
        &["curtain-living", "curtain-bedroom", "blind-office"],
        MatchTier::All,
    )
    .await;
    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();

    assert!(result.partial_failure());
    let outcomes = result.outcomes();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes.iter().filter(|o| o.succeeded()).count(),
        2,
        "siblings of the failed device still executed"
    );

    // Failed device keeps its prior state; the others transitioned.
    let failed = h.registry.get("curtain-bedroom").await.unwrap();
    assert_eq!(failed.motion, MotionState::Idle);
    let ok = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(ok.motion, MotionState::Closing);
}

#[tokio::test]
async fn ambiguous_target_is_not_executed() {
    let h = dispatch_harness(test_devices());
    let intent = Intent::new(CurtainAction::Close, vec!["curtain".to_string()]);
    let target = resolved_for(
        &h.registry,
        &["curtain-living", "curtain-bedroom"],
        MatchTier::Fuzzy,
    )
    .await;

    let result = h.dispatcher.dispatch(&intent, &target).await.unwrap();
    assert!(matches!(result, DispatchResult::NeedsClarification { .. }));
    assert!(h.sink.history().await.is_empty());
    let device = h.registry.get("curtain-living").await.unwrap();
    assert_eq!(device.motion, MotionState::Idle);
}

#[tokio::test]
async fn empty_target_reports_no_target() {
    let h = dispatch_harness(test_devices());
    let intent = Intent::new(CurtainAction::Open, vec!["aquarium".to_string()]);
    let result = h
        .dispatcher
        .dispatch(&intent, &ResolvedTarget::empty())
        .await
        .unwrap();

    assert!(matches!(result, DispatchResult::NoTarget { .. }));
    assert!(h.sink.history().await.is_empty());
}
