#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::broadcast;

use battle_core::{ActorData, CombatRole, SkillData, TargetSpec};
use stage_runtime::{EventRecorder, EventRegistry, StageEvent, Subscription};

pub fn fighter(name: &str, speed: i32, hp: i32) -> ActorData {
    ActorData::new(name, CombatRole::Default, speed, hp)
}

pub fn striker(name: &str, speed: i32, hp: i32, target: TargetSpec, power: i32) -> ActorData {
    fighter(name, speed, hp).with_skill(SkillData::new("strike", target, power))
}

/// Registry with a recorder attached; keep the subscription alive.
pub fn recorded_bus() -> (
    Arc<EventRegistry>,
    Subscription,
    broadcast::Receiver<StageEvent>,
) {
    let registry = EventRegistry::new();
    let recorder = EventRecorder::new();
    let rx = recorder.subscribe();
    let subscription = registry.subscribe(Arc::new(recorder));
    (Arc::new(registry), subscription, rx)
}

pub fn drain(rx: &mut broadcast::Receiver<StageEvent>) -> Vec<StageEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
