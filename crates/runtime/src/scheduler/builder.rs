//! Constructor injection and stage setup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use battle_core::{
    ActorData, ActorId, ActorState, Placement, Roster, Side, SpeedTimeProvider, StageFields,
    TargetResolver, TimeProvider, Timeline, TimelineQueue,
};

use super::{StagePhase, StageTurnScheduler};
use crate::api::{
    ActorFactory, AutoInput, DamageSkillExecutor, DefaultActorFactory, InputControl, NullView,
    Result, SkillExecutor, ViewProvider,
};
use crate::config::RuntimeConfig;
use crate::events::{NotificationBus, SilentBus, StageEvent};

/// Player side entering a stage.
#[derive(Debug, Clone)]
pub enum PartyData {
    /// Actors carried over from a previous stage; only the living ones enter.
    Survivors(Vec<ActorState>),
    /// Freshly spawned actors at full health.
    Fresh(Vec<ActorData>),
}

/// Enemy side of a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageData {
    #[serde(default)]
    pub name: String,
    pub enemies: Vec<ActorData>,
}

/// Builder for [`StageTurnScheduler`]; every collaborator has a default.
pub struct StageBuilder {
    config: RuntimeConfig,
    time: Arc<dyn TimeProvider>,
    factory: Arc<dyn ActorFactory>,
    input: Arc<dyn InputControl>,
    skills: Arc<dyn SkillExecutor>,
    bus: Arc<dyn NotificationBus>,
    view: Arc<dyn ViewProvider>,
    cancel: CancellationToken,
}

impl StageBuilder {
    pub(super) fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            time: Arc::new(SpeedTimeProvider::default()),
            factory: Arc::new(DefaultActorFactory::new()),
            input: Arc::new(AutoInput),
            skills: Arc::new(DamageSkillExecutor),
            bus: Arc::new(SilentBus),
            view: Arc::new(NullView),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Swaps the speed-to-time formula used by the queue.
    pub fn time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = time;
        self
    }

    pub fn actor_factory(mut self, factory: Arc<dyn ActorFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn input(mut self, input: Arc<dyn InputControl>) -> Self {
        self.input = input;
        self
    }

    pub fn skill_executor(mut self, skills: Arc<dyn SkillExecutor>) -> Self {
        self.skills = skills;
        self
    }

    pub fn notification_bus(mut self, bus: Arc<dyn NotificationBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn view(mut self, view: Arc<dyn ViewProvider>) -> Self {
        self.view = view;
        self
    }

    /// Cancels the stage when this token (or a parent of it) is cancelled.
    pub fn cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs setup and returns a scheduler ready for its first turn.
    ///
    /// The first party member enters the player field, the rest wait in the
    /// hand. Every enemy enters the enemy field.
    pub async fn build(self, party: PartyData, stage: StageData) -> Result<StageTurnScheduler> {
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer.max(1));
        let queue = TimelineQueue::new(self.config.battle.time_epsilon);

        let mut scheduler = StageTurnScheduler {
            config: self.config,
            roster: Roster::new(),
            fields: StageFields::new(),
            queue,
            timeline: Timeline::new(),
            resolver: TargetResolver::new(),
            time: self.time,
            factory: self.factory,
            input: self.input,
            skills: self.skills,
            bus: self.bus,
            view: self.view,
            phase: StagePhase::Setup,
            current: None,
            slot_cost: 0.0,
            parry_opened_at: None,
            turns: 0,
            cancel: self.cancel,
            command_tx,
            command_rx,
        };

        scheduler.setup(party, stage).await?;
        Ok(scheduler)
    }
}

impl StageTurnScheduler {
    async fn setup(&mut self, party: PartyData, stage: StageData) -> Result<()> {
        let party: Vec<ActorId> = match party {
            PartyData::Survivors(states) => states
                .into_iter()
                .filter(ActorState::is_alive)
                .map(|state| {
                    self.roster
                        .register_with_stats(Side::Player, state.stats, state.data)
                })
                .collect(),
            PartyData::Fresh(data) => data
                .into_iter()
                .map(|data| self.roster.register(Side::Player, data))
                .collect(),
        };

        for (i, &actor) in party.iter().enumerate() {
            let slot = self.factory.create(actor, &self.roster.actor(actor)?.data);
            if i == 0 {
                self.fields.player.add(slot)?;
                self.queue.enqueue(actor)?;
                self.view.resolve(actor, Placement::PlayerField);
            } else {
                self.fields.hand.push(slot)?;
                self.view.resolve(actor, Placement::Hand);
            }
        }

        for data in stage.enemies {
            let actor = self.roster.register(Side::Enemy, data);
            let slot = self.factory.create(actor, &self.roster.actor(actor)?.data);
            self.fields.enemy.add(slot)?;
            self.queue.enqueue(actor)?;
            self.view.resolve(actor, Placement::EnemyField);
        }

        self.refresh_timeline()?;
        self.fields.verify(&self.queue)?;
        self.phase = StagePhase::SelectActor;

        info!(
            target: "stage::scheduler",
            stage = %stage.name,
            players = self.fields.player.len(),
            hand = self.fields.hand.len(),
            enemies = self.fields.enemy.len(),
            "battle started"
        );
        debug!(target: "stage::scheduler", timeline = ?self.timeline.as_slice(), "initial timeline");

        let participants: Vec<ActorId> = self.fields.participants().map(|slot| slot.actor).collect();
        for actor in participants {
            self.notify(StageEvent::BattleStart { actor }).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{CombatRole, PositionMask, TargetMask, TargetSpec};

    #[test]
    fn stage_data_reads_json_with_defaults() {
        let json = r#"{
            "enemies": [
                { "name": "slime", "speed": 8, "max_hp": 30 },
                {
                    "name": "knight",
                    "role": "Defensive",
                    "speed": 12,
                    "max_hp": 80,
                    "skills": [
                        { "name": "lunge", "target": { "target": "ENEMY", "position": "FORWARD" }, "power": 9 }
                    ]
                }
            ]
        }"#;

        let stage: StageData = serde_json::from_str(json).unwrap();
        assert!(stage.name.is_empty());
        assert_eq!(stage.enemies[0].role, CombatRole::Default);
        assert!(stage.enemies[0].skills.is_empty());

        let knight = &stage.enemies[1];
        assert_eq!(knight.role, CombatRole::Defensive);
        assert_eq!(
            knight.skills[0].target,
            TargetSpec::new(TargetMask::ENEMY, PositionMask::FORWARD)
        );
        assert_eq!(knight.skills[0].target, TargetSpec::front_enemies());
    }

    #[tokio::test]
    async fn setup_places_the_first_member_on_the_field() {
        let party = PartyData::Fresh(vec![
            ActorData::new("lead", CombatRole::Default, 10, 10),
            ActorData::new("bench", CombatRole::Default, 10, 10),
        ]);
        let stage = StageData {
            name: "yard".into(),
            enemies: vec![
                ActorData::new("a", CombatRole::Defensive, 10, 10),
                ActorData::new("b", CombatRole::Offensive, 10, 10),
            ],
        };
        let factory = Arc::new(DefaultActorFactory::new());

        let scheduler = StageTurnScheduler::builder()
            .actor_factory(factory.clone())
            .build(party, stage)
            .await
            .unwrap();

        let fields = scheduler.fields();
        assert_eq!(fields.player.ids().collect::<Vec<_>>(), vec![ActorId(0)]);
        assert_eq!(fields.hand.ids().collect::<Vec<_>>(), vec![ActorId(1)]);
        // Defensive actors sort behind the rest of their field.
        assert_eq!(
            fields.enemy.ids().collect::<Vec<_>>(),
            vec![ActorId(3), ActorId(2)]
        );
        assert_eq!(scheduler.queue().len(), 3);
        assert!(!scheduler.queue().contains(ActorId(1)));
        assert_eq!(scheduler.timeline().len(), 10);
        assert_eq!(scheduler.phase(), StagePhase::SelectActor);
        assert_eq!(factory.live(), 4);
    }
}
