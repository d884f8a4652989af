mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tokio::sync::mpsc;

use battle_core::{ActorId, ActorStats, Side, StageActor, StageError, TargetSpec};
use stage_runtime::{
    EventScope, InputControl, PartyData, RuntimeConfig, RuntimeError, SkillExecutor, SkillRequest,
    StageData, StageEvent, StageHandle, StageListener, StageSnapshot, StageTurnScheduler, Verdict,
};

use common::{drain, fighter, recorded_bus, striker};

/// Player side is controlled; the turn never ends on its own.
struct StalledInput;

#[async_trait]
impl InputControl for StalledInput {
    fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
        side == Side::Player
    }

    async fn transfer_control(&self, _actor: ActorId, _stage: StageHandle) -> stage_runtime::Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Player actors delete themselves on their own turn.
struct SelfDestructInput;

#[async_trait]
impl InputControl for SelfDestructInput {
    fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
        side == Side::Player
    }

    async fn transfer_control(&self, actor: ActorId, stage: StageHandle) -> stage_runtime::Result<()> {
        stage.delete(actor).await
    }
}

struct FailOnTurnStart;

#[async_trait]
impl StageListener for FailOnTurnStart {
    fn name(&self) -> &'static str {
        "fail_on_turn_start"
    }

    async fn on_event(&self, _scopes: &[EventScope], event: &StageEvent) -> Result<(), String> {
        match event {
            StageEvent::TurnStart { .. } => Err("ui unavailable".into()),
            _ => Ok(()),
        }
    }
}

#[tokio::test]
async fn ai_stage_runs_to_victory() {
    let (bus, _sub, mut rx) = recorded_bus();
    let party = vec![striker("hero", 20, 100, TargetSpec::all_enemies(), 50)];
    let stage = StageData {
        name: "slimes".into(),
        enemies: vec![
            striker("slime", 10, 30, TargetSpec::front_enemies(), 1),
            striker("slime", 10, 30, TargetSpec::front_enemies(), 1),
        ],
    };

    let mut scheduler = StageTurnScheduler::builder()
        .notification_bus(bus)
        .build(PartyData::Fresh(party), stage)
        .await
        .unwrap();
    let outcome = scheduler.run().await.unwrap();

    assert_eq!(outcome.verdict, Verdict::Victory);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.players.len(), 1);
    assert!(outcome.enemies.is_empty());
    assert!(scheduler.queue().is_empty());
    assert!(scheduler.timeline().is_empty());

    let (hero, a, b) = (ActorId(0), ActorId(1), ActorId(2));
    assert_eq!(
        drain(&mut rx),
        vec![
            StageEvent::BattleStart { actor: hero },
            StageEvent::BattleStart { actor: a },
            StageEvent::BattleStart { actor: b },
            StageEvent::TurnStart { actor: hero, turn: 1 },
            StageEvent::Death { actor: a },
            StageEvent::Death { actor: b },
            StageEvent::TurnEnd { actor: hero, turn: 1 },
            StageEvent::BattleEnd {
                actor: hero,
                verdict: Verdict::Victory
            },
        ]
    );
}

#[tokio::test]
async fn wiped_party_is_a_defeat() {
    let party = vec![fighter("squire", 10, 10)];
    let stage = StageData {
        name: String::new(),
        enemies: vec![striker("ogre", 20, 200, TargetSpec::front_enemies(), 100)],
    };

    let mut scheduler = StageTurnScheduler::builder()
        .build(PartyData::Fresh(party), stage)
        .await
        .unwrap();
    let outcome = scheduler.run().await.unwrap();

    assert_eq!(outcome.verdict, Verdict::Defeat);
    assert!(outcome.players.is_empty());
    assert_eq!(outcome.enemies.len(), 1);
    assert_eq!(outcome.enemies[0].stats.hp, 200);
}

#[tokio::test]
async fn survivors_keep_their_wounds() {
    let mut first = StageTurnScheduler::builder()
        .build(
            PartyData::Fresh(vec![
                striker("hero", 20, 100, TargetSpec::all_enemies(), 50),
                fighter("fallen", 10, 10),
            ]),
            StageData {
                name: String::new(),
                enemies: vec![fighter("dummy", 1, 50)],
            },
        )
        .await
        .unwrap();
    let outcome = first.run().await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Victory);

    let mut survivors = outcome.players;
    survivors[1].stats.hp = 0;

    let second = StageTurnScheduler::builder()
        .build(
            PartyData::Survivors(survivors),
            StageData {
                name: String::new(),
                enemies: vec![fighter("dummy", 1, 50)],
            },
        )
        .await
        .unwrap();

    // Only the living survivor enters.
    assert_eq!(second.fields().player.len(), 1);
    assert!(second.fields().hand.is_empty());
}

#[tokio::test(start_paused = true)]
async fn automatic_tag_in_replaces_a_fallen_fighter() {
    let (bus, _sub, mut rx) = recorded_bus();
    let party = vec![fighter("squire", 10, 10), fighter("knight", 10, 50)];
    let stage = StageData {
        name: String::new(),
        enemies: vec![striker("wolf", 20, 40, TargetSpec::front_enemies(), 10)],
    };

    let mut scheduler = StageTurnScheduler::builder()
        .notification_bus(bus)
        .build(PartyData::Fresh(party), stage)
        .await
        .unwrap();
    let (squire, knight, wolf) = (ActorId(0), ActorId(1), ActorId(2));
    drain(&mut rx);

    let started = tokio::time::Instant::now();
    let pending = scheduler.begin_turn().await.unwrap().unwrap();
    assert_eq!(pending.actor(), wolf);
    let summary = scheduler.end_turn(pending).await.unwrap();

    assert_eq!(summary.auto_tagged_in, Some(knight));
    assert!(started.elapsed() >= RuntimeConfig::DEFAULT_AUTO_TAG_IN_DELAY);
    assert!(scheduler.fields().player.contains(knight));
    assert!(scheduler.fields().hand.is_empty());
    assert!(!scheduler.queue().contains(squire));
    assert!(!scheduler.timeline().contains(squire));
    assert!(scheduler.fields().verify(scheduler.queue()).is_ok());

    assert_eq!(
        drain(&mut rx),
        vec![
            StageEvent::TurnStart { actor: wolf, turn: 1 },
            StageEvent::Death { actor: squire },
            StageEvent::TurnEnd { actor: wolf, turn: 1 },
            StageEvent::TagIn {
                actor: knight,
                replacing: None
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn deleting_the_current_actor_mid_turn_skips_it() {
    let party = vec![fighter("martyr", 20, 10), fighter("heir", 10, 10)];
    let stage = StageData {
        name: String::new(),
        enemies: vec![fighter("statue", 10, 100)],
    };

    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(SelfDestructInput))
        .build(PartyData::Fresh(party), stage)
        .await
        .unwrap();
    let martyr = ActorId(0);
    assert_eq!(scheduler.timeline().head(), Some(martyr));

    let pending = scheduler.begin_turn().await.unwrap().unwrap();
    assert_eq!(pending.actor(), martyr);
    let summary = scheduler.end_turn(pending).await.unwrap();

    assert_eq!(summary.actor, martyr);
    assert!(!summary.tagged_out);
    assert!(!scheduler.queue().contains(martyr));
    assert!(!scheduler.timeline().contains(martyr));
    assert_ne!(scheduler.timeline().head(), Some(martyr));
    assert!(scheduler.roster().actor(martyr).unwrap().disposed);
    assert!(scheduler.fields().locate(martyr).is_none());
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_an_in_flight_turn() {
    let party = vec![fighter("hero", 20, 100)];
    let stage = StageData {
        name: String::new(),
        enemies: vec![fighter("slime", 10, 30)],
    };

    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(StalledInput))
        .build(PartyData::Fresh(party), stage)
        .await
        .unwrap();

    let token = scheduler.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let outcome = scheduler.run().await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Aborted);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.players.len(), 1);
    assert_eq!(outcome.enemies.len(), 1);
    assert!(scheduler.queue().is_empty());
}

#[tokio::test]
async fn turn_cap_aborts_the_stage() {
    let config = RuntimeConfig {
        max_turns: 5,
        ..RuntimeConfig::default()
    };
    let mut scheduler = StageTurnScheduler::builder()
        .config(config)
        .build(
            PartyData::Fresh(vec![fighter("pacifist", 10, 10)]),
            StageData {
                name: String::new(),
                enemies: vec![fighter("pacifist", 10, 10)],
            },
        )
        .await
        .unwrap();

    let outcome = scheduler.run().await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Aborted);
    assert_eq!(outcome.turns, 5);
}

#[tokio::test]
async fn listener_failure_aborts_the_stage() {
    let (bus, _sub, _rx) = recorded_bus();
    let _failing = bus.subscribe(Arc::new(FailOnTurnStart));

    let mut scheduler = StageTurnScheduler::builder()
        .notification_bus(bus.clone())
        .build(
            PartyData::Fresh(vec![fighter("hero", 10, 10)]),
            StageData {
                name: String::new(),
                enemies: vec![fighter("slime", 10, 10)],
            },
        )
        .await
        .unwrap();

    let err = scheduler.run().await.unwrap_err();
    match err {
        RuntimeError::Notification(err) => {
            assert_eq!(err.listener, "fail_on_turn_start");
            assert_eq!(err.message, "ui unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn snapshot_reflects_the_active_turn() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    struct SnapshotInput(Mutex<Option<tokio::sync::mpsc::UnboundedSender<stage_runtime::StageSnapshot>>>);

    #[async_trait]
    impl InputControl for SnapshotInput {
        fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
            side == Side::Player
        }

        async fn transfer_control(&self, _actor: ActorId, stage: StageHandle) -> stage_runtime::Result<()> {
            let snapshot = stage.snapshot().await?;
            if let Some(tx) = self.0.lock().await.take() {
                let _ = tx.send(snapshot);
            }
            Ok(())
        }
    }

    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(SnapshotInput(Mutex::new(Some(tx)))))
        .build(
            PartyData::Fresh(vec![fighter("hero", 20, 10), fighter("backup", 10, 10)]),
            StageData {
                name: String::new(),
                enemies: vec![fighter("slime", 10, 10)],
            },
        )
        .await
        .unwrap();

    let pending = scheduler.begin_turn().await.unwrap().unwrap();
    scheduler.end_turn(pending).await.unwrap();

    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.current, Some(ActorId(0)));
    assert_eq!(snapshot.turn, 1);
    assert_eq!(snapshot.hand.len(), 1);
    assert_eq!(snapshot.hand[0].name, "backup");
    assert_eq!(snapshot.hand[0].position, None);
    assert_eq!(snapshot.player[0].position, Some(battle_core::Position::Front));
    assert_eq!(snapshot.timeline.first(), Some(&ActorId(0)));
}

fn duel(hero_speed: i32, enemies: Vec<battle_core::ActorData>) -> (PartyData, StageData) {
    (
        PartyData::Fresh(vec![fighter("hero", hero_speed, 30)]),
        StageData {
            name: String::new(),
            enemies,
        },
    )
}

#[tokio::test]
async fn slowing_down_mid_turn_keeps_the_actor_at_the_head() {
    struct SlowdownInput(mpsc::UnboundedSender<StageSnapshot>);

    #[async_trait]
    impl InputControl for SlowdownInput {
        fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
            side == Side::Player
        }

        async fn transfer_control(&self, actor: ActorId, stage: StageHandle) -> stage_runtime::Result<()> {
            stage.set_speed(actor, 1).await?;
            let _ = self.0.send(stage.snapshot().await?);
            Ok(())
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (party, stage) = duel(20, vec![fighter("slime", 10, 30)]);
    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(SlowdownInput(tx)))
        .build(party, stage)
        .await
        .unwrap();
    let (hero, slime) = (ActorId(0), ActorId(1));

    let pending = scheduler.begin_turn().await.unwrap().unwrap();
    assert_eq!(pending.actor(), hero);
    scheduler.end_turn(pending).await.unwrap();

    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.current, Some(hero));
    assert_eq!(snapshot.timeline.first(), Some(&hero));

    // The finished slot costs what it cost when the turn began (1000 / 20).
    assert_eq!(scheduler.queue().elapsed(), 50.0);
    assert_eq!(scheduler.queue().entry(hero).unwrap().offset, 50.0);
    assert_eq!(scheduler.timeline().head(), Some(slime));
}

#[tokio::test]
async fn speed_change_reorders_the_live_timeline() {
    struct HasteInput(mpsc::UnboundedSender<(bool, bool, StageSnapshot)>);

    #[async_trait]
    impl InputControl for HasteInput {
        fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
            side == Side::Player
        }

        async fn transfer_control(&self, _actor: ActorId, stage: StageHandle) -> stage_runtime::Result<()> {
            let hasted = stage.set_speed(ActorId(2), 40).await?;
            let stranger = stage.set_speed(ActorId(9), 40).await?;
            let _ = self.0.send((hasted, stranger, stage.snapshot().await?));
            Ok(())
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (party, stage) = duel(10, vec![fighter("ogre", 10, 30), fighter("imp", 5, 30)]);
    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(HasteInput(tx)))
        .build(party, stage)
        .await
        .unwrap();
    let (hero, ogre, imp) = (ActorId(0), ActorId(1), ActorId(2));
    assert_eq!(&scheduler.timeline().as_slice()[..2], &[hero, ogre]);

    let pending = scheduler.begin_turn().await.unwrap().unwrap();
    scheduler.end_turn(pending).await.unwrap();

    let (hasted, stranger, snapshot) = rx.recv().await.unwrap();
    assert!(hasted);
    assert!(!stranger);
    assert_eq!(&snapshot.timeline[..3], &[hero, imp, imp]);
    assert_eq!(scheduler.timeline().head(), Some(imp));
}

#[tokio::test]
async fn heal_is_capped_at_max_hp() {
    type Report = (Option<ActorStats>, Option<ActorStats>, Option<ActorStats>);
    struct MendInput(mpsc::UnboundedSender<Report>);

    #[async_trait]
    impl InputControl for MendInput {
        fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
            side == Side::Player
        }

        async fn transfer_control(&self, _actor: ActorId, stage: StageHandle) -> stage_runtime::Result<()> {
            let wounded = stage.damage(ActorId(1), 12).await?;
            let healed = stage.heal(ActorId(1), 100).await?;
            let stranger = stage.heal(ActorId(9), 5).await?;
            let _ = self.0.send((wounded, healed, stranger));
            Ok(())
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (party, stage) = duel(20, vec![fighter("slime", 10, 30)]);
    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(MendInput(tx)))
        .build(party, stage)
        .await
        .unwrap();

    let pending = scheduler.begin_turn().await.unwrap().unwrap();
    scheduler.end_turn(pending).await.unwrap();

    let (wounded, healed, stranger) = rx.recv().await.unwrap();
    assert_eq!(wounded.map(|stats| stats.hp), Some(18));
    assert_eq!(healed.map(|stats| stats.hp), Some(30));
    assert_eq!(stranger, None);
    assert_eq!(scheduler.roster().actor(ActorId(1)).unwrap().stats.hp, 30);
}

#[tokio::test]
async fn deleting_a_stranger_aborts_the_stage() {
    struct StrangerInput(mpsc::UnboundedSender<bool>);

    #[async_trait]
    impl InputControl for StrangerInput {
        fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
            side == Side::Player
        }

        async fn transfer_control(&self, _actor: ActorId, stage: StageHandle) -> stage_runtime::Result<()> {
            let result = stage.delete(ActorId(42)).await;
            let _ = self.0.send(matches!(result, Err(RuntimeError::StageAborted)));
            Ok(())
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (party, stage) = duel(20, vec![fighter("slime", 10, 30)]);
    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(StrangerInput(tx)))
        .build(party, stage)
        .await
        .unwrap();

    let err = scheduler.run().await.unwrap_err();
    match err {
        RuntimeError::Stage(err) => {
            assert_eq!(err, StageError::not_participating(ActorId(42)));
        }
        other => panic!("unexpected error: {other}"),
    }

    drop(scheduler);
    assert_eq!(rx.recv().await, Some(true));
}

#[tokio::test]
async fn input_failure_surfaces_from_run() {
    struct DisconnectedInput;

    #[async_trait]
    impl InputControl for DisconnectedInput {
        fn can_control(&self, _slot: &StageActor, side: Side) -> bool {
            side == Side::Player
        }

        async fn transfer_control(&self, actor: ActorId, _stage: StageHandle) -> stage_runtime::Result<()> {
            Err(RuntimeError::input_control(actor, "controller disconnected"))
        }
    }

    let (party, stage) = duel(20, vec![fighter("slime", 10, 30)]);
    let mut scheduler = StageTurnScheduler::builder()
        .input(Arc::new(DisconnectedInput))
        .build(party, stage)
        .await
        .unwrap();

    let err = scheduler.run().await.unwrap_err();
    match err {
        RuntimeError::InputControl { actor, message } => {
            assert_eq!(actor, ActorId(0));
            assert_eq!(message, "controller disconnected");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn skill_failure_surfaces_from_run() {
    struct BrokenSkills;

    #[async_trait]
    impl SkillExecutor for BrokenSkills {
        async fn execute(&self, request: SkillRequest, _stage: StageHandle) -> stage_runtime::Result<()> {
            Err(RuntimeError::skill_execution(request.caster, "animation missing"))
        }
    }

    let mut scheduler = StageTurnScheduler::builder()
        .skill_executor(Arc::new(BrokenSkills))
        .build(
            PartyData::Fresh(vec![striker("hero", 20, 30, TargetSpec::all_enemies(), 5)]),
            StageData {
                name: String::new(),
                enemies: vec![fighter("slime", 10, 30)],
            },
        )
        .await
        .unwrap();

    let err = scheduler.run().await.unwrap_err();
    match err {
        RuntimeError::SkillExecution { actor, message } => {
            assert_eq!(actor, ActorId(0));
            assert_eq!(message, "animation missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}
