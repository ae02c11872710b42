//! End-to-end tests for the dungeon service and its admin surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use gloomhold::prelude::*;
use gloomhold::ability::BossPhase;
use gloomhold::instance::InstanceError;
use gloomhold::space::{SpaceError, SpaceState};
use gloomhold::AdminFailure;
use serde_json::json;
use tokio::sync::oneshot;

// =========================================================================
// Helpers
// =========================================================================

/// Area backend whose allocation can be switched off from the test.
/// Evacuations are logged in order.
#[derive(Clone, Default)]
struct FakeWorld {
    refuse_create: Arc<AtomicBool>,
    evacuated: Arc<Mutex<Vec<ParticipantId>>>,
}

impl AreaBackend for FakeWorld {
    fn area_exists(&self, _name: &str) -> bool {
        false
    }

    fn create_area(&mut self, _name: &str) -> Result<(), BackendError> {
        if self.refuse_create.load(Ordering::SeqCst) {
            return Err("disk full".into());
        }
        Ok(())
    }

    fn apply_settings(&mut self, _name: &str, _settings: &AreaSettings) -> Result<(), BackendError> {
        Ok(())
    }

    fn occupants(&self, _name: &str) -> Vec<ParticipantId> {
        Vec::new()
    }

    fn evacuate(&mut self, participant: ParticipantId) -> Result<(), BackendError> {
        self.evacuated.lock().unwrap().push(participant);
        Ok(())
    }

    fn destroy_area(&mut self, _name: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

fn service() -> DungeonService<FakeWorld> {
    DungeonService::builder().build(FakeWorld::default())
}

fn layout() -> LayoutRecord {
    serde_json::from_value(json!({
        "rooms": [
            { "id": "r1", "bounds": { "min": { "x": 0.0, "y": 0.0, "z": 0.0 }, "max": { "x": 16.0, "y": 8.0, "z": 16.0 } } },
            { "id": "r2", "bounds": { "min": { "x": 20.0, "y": 0.0, "z": 0.0 }, "max": { "x": 36.0, "y": 8.0, "z": 16.0 } } },
            { "id": "boss", "type": "BOSS", "bounds": { "min": { "x": 40.0, "y": 0.0, "z": 0.0 }, "max": { "x": 64.0, "y": 12.0, "z": 24.0 } } }
        ],
        "connections": [
            { "from": "r1", "to": "r2", "point": { "x": 18.0, "y": 1.0, "z": 8.0 } },
            { "from": "r2", "to": "boss", "point": { "x": 38.0, "y": 1.0, "z": 8.0 } }
        ]
    }))
    .unwrap()
}

fn clear_both() -> Vec<ObjectiveDefinition> {
    serde_json::from_value(json!([
        { "id": "clear", "type": "CLEAR_ROOMS", "rooms": ["r1", "r2"] }
    ]))
    .unwrap()
}

fn cleared(room: &str) -> GameplayEvent {
    GameplayEvent::RoomCleared {
        room_id: RoomId::from(room),
    }
}

async fn create(service: &DungeonService<FakeWorld>, config: Option<InstanceConfig>) -> InstanceId {
    service
        .create_run_from_records(layout(), &clear_both(), BossBinding::named("lich_king"), config)
        .await
        .unwrap()
}

// =========================================================================
// Runs
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_completes_and_notifies_subscribers() {
    let service = service();
    let mut events = service.subscribe().await;
    let run = create(&service, None).await;
    service.join(ParticipantId(1), run).await.unwrap();
    service.join(ParticipantId(2), run).await.unwrap();

    let updates = service.dispatch(ParticipantId(1), cleared("r1")).await;
    assert_eq!(updates.len(), 1);
    service.dispatch(ParticipantId(2), cleared("r2")).await;

    let info = service.info(run).await.unwrap();
    assert_eq!(info.state, InstanceState::Complete);
    assert_eq!(info.rooms_cleared, 2);
    assert_eq!(info.room_count, 3);

    assert_eq!(
        events.recv().await.unwrap(),
        LifecycleEvent::Completed {
            instance: run,
            participants: vec![ParticipantId(1), ParticipantId(2)],
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_participant_can_hold_one_run() {
    let service = service();
    let a = create(&service, None).await;
    let b = create(&service, None).await;
    service.join(ParticipantId(1), a).await.unwrap();

    let err = service.join(ParticipantId(1), b).await.unwrap_err();
    assert!(matches!(
        err,
        GloomholdError::Instance(InstanceError::AlreadyInRun { instance, .. }) if instance == a
    ));
    assert!(service.is_participant_of_any(ParticipantId(1)).await);

    assert!(service.leave(ParticipantId(1)).await);
    assert!(!service.is_participant_of_any(ParticipantId(1)).await);
    service.join(ParticipantId(1), b).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_events_from_outsiders_are_dropped() {
    let service = service();
    let run = create(&service, None).await;

    assert!(service.dispatch(ParticipantId(9), cleared("r1")).await.is_empty());
    assert_eq!(service.info(run).await.unwrap().rooms_cleared, 0);
}

#[tokio::test(start_paused = true)]
async fn test_encoded_dispatch() {
    let service = service();
    let run = create(&service, None).await;
    service.join(ParticipantId(1), run).await.unwrap();

    let updates = service
        .dispatch_encoded(ParticipantId(1), br#"{"kind":"RoomCleared","room_id":"r1"}"#)
        .await;
    assert_eq!(updates.len(), 1);

    assert!(service.dispatch_encoded(ParticipantId(1), b"not json").await.is_empty());
    assert!(
        service
            .dispatch_encoded(ParticipantId(1), br#"{"kind":"Teleported"}"#)
            .await
            .is_empty()
    );
}

#[tokio::test(start_paused = true)]
async fn test_encode_info_is_json() {
    let service = service();
    let run = create(&service, None).await;

    let bytes = service.encode_info(run).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["state"], "ACTIVE");
    assert_eq!(value["objectives"][0]["id"], "clear");

    assert!(service.encode_info(InstanceId(u64::MAX)).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_boss_encounter_hook() {
    let service = service();
    let run = create(&service, None).await;
    assert!(service.with_encounter(run, |_, _| ()).await.is_none());

    let encounter = BossEncounter::new(
        "lich_king",
        EntityId::random(),
        vec![BossPhase::new(1, 1.0, vec!["soul_bolt".into(), "unknown".into()])],
    );
    service.attach_encounter(run, encounter).await.unwrap();

    let usable = service
        .with_encounter(run, |boss, catalog| {
            boss.usable_abilities(catalog)
                .iter()
                .map(|a| a.id().to_string())
                .collect::<Vec<_>>()
        })
        .await
        .unwrap();
    assert_eq!(usable, vec!["soul_bolt".to_string()]);
}

// =========================================================================
// Upkeep
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_upkeep_expires_and_cleans_up_runs() {
    let service = service();
    let mut events = service.subscribe().await;
    let run = create(&service, Some(InstanceConfig::default().with_time_limit(10))).await;
    service.join(ParticipantId(1), run).await.unwrap();

    service.upkeep(9).await;
    assert_eq!(service.info(run).await.unwrap().time_remaining, Some(1));

    service.upkeep(10).await;
    assert!(service.info(run).await.is_none());
    assert!(!service.is_participant_of_any(ParticipantId(1)).await);
    assert_eq!(
        events.recv().await.unwrap(),
        LifecycleEvent::Expired {
            instance: run,
            participants: vec![ParticipantId(1)],
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        LifecycleEvent::Destroyed { instance: run }
    );
    assert_eq!(service.status().await.slots_in_use, 0);
}

#[tokio::test(start_paused = true)]
async fn test_upkeep_evacuates_finished_runs() {
    let world = FakeWorld::default();
    let service = DungeonService::builder().build(world.clone());
    let run = create(&service, None).await;
    service.join(ParticipantId(1), run).await.unwrap();
    service.join(ParticipantId(2), run).await.unwrap();
    service.dispatch(ParticipantId(1), cleared("r1")).await;
    service.dispatch(ParticipantId(1), cleared("r2")).await;
    assert!(world.evacuated.lock().unwrap().is_empty());

    service.upkeep(1).await;
    let mut evacuated = world.evacuated.lock().unwrap().clone();
    evacuated.sort();
    assert_eq!(evacuated, vec![ParticipantId(1), ParticipantId(2)]);
    assert!(service.info(run).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completion_reaches_subscribers_before_cleanup() {
    let service = service();
    let mut events = service.subscribe().await;
    let mut runs = Vec::new();
    for n in 1..=20 {
        let run = create(&service, None).await;
        service.join(ParticipantId(n), run).await.unwrap();
        service.dispatch(ParticipantId(n), cleared("r1")).await;
        runs.push(run);
    }

    let upkeep = tokio::spawn({
        let service = service.clone();
        async move {
            for now in 1..=200 {
                service.upkeep(now).await;
                tokio::task::yield_now().await;
            }
        }
    });
    let finishers: Vec<_> = (1..=20)
        .map(|n| {
            let service = service.clone();
            tokio::spawn(async move { service.dispatch(ParticipantId(n), cleared("r2")).await })
        })
        .collect();
    for finisher in finishers {
        finisher.await.unwrap();
    }
    upkeep.await.unwrap();
    service.upkeep(201).await;

    let mut completed_at = HashMap::new();
    let mut destroyed_at = HashMap::new();
    let mut seen = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            LifecycleEvent::Completed { instance, .. } => {
                completed_at.insert(instance, seen);
            }
            LifecycleEvent::Destroyed { instance } => {
                destroyed_at.insert(instance, seen);
            }
            other => panic!("unexpected {other:?}"),
        }
        seen += 1;
    }
    for run in runs {
        let completed = completed_at[&run];
        let destroyed = destroyed_at[&run];
        assert!(completed < destroyed, "{run}: completed {completed}, destroyed {destroyed}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_upkeep_loop_runs_until_shutdown() {
    let service = service();
    let mut events = service.subscribe().await;
    let run = create(&service, Some(InstanceConfig::default().with_time_limit(5))).await;

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn({
        let service = service.clone();
        async move {
            service
                .run_upkeep(async {
                    let _ = stopped.await;
                })
                .await
        }
    });

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        LifecycleEvent::Expired {
            instance: run,
            participants: vec![],
        }
    );
    stop.send(()).unwrap();
    handle.await.unwrap();
    assert!(service.status().await.now >= 5);
}

#[tokio::test(start_paused = true)]
async fn test_upkeep_loop_disabled_at_rate_zero() {
    let config = GloomholdConfig::from_json(r#"{"tick_rate_hz": 0}"#).unwrap();
    let service = DungeonService::builder()
        .config(config)
        .build(FakeWorld::default());
    service.run_upkeep(std::future::pending()).await;
}

// =========================================================================
// Admin
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_admin_status_and_destroy() {
    let service = service();
    let a = create(&service, None).await;
    create(&service, None).await;
    service.join(ParticipantId(1), a).await.unwrap();

    let AdminOutcome::Status { status } = service.execute(AdminCommand::Status).await else {
        panic!("expected status");
    };
    assert!(status.ready);
    assert_eq!(status.active_runs, 2);
    assert_eq!(status.capacity, 100);

    let outcome = service.execute(AdminCommand::Destroy { instance: a }).await;
    assert!(outcome.is_success());
    assert!(!service.is_participant_of_any(ParticipantId(1)).await);

    let outcome = service.execute(AdminCommand::Destroy { instance: a }).await;
    assert_eq!(
        outcome,
        AdminOutcome::Failed {
            failure: AdminFailure::NoSuchRun { instance: a }
        }
    );

    let outcome = service.execute(AdminCommand::DestroyAll).await;
    assert_eq!(outcome.to_string(), "1 runs destroyed");
    assert_eq!(service.status().await.active_runs, 0);
}

#[tokio::test(start_paused = true)]
async fn test_admin_remove_participant() {
    let service = service();
    let run = create(&service, None).await;
    service.join(ParticipantId(3), run).await.unwrap();

    let outcome = service
        .execute(AdminCommand::RemoveParticipant {
            participant: ParticipantId(3),
        })
        .await;
    assert!(outcome.is_success());

    let outcome = service
        .execute(AdminCommand::RemoveParticipant {
            participant: ParticipantId(3),
        })
        .await;
    assert_eq!(outcome.to_string(), "failed: P-3 is not in any run");
}

#[tokio::test(start_paused = true)]
async fn test_failed_space_recovers_after_reset() {
    let world = FakeWorld::default();
    world.refuse_create.store(true, Ordering::SeqCst);
    let service = DungeonService::builder().build(world.clone());

    let status = service.status().await;
    assert_eq!(status.space, SpaceState::Uninitialized);
    assert!(!status.ready);

    let err = service
        .create_run(RoomGraph::new(), ObjectiveEngine::new(), BossBinding::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GloomholdError::Instance(InstanceError::Space(SpaceError::NotReady(SpaceState::Uninitialized)))
    ));

    let outcome = service.execute(AdminCommand::ResetSpace).await;
    assert!(!outcome.is_success());
    assert!(outcome.to_string().contains("disk full"));

    world.refuse_create.store(false, Ordering::SeqCst);
    let outcome = service.execute(AdminCommand::ResetSpace).await;
    assert!(outcome.is_success());
    assert!(service.status().await.ready);
    create(&service, None).await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_final() {
    let service = service();
    let run = create(&service, None).await;
    service.join(ParticipantId(1), run).await.unwrap();

    let report = service.shutdown().await;
    assert_eq!(report.destroyed, vec![run]);
    assert_eq!(report.evacuated, 1);
    assert_eq!(service.status().await.space, SpaceState::Destroyed);

    let outcome = service.execute(AdminCommand::ResetSpace).await;
    assert_eq!(
        outcome,
        AdminOutcome::Failed {
            failure: AdminFailure::NotReady {
                state: SpaceState::Destroyed
            }
        }
    );
}
