use gloomhold::ability::{BossPhase, EffectTarget, TargetView};
use gloomhold::instance::InstanceError;
use gloomhold::prelude::*;
use tracing::info;

const CONFIG: &str = r#"{
    "tick_rate_hz": 20,
    "space": { "area_name": "crypt_world", "grid_width": 4 },
    "instance": { "max_participants": 4, "difficulty": "HARD" }
}"#;

// ---------------------------------------------------------------------------
// In-memory world
// ---------------------------------------------------------------------------

/// Stand-in for the game server's world: one named area, no real players.
#[derive(Default)]
struct CryptWorld {
    area: Option<String>,
}

impl AreaBackend for CryptWorld {
    fn area_exists(&self, name: &str) -> bool {
        self.area.as_deref() == Some(name)
    }

    fn create_area(&mut self, name: &str) -> Result<(), BackendError> {
        self.area = Some(name.to_string());
        Ok(())
    }

    fn apply_settings(&mut self, name: &str, settings: &AreaSettings) -> Result<(), BackendError> {
        info!(area = name, time_of_day = settings.time_of_day, "area configured");
        Ok(())
    }

    fn occupants(&self, _name: &str) -> Vec<ParticipantId> {
        Vec::new()
    }

    fn evacuate(&mut self, participant: ParticipantId) -> Result<(), BackendError> {
        info!(%participant, "sent back to the overworld");
        Ok(())
    }

    fn destroy_area(&mut self, _name: &str) -> Result<(), BackendError> {
        self.area = None;
        Ok(())
    }
}

/// The boss arena as the ability engine sees it.
struct Arena {
    players: Vec<TargetView>,
    projectiles: usize,
}

impl EncounterHost for Arena {
    fn launch_projectile(&mut self, origin: Vec3, velocity: Vec3) {
        info!(?origin, ?velocity, "projectile launched");
        self.projectiles += 1;
    }

    fn participants_within(&self, center: Vec3, radius: f64) -> Vec<TargetView> {
        self.players
            .iter()
            .filter(|p| p.position.distance(center) <= radius)
            .copied()
            .collect()
    }

    fn push(&mut self, participant: ParticipantId, velocity: Vec3) {
        info!(%participant, ?velocity, "knocked back");
    }

    fn damage(&mut self, participant: ParticipantId, amount: f64) {
        info!(%participant, amount, "took damage");
    }

    fn hostile_mobs_near(&self, _center: Vec3, _radius: f64) -> usize {
        0
    }

    fn find_ground(&self, around: Vec3) -> Option<Vec3> {
        Some(around)
    }

    fn spawn_mob(&mut self, kind: &str, at: Vec3) -> Option<EntityId> {
        info!(kind, ?at, "minion spawned");
        Some(EntityId::random())
    }

    fn apply_effect(&mut self, target: EffectTarget, effect: &str, duration_ticks: u64, amplifier: u32) {
        info!(?target, effect, duration_ticks, amplifier, "effect applied");
    }

    fn teleport_boss(&mut self, _to: Vec3) -> bool {
        true
    }
}

fn player(id: u64, x: f64) -> TargetView {
    TargetView {
        participant: ParticipantId(id),
        position: Vec3::new(x, 0.0, 0.0),
        facing: Vec3::new(-1.0, 0.0, 0.0),
        alive: true,
        flying: false,
    }
}

// ---------------------------------------------------------------------------
// Dungeon content
// ---------------------------------------------------------------------------

fn layout() -> Result<LayoutRecord, serde_json::Error> {
    serde_json::from_value(serde_json::json!({
        "rooms": [
            { "id": "ossuary", "bounds": { "min": { "x": 0.0, "y": 0.0, "z": 0.0 }, "max": { "x": 16.0, "y": 8.0, "z": 16.0 } } },
            { "id": "catacombs", "bounds": { "min": { "x": 20.0, "y": 0.0, "z": 0.0 }, "max": { "x": 36.0, "y": 8.0, "z": 16.0 } } },
            { "id": "throne", "type": "BOSS", "bounds": { "min": { "x": 40.0, "y": 0.0, "z": 0.0 }, "max": { "x": 64.0, "y": 12.0, "z": 24.0 } } }
        ],
        "connections": [
            { "from": "ossuary", "to": "catacombs", "point": { "x": 18.0, "y": 1.0, "z": 8.0 } },
            { "from": "catacombs", "to": "throne", "point": { "x": 38.0, "y": 1.0, "z": 8.0 }, "door": { "x": 38.0, "y": 1.0, "z": 8.0 } }
        ]
    }))
}

fn objectives() -> Result<Vec<ObjectiveDefinition>, serde_json::Error> {
    serde_json::from_value(serde_json::json!([
        { "id": "purge", "type": "CLEAR_ROOMS", "rooms": ["ossuary", "catacombs"] },
        { "id": "lich", "type": "KILL_BOSS", "boss_id": "lich_king", "description": "Slay the Lich King" }
    ]))
}

fn lich_phases() -> Vec<BossPhase> {
    vec![
        BossPhase::new(1, 1.0, vec!["soul_bolt".into()]),
        BossPhase::new(2, 0.5, vec!["ground_slam".into(), "summon_minions".into()])
            .with_enter_message("The Lich King rises from his throne!")
            .with_invulnerability(40),
    ]
}

// ---------------------------------------------------------------------------
// Scripted run
// ---------------------------------------------------------------------------

async fn play(service: &DungeonService<CryptWorld>) -> Result<InstanceInfo, GloomholdError> {
    let run = service
        .create_run_from_records(layout()?, &objectives()?, BossBinding::named("lich_king"), None)
        .await?;
    let (tank, healer) = (ParticipantId(1), ParticipantId(2));
    service.join(tank, run).await?;
    service.join(healer, run).await?;

    let ghouls = [EntityId::random(), EntityId::random()];
    for ghoul in ghouls {
        service.add_mob(run, &RoomId::from("ossuary"), ghoul).await?;
    }
    for ghoul in ghouls {
        service.dispatch_to(run, GameplayEvent::MobKilled { mob: ghoul }).await?;
    }
    service
        .dispatch(healer, GameplayEvent::RoomCleared { room_id: RoomId::from("catacombs") })
        .await;

    let lich = EntityId::random();
    service
        .attach_encounter(run, BossEncounter::new("lich_king", lich, lich_phases()))
        .await?;

    let mut arena = Arena {
        players: vec![player(1, 12.0), player(2, 20.0)],
        projectiles: 0,
    };
    let target = arena.players[0];
    let fired = service
        .with_encounter(run, |boss, catalog| {
            let Some(ability) = boss.usable_abilities(catalog).first().copied() else {
                return false;
            };
            boss.use_ability(ability, Some(&target), &mut arena)
        })
        .await
        .unwrap_or(false);
    info!(fired, projectiles = arena.projectiles, "boss opened the fight");

    service
        .dispatch(tank, GameplayEvent::BossDamaged { boss: lich, health: 0.4 })
        .await;
    for (_, phase) in service.upkeep(1).await {
        info!(phase = phase.number, message = ?phase.message, "phase change");
    }

    service
        .dispatch(tank, GameplayEvent::BossKilled { boss: BossRef::Uuid(lich) })
        .await;

    service
        .info(run)
        .await
        .ok_or(GloomholdError::Instance(InstanceError::NotFound(run)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gloomhold::init_tracing();

    let service = DungeonService::builder()
        .config(GloomholdConfig::from_json(CONFIG)?)
        .build(CryptWorld::default());
    let mut events = service.subscribe().await;

    let info = play(&service).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);

    service.upkeep(2).await;
    service.shutdown().await;
    while let Ok(event) = events.try_recv() {
        info!(?event, "lifecycle");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> DungeonService<CryptWorld> {
        DungeonService::builder()
            .config(GloomholdConfig::from_json(CONFIG).unwrap())
            .build(CryptWorld::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_run_completes() {
        let service = service();
        let mut events = service.subscribe().await;

        let info = play(&service).await.unwrap();
        assert_eq!(info.state, InstanceState::Complete);
        assert!(info.boss_defeated);
        assert_eq!(info.rooms_cleared, 2);
        assert_eq!(info.difficulty, Difficulty::Hard);
        assert!(info.objectives.iter().all(|o| o.complete));

        let event = events.recv().await.unwrap();
        assert!(matches!(event, LifecycleEvent::Completed { ref participants, .. } if participants.len() == 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_run_is_cleaned_up() {
        let service = service();
        let info = play(&service).await.unwrap();

        service.upkeep(2).await;
        assert!(service.info(info.id).await.is_none());
        assert_eq!(service.status().await.slots_in_use, 0);
    }
}
