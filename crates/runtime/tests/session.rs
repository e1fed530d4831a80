use std::fs;

use runtime::{FileChunkStore, RandomWalk, RuntimeError, ScriptedInput, Session, TerrainGenerator};
use sim_content::{ActorSpec, ScenarioSpec};
use sim_core::{Faction, NpcAttitude, QuitReason, SimConfig, Tripoint};
use tempfile::TempDir;

fn scenario() -> ScenarioSpec {
    let mut scenario = ScenarioSpec::empty("outskirts");
    scenario.player.pos = Tripoint::new(6, 6, 0);
    scenario.actors = vec![
        ActorSpec::Zombie {
            pos: Tripoint::new(50, 6, 0),
        },
        ActorSpec::Npc {
            name: "Ana".to_owned(),
            faction: Faction::Ally,
            pos: Tripoint::new(6, 50, 0),
            attitude: NpcAttitude::Wander,
        },
    ];
    scenario
}

fn walk(seed: u64, turns: u64) -> runtime::SessionSummary {
    let temp = TempDir::new().unwrap();
    let config = SimConfig::new().with_seed(seed);
    let mut session =
        Session::new(config, &scenario(), temp.path(), Box::new(RandomWalk::new(seed))).unwrap();
    session.run(turns).unwrap()
}

#[test]
fn same_seed_gives_same_digest() {
    let first = walk(11, 60);
    let second = walk(11, 60);
    assert_eq!(first.digest, second.digest);
    assert_eq!(first.final_turn, second.final_turn);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn different_seeds_diverge() {
    assert_ne!(walk(11, 60).digest, walk(12, 60).digest);
}

#[test]
fn finishing_saves_maps_and_actors() {
    let temp = TempDir::new().unwrap();
    let mut session = Session::new(
        SimConfig::new(),
        &scenario(),
        temp.path(),
        Box::new(ScriptedInput::default()),
    )
    .unwrap();
    let origin = session.world().window.abs_sub();
    let summary = session.run(5).unwrap();

    assert_eq!(summary.turns_run, 5);
    assert_eq!(summary.reason, QuitReason::SaveAndQuit);
    assert!(session.is_finished());
    assert!(session.world().registry.is_empty());
    assert!(summary.deferred >= 2);

    let text = fs::read_to_string(temp.path().join("actors.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved.as_array().map(Vec::len), Some(summary.deferred));

    let store = FileChunkStore::new(temp.path().join("maps"), TerrainGenerator::new(0)).unwrap();
    assert!(store.exists(origin));
}

#[test]
fn autosave_writes_the_player_record() {
    let temp = TempDir::new().unwrap();
    let config = SimConfig::new().with_autosave_turns(Some(3));
    let mut session = Session::new(
        config,
        &ScenarioSpec::empty("alone"),
        temp.path(),
        Box::new(ScriptedInput::default()),
    )
    .unwrap();
    for _ in 0..4 {
        session.run_turn();
    }
    assert!(session.stats().autosaves >= 1);

    let text = fs::read_to_string(temp.path().join("autosave.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved["player"]["core"]["name"], "you");
}

#[test]
fn running_after_the_end_does_nothing() {
    let temp = TempDir::new().unwrap();
    let mut session = Session::new(
        SimConfig::new(),
        &ScenarioSpec::empty("alone"),
        temp.path(),
        Box::new(ScriptedInput::new([sim_core::PlayerAction::Quit])),
    )
    .unwrap();
    assert!(session.run_turn());
    let turn = session.world().now();
    assert!(session.run_turn());
    assert_eq!(session.world().now(), turn);
    assert_eq!(session.world().quit, QuitReason::Quit);
}

#[test]
fn content_directory_drives_the_session() {
    let data = TempDir::new().unwrap();
    let saves = TempDir::new().unwrap();
    fs::write(data.path().join("config.toml"), "seed = 99\n").unwrap();
    fs::create_dir_all(data.path().join("scenarios")).unwrap();
    fs::write(
        data.path().join("scenarios/yard.ron"),
        r#"(
            name: "yard",
            player: (name: "Riley", pos: (x: 6, y: 6, z: 0)),
            actors: [Zombie(pos: (x: 30, y: 6, z: 0))],
        )"#,
    )
    .unwrap();

    let session = Session::from_content(
        data.path(),
        "yard",
        saves.path(),
        Box::new(ScriptedInput::default()),
    )
    .unwrap();
    assert_eq!(session.world().config.seed, 99);
    assert_eq!(session.world().population(), 1);

    let missing = Session::from_content(
        data.path(),
        "nowhere",
        saves.path(),
        Box::new(ScriptedInput::default()),
    );
    assert!(matches!(missing, Err(RuntimeError::Content(_))));
}
