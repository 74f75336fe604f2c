//! Integration tests for whole-level generation and persistence.

use proptest::prelude::*;
use std::collections::BTreeSet;
use tempfile::tempdir;
use warren::generation::utils;
use warren::{
    AngbandLevelGenerator, CavernGenerator, ConnectOptions, GeneratedLevel, GenerationConfig,
    GenerationGrid, Generator, Level, NoiseKind, Terrain, TownGenerator, TunnelStyle,
};

fn generate(config: &GenerationConfig) -> GeneratedLevel {
    let mut rng = utils::create_rng(config);
    AngbandLevelGenerator::new()
        .generate(config, &mut rng)
        .expect("generation should succeed")
}

fn assert_playable(generated: &GeneratedLevel) {
    let level = &generated.level;
    let spawn = level.player_spawn.expect("level should have a spawn point");
    assert!(level.terrain_at(spawn).unwrap().is_passable());
    for &stair in level.stairs_down.iter().chain(level.stairs_up.iter()) {
        assert!(level.terrain_at(stair).unwrap().is_passable());
    }
    assert!(generated.connected);
    let mut anchors = generated.grid.centers().clone();
    anchors.insert(spawn);
    assert_eq!(level.passable_components(&anchors), 1);
}

#[test]
fn test_same_seed_same_level() {
    let config = GenerationConfig::for_testing(31337);
    assert_eq!(generate(&config), generate(&config));

    let other = generate(&GenerationConfig::for_testing(31338));
    assert_ne!(generate(&config).level, other.level);
}

#[test]
fn test_cavern_generation_is_deterministic() {
    let run = || {
        let mut level = Level::new(0, 60, 50);
        let mut grid = GenerationGrid::new(60, 50);
        let mut rng = utils::create_rng(&GenerationConfig::new(8));
        let centers = CavernGenerator::new(40, 30, 1)
            .create(&mut level, &mut grid, &ConnectOptions::default(), &mut rng)
            .unwrap();
        (level, grid, centers)
    };

    assert_eq!(run(), run());
}

#[test]
fn test_filled_cavern_survives_mutation() {
    let mut grid = GenerationGrid::new(30, 30);
    let area = warren::Rect::new(10, 10, 10, 10);
    for pos in area.positions() {
        grid.set_room(pos, true);
    }
    let before = grid.clone();

    for _ in 0..4 {
        warren::mutate_cavern(&mut grid, area);
    }

    assert_eq!(grid, before);
}

#[test]
fn test_full_size_level() {
    let config = GenerationConfig::new(2);
    let generated = generate(&config);

    assert_eq!(generated.level.width, 120);
    assert_eq!(generated.level.height, 120);
    assert!(generated.grid.centers().len() >= 5);
    assert_playable(&generated);
}

#[test]
fn test_cavern_level() {
    let config = GenerationConfig::for_caverns(77);
    let generated = generate(&config);
    assert_playable(&generated);
}

#[test]
fn test_vault_level_reaches_vault() {
    let config = GenerationConfig {
        vault_every: 1,
        vault_width: 16,
        vault_height: 12,
        ..GenerationConfig::for_testing(12)
    };
    let generated = generate(&config);

    assert!(generated.level.count_terrain(Terrain::PermanentWall) > 2 * (60 + 40));
    assert_playable(&generated);
    assert!(!generated.grid.vault_centers().is_empty());
    for &vault_center in generated.grid.vault_centers() {
        let anchors: BTreeSet<_> = generated
            .grid
            .centers()
            .iter()
            .copied()
            .chain([vault_center])
            .collect();
        assert_eq!(generated.level.passable_components(&anchors), 1);
    }
}

#[test]
fn test_every_style_and_noise() {
    for style in [TunnelStyle::AStar, TunnelStyle::Angband] {
        for noise in [
            NoiseKind::None,
            NoiseKind::Random,
            NoiseKind::Block,
            NoiseKind::Perlin,
        ] {
            let config = GenerationConfig {
                tunnel_style: style,
                noise,
                ..GenerationConfig::for_testing(400)
            };
            assert_playable(&generate(&config));
        }
    }
}

#[test]
fn test_legacy_double_pass() {
    let config = GenerationConfig {
        legacy_double_pass: true,
        ..GenerationConfig::for_testing(90)
    };
    let generated = generate(&config);
    assert_playable(&generated);
}

#[test]
fn test_town_generator() {
    let config = GenerationConfig::new(1);
    let mut rng = utils::create_rng(&config);
    let generated = TownGenerator::new().generate(&config, &mut rng).unwrap();

    assert!(generated.connected);
    assert_eq!(generated.level.stairs_down.len(), 1);
    assert_playable(&generated);
}

#[test]
fn test_level_json_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("level.json");
    let level = generate(&GenerationConfig::for_testing(5)).level;

    level.save_json(&path).unwrap();
    let loaded = Level::load_json(&path).unwrap();

    assert_eq!(loaded, level);
    assert_eq!(loaded.to_ascii(), level.to_ascii());
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warren.json");
    let config = GenerationConfig {
        depth: 9,
        tunnel_style: TunnelStyle::Angband,
        noise: NoiseKind::Perlin,
        ..GenerationConfig::for_caverns(64)
    };

    config.save(&path).unwrap();
    assert_eq!(GenerationConfig::load(&path).unwrap(), config);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"width": 4, "height": 4}"#).unwrap();

    assert!(GenerationConfig::load(&path).is_err());
    assert!(GenerationConfig::load(&dir.path().join("missing.json")).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn generated_levels_are_playable(seed in any::<u64>(), depth in 0u32..13) {
        let config = GenerationConfig {
            depth,
            cavern_every: 5,
            cavern_width: 30,
            cavern_height: 20,
            ..GenerationConfig::for_testing(seed)
        };
        let mut rng = utils::create_rng(&config);
        let generated = AngbandLevelGenerator::new().generate(&config, &mut rng);

        prop_assert!(generated.is_ok());
        let generated = generated.unwrap();
        prop_assert!(generated.level.player_spawn.is_some());
        if generated.connected {
            prop_assert_eq!(generated.level.passable_components(generated.grid.centers()), 1);
        }
    }
}
