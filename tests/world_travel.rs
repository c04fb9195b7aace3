//! Zone description, the map and travel through the dispatcher.

mod common;

use abysm::engine::world::{zone_at, MapSize};
use abysm::engine::{GameState, Player};
use common::{fresh_state, run};

#[test]
fn travel_stops_at_the_edge() {
    let mut gs = fresh_state("walker");
    assert_eq!(gs.pos, (3, 2));

    assert!(run(&mut gs, "travel n").starts_with("You travel north into the "));
    assert!(run(&mut gs, "travel north").starts_with("You travel north"));
    assert_eq!(gs.pos, (3, 0));

    let out = run(&mut gs, "travel n");
    assert!(out.starts_with("You cannot go north"), "{}", out);
    assert_eq!(gs.pos, (3, 0));
    assert_eq!(gs.visited.len(), 3);
}

#[test]
fn travel_rejects_bad_directions() {
    let mut gs = fresh_state("walker");
    assert_eq!(run(&mut gs, "travel"), "Usage: travel <n|s|e|w>");
    assert!(run(&mut gs, "travel up").contains("not a direction"));
    assert_eq!(gs.pos, (3, 2));
}

#[test]
fn zone_matches_the_generator() {
    let mut gs = fresh_state("walker");
    run(&mut gs, "travel e");
    let zone = zone_at("walker", gs.pos, gs.size);
    let out = run(&mut gs, "zone");
    assert!(out.starts_with(&format!(
        "You stand in the {} ({}, tier {}) at {},{}.",
        zone.name, zone.biome, zone.tier, zone.x, zone.y
    )));
    assert!(out.contains("Exits: north, south, west, east"));
}

#[test]
fn corner_exits_are_limited() {
    let mut gs = GameState::new(Player::new("walker", "W")).with_map_size(MapSize::new(3, 3));
    run(&mut gs, "travel n");
    run(&mut gs, "travel w");
    assert_eq!(gs.pos, (0, 0));
    let out = run(&mut gs, "zone");
    assert!(out.ends_with("Exits: south, east"), "{}", out);
}

#[test]
fn map_marks_the_player_and_is_stable() {
    let mut a = fresh_state("walker");
    let mut b = fresh_state("walker");
    let map = run(&mut a, "map");
    assert_eq!(map, run(&mut b, "map"));

    let lines: Vec<&str> = map.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[..5].iter().all(|row| row.chars().count() == 7));
    assert_eq!(lines[2].chars().nth(3), Some('@'));
    assert_eq!(map.matches('@').count(), 1);

    run(&mut a, "travel s");
    let moved = run(&mut a, "map");
    assert_eq!(moved.lines().nth(3).and_then(|r| r.chars().nth(3)), Some('@'));
}

#[test]
fn different_players_see_different_worlds() {
    let maps: std::collections::HashSet<String> = (0..8)
        .map(|i| run(&mut fresh_state(&format!("p{}", i)), "map"))
        .collect();
    assert!(maps.len() > 1);
}
