//! One attack exchange between the player and the current monster.
//!
//! Swings are `max(0, attack - defense + jitter)` with a 0-1 jitter drawn from
//! a per-attacker seed key. HP is clamped at zero on both sides.

use super::rng::rng_for;
use super::types::{Monster, Player};

/// The only species in the current bestiary.
pub const SPAWN_NAME: &str = "Carrion Rat";

/// Deterministic spawn for `player_id` in `biome`: tier 1 or 2.
pub fn spawn_monster(player_id: &str, biome: &str) -> Monster {
    let mut rng = rng_for(&[&player_id, &"spawn", &biome]);
    let tier = 1 + rng.roll(0..=1u32);
    let hp = 5 + tier;
    Monster {
        biome: biome.to_string(),
        tier,
        name: SPAWN_NAME.to_string(),
        hp,
        max_hp: hp,
        attack: 1 + u64::from(tier / 2),
        defense: 0,
    }
}

fn swing(attack: u64, defense: u64, jitter: u64) -> u64 {
    attack.saturating_add(jitter).saturating_sub(defense)
}

/// Player strikes the monster.
pub fn player_attack(player: &Player, monster: &mut Monster) -> String {
    let mut rng = rng_for(&[&player.id, &"combat", &monster.name]);
    let dmg = swing(player.attack, monster.defense, rng.roll(0..=1));
    monster.take_damage(dmg);
    if monster.is_alive() {
        format!(
            "You strike for {}. {} has {}/{}.",
            dmg, monster.name, monster.hp, monster.max_hp
        )
    } else {
        format!("You strike for {}. The {} falls.", dmg, monster.name)
    }
}

/// Monster counter-attacks the player.
pub fn monster_attack(player: &mut Player, monster: &Monster) -> String {
    let mut rng = rng_for(&[&"monster", &monster.name, &player.id]);
    let dmg = swing(monster.attack, player.defense, rng.roll(0..=1));
    player.take_damage(dmg);
    if player.is_alive() {
        format!(
            "{} hits for {}. You have {}/{}.",
            monster.name, dmg, player.hp, player.max_hp
        )
    } else {
        format!("{} hits for {}. You fall.", monster.name, dmg)
    }
}

/// Full exchange: the player strikes, and a surviving monster strikes back.
/// A killing blow returns only the strike line.
pub fn exchange(player: &mut Player, monster: &mut Monster) -> String {
    let strike = player_attack(player, monster);
    if !monster.is_alive() {
        return strike;
    }
    let counter = monster_attack(player, monster);
    format!("{}\n{}", strike, counter)
}
