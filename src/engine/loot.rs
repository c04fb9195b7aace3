//! Loot boxes and the rotating shop.
//!
//! The box catalog is static content. Which boxes a player is offered, and what
//! falls out of a box, is derived from seed keys:
//! - shop:   `("shop", player_id, cycle)`
//! - reward: `("loot", player_id, box.code, box.tier, salt)`
//!
//! Reward power scales exponentially with box tier and has no cap. Late-game
//! numbers are meant to get absurd.

use super::rng::rng_for;
use super::types::{BoxedLoot, Item};

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LootBox {
    pub code: &'static str,
    pub name: &'static str,
    pub tier: u32,
    pub price: u64,
}

impl From<&LootBox> for BoxedLoot {
    fn from(b: &LootBox) -> Self {
        BoxedLoot {
            code: b.code.to_string(),
            name: b.name.to_string(),
            tier: b.tier,
        }
    }
}

/// The box pool. Selection indexes into it positionally, so entries must only
/// ever be appended.
pub const POOL: [LootBox; 12] = [
    LootBox { code: "copper", name: "Copper Cache", tier: 1, price: 5 },
    LootBox { code: "tin", name: "Tin Trove", tier: 1, price: 9 },
    LootBox { code: "iron", name: "Iron Hoard", tier: 2, price: 20 },
    LootBox { code: "silver", name: "Silver Reliquary", tier: 2, price: 35 },
    LootBox { code: "gold", name: "Gilded Reliquary", tier: 3, price: 60 },
    LootBox { code: "obs", name: "Obsidian Reliquary", tier: 3, price: 90 },
    LootBox { code: "myth", name: "Mythril Reliquary", tier: 4, price: 140 },
    LootBox { code: "eld", name: "Elder Reliquary", tier: 5, price: 220 },
    LootBox { code: "abyss", name: "Abyssal Reliquary", tier: 6, price: 360 },
    LootBox { code: "void", name: "Void Reliquary", tier: 7, price: 580 },
    LootBox { code: "star", name: "Starborn Reliquary", tier: 8, price: 900 },
    LootBox { code: "apex", name: "Apex Reliquary", tier: 9, price: 1400 },
];

/// Look up a catalog entry by code.
pub fn find_box(code: &str) -> Option<&'static LootBox> {
    POOL.iter().find(|b| b.code == code)
}

/// Deterministic 1-3 distinct offers for `(player_id, cycle)`, cheapest first.
///
/// `cycle` is any caller-supplied tag; a `YYYY-MM-DD` date gives a daily shop.
pub fn shop_offers(player_id: &str, cycle: &str) -> Vec<LootBox> {
    let mut rng = rng_for(&[&"shop", &player_id, &cycle]);
    let count: usize = rng.roll(1..=3);
    let mut remaining: Vec<usize> = (0..POOL.len()).collect();
    let mut picks = Vec::with_capacity(count);
    for _ in 0..count {
        if remaining.is_empty() {
            break;
        }
        let i = rng.roll(0..=remaining.len() - 1);
        picks.push(POOL[remaining.remove(i)]);
    }
    // Display order only; the draws above already happened.
    picks.sort_by_key(|b| b.price);
    picks
}

/// Reward rarity bands for a 0-99 roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

impl Rarity {
    pub fn from_roll(roll: u32) -> Self {
        match roll {
            0..=59 => Rarity::Common,
            60..=89 => Rarity::Uncommon,
            _ => Rarity::Rare,
        }
    }

    pub fn item_name(self) -> &'static str {
        match self {
            Rarity::Common => "Scrap",
            Rarity::Uncommon => "Curio",
            Rarity::Rare => "Relic",
        }
    }

    /// Power multiple of a common drop.
    pub fn multiplier(self) -> u64 {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 3,
            Rarity::Rare => 7,
        }
    }
}

/// Power of a common drop from a box of `tier`: `(1 + tier) * 2^max(0, tier - 1)`.
pub fn common_power(tier: u32) -> u64 {
    let base = 1 + u64::from(tier);
    let mult = 2u64.saturating_pow(tier.saturating_sub(1));
    base.saturating_mul(mult)
}

/// Deterministic 1-3 rewards for opening `boxed`.
pub fn open_box(player_id: &str, boxed: &BoxedLoot, salt: &str) -> Vec<Item> {
    let mut rng = rng_for(&[&"loot", &player_id, &boxed.code, &boxed.tier, &salt]);
    let common = common_power(boxed.tier);
    let k: u32 = rng.roll(1..=3);
    (0..k)
        .map(|_| {
            let rarity = Rarity::from_roll(rng.roll(0..=99));
            Item::new(rarity.item_name(), common.saturating_mul(rarity.multiplier()))
        })
        .collect()
}

/// Number of choices a shrine presents.
pub const SHRINE_CHOICES: usize = 3;

/// Extra salted shop draws a shrine may make before falling back to catalog order.
const SHRINE_EXTRA_DRAWS: u32 = 32;

/// Shrine offers live in their own namespace of the shop cycle.
pub fn shrine_cycle(cycle: &str) -> String {
    format!("shrine:{}", cycle)
}

/// Exactly three distinct boxes for a shrine visit.
///
/// Draws shop offers under the shrine cycle tag, then under `<tag>:1`,
/// `<tag>:2`, ... until three distinct boxes are collected.
pub fn shrine_offers(player_id: &str, cycle: &str) -> [LootBox; SHRINE_CHOICES] {
    fn absorb(batch: Vec<LootBox>, picks: &mut Vec<LootBox>) {
        for b in batch {
            if picks.len() < SHRINE_CHOICES && !picks.contains(&b) {
                picks.push(b);
            }
        }
    }

    let tag = shrine_cycle(cycle);
    let mut picks: Vec<LootBox> = Vec::with_capacity(SHRINE_CHOICES);
    absorb(shop_offers(player_id, &tag), &mut picks);
    let mut salt = 1;
    while picks.len() < SHRINE_CHOICES && salt <= SHRINE_EXTRA_DRAWS {
        absorb(shop_offers(player_id, &format!("{}:{}", tag, salt)), &mut picks);
        salt += 1;
    }
    absorb(POOL.to_vec(), &mut picks);
    [picks[0], picks[1], picks[2]]
}
