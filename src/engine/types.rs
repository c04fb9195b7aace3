//! Plain data records for the engine: players, items, loot boxes, monsters.
//!
//! These types carry no game rules beyond small invariant helpers; the rules
//! live in `combat`, `loot`, `world` and the dispatcher.

use serde::{Deserialize, Serialize};

/// Starting stats for a freshly created player.
pub const DEFAULT_HP: u32 = 10;
pub const DEFAULT_ATTACK: u64 = 2;
pub const DEFAULT_DEFENSE: u64 = 1;

/// A piece of gear. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub power: u64,
}

impl Item {
    pub fn new(name: impl Into<String>, power: u64) -> Self {
        Self {
            name: name.into(),
            power,
        }
    }

    /// Compact `Name(+power)` label used in listings.
    pub fn label(&self) -> String {
        format!("{}(+{})", self.name, self.power)
    }
}

/// An unopened loot box sitting in a player's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxedLoot {
    pub code: String,
    pub name: String,
    pub tier: u32,
}

/// One slot of the general inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryEntry {
    Item(Item),
    Box(BoxedLoot),
}

impl InventoryEntry {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            InventoryEntry::Item(item) => Some(item),
            InventoryEntry::Box(_) => None,
        }
    }

    pub fn as_box(&self) -> Option<&BoxedLoot> {
        match self {
            InventoryEntry::Box(boxed) => Some(boxed),
            InventoryEntry::Item(_) => None,
        }
    }
}

/// Equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

impl EquipSlot {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "weapon" | "w" => Some(EquipSlot::Weapon),
            "armor" | "armour" | "a" => Some(EquipSlot::Armor),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Armor => "armor",
        }
    }

    /// Short stat name the slot feeds.
    pub fn stat(self) -> &'static str {
        match self {
            EquipSlot::Weapon => "ATK",
            EquipSlot::Armor => "DEF",
        }
    }
}

/// Persistent player state.
///
/// `attack` and `defense` already include the bonuses of the equipped items;
/// equip and unequip adjust them symmetrically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u64,
    pub defense: u64,
    pub gold: u64,
    #[serde(default)]
    pub inventory: Vec<InventoryEntry>,
    #[serde(default)]
    pub equipped_weapon: Option<Item>,
    #[serde(default)]
    pub equipped_armor: Option<Item>,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hp: DEFAULT_HP,
            max_hp: DEFAULT_HP,
            attack: DEFAULT_ATTACK,
            defense: DEFAULT_DEFENSE,
            gold: 0,
            inventory: Vec::new(),
            equipped_weapon: None,
            equipped_armor: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Pull `hp` back under `max_hp`. Stored records are not trusted to hold it.
    pub fn clamp_hp(&mut self) {
        self.hp = self.hp.min(self.max_hp);
    }

    /// Apply damage, clamping at zero.
    pub fn take_damage(&mut self, amount: u64) {
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        self.hp = self.hp.saturating_sub(amount);
    }

    pub fn credit(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Remove `amount` gold if the player can afford it.
    pub fn debit(&mut self, amount: u64) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }

    /// Items (not boxes) in inventory order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.inventory.iter().filter_map(InventoryEntry::as_item)
    }

    /// Unopened boxes in inventory order.
    pub fn boxes(&self) -> impl Iterator<Item = &BoxedLoot> {
        self.inventory.iter().filter_map(InventoryEntry::as_box)
    }

    /// Inventory index of the `n`th item (1-based) in the items-only view.
    pub fn item_position(&self, n: usize) -> Option<usize> {
        self.inventory
            .iter()
            .enumerate()
            .filter(|(_, e)| e.as_item().is_some())
            .nth(n.checked_sub(1)?)
            .map(|(i, _)| i)
    }

    /// Inventory index of the `n`th box (1-based) in the boxes-only view.
    pub fn box_position(&self, n: usize) -> Option<usize> {
        self.inventory
            .iter()
            .enumerate()
            .filter(|(_, e)| e.as_box().is_some())
            .nth(n.checked_sub(1)?)
            .map(|(i, _)| i)
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&Item> {
        match slot {
            EquipSlot::Weapon => self.equipped_weapon.as_ref(),
            EquipSlot::Armor => self.equipped_armor.as_ref(),
        }
    }

    /// Remove and return the `n`th item (1-based, items-only view).
    pub fn take_item(&mut self, n: usize) -> Option<Item> {
        let pos = self.item_position(n)?;
        match self.inventory.remove(pos) {
            InventoryEntry::Item(item) => Some(item),
            other => {
                self.inventory.insert(pos, other);
                None
            }
        }
    }

    /// Remove and return the `n`th box (1-based, boxes-only view).
    pub fn take_box(&mut self, n: usize) -> Option<BoxedLoot> {
        let pos = self.box_position(n)?;
        match self.inventory.remove(pos) {
            InventoryEntry::Box(boxed) => Some(boxed),
            other => {
                self.inventory.insert(pos, other);
                None
            }
        }
    }

    fn stat_mut(&mut self, slot: EquipSlot) -> &mut u64 {
        match slot {
            EquipSlot::Weapon => &mut self.attack,
            EquipSlot::Armor => &mut self.defense,
        }
    }

    /// Put `item` in `slot`, adding its power to the slot's stat. A previously
    /// equipped item has its power subtracted and goes back to the inventory;
    /// it is also returned.
    pub fn equip(&mut self, slot: EquipSlot, item: Item) -> Option<Item> {
        let power = item.power;
        let previous = match slot {
            EquipSlot::Weapon => self.equipped_weapon.replace(item),
            EquipSlot::Armor => self.equipped_armor.replace(item),
        };
        let stat = self.stat_mut(slot);
        if let Some(old) = &previous {
            *stat = stat.saturating_sub(old.power);
        }
        *stat = stat.saturating_add(power);
        if let Some(old) = &previous {
            self.inventory.push(InventoryEntry::Item(old.clone()));
        }
        previous
    }
}

/// The current encounter. Lives only inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monster {
    pub biome: String,
    pub tier: u32,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u64,
    pub defense: u64,
}

impl Monster {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn take_damage(&mut self, amount: u64) {
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        self.hp = self.hp.saturating_sub(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked() -> Player {
        let mut p = Player::new("t", "Tester");
        p.inventory = vec![
            InventoryEntry::Box(BoxedLoot {
                code: "tin".into(),
                name: "Tin Trove".into(),
                tier: 1,
            }),
            InventoryEntry::Item(Item::new("Scrap", 2)),
            InventoryEntry::Box(BoxedLoot {
                code: "iron".into(),
                name: "Iron Hoard".into(),
                tier: 2,
            }),
            InventoryEntry::Item(Item::new("Curio", 3)),
        ];
        p
    }

    #[test]
    fn new_player_defaults() {
        let p = Player::new("pid", "Wanderer");
        assert_eq!((p.hp, p.max_hp, p.attack, p.defense, p.gold), (10, 10, 2, 1, 0));
        assert!(p.inventory.is_empty());
        assert!(p.is_alive());
    }

    #[test]
    fn filtered_views_index_correctly() {
        let p = stocked();
        assert_eq!(p.items().count(), 2);
        assert_eq!(p.boxes().count(), 2);
        assert_eq!(p.item_position(1), Some(1));
        assert_eq!(p.item_position(2), Some(3));
        assert_eq!(p.item_position(3), None);
        assert_eq!(p.item_position(0), None);
        assert_eq!(p.box_position(2), Some(2));
    }

    #[test]
    fn hp_and_gold_never_go_negative() {
        let mut p = Player::new("pid", "W");
        p.take_damage(50);
        assert_eq!(p.hp, 0);
        p.clamp_hp();
        assert_eq!(p.hp, 0);
        p.hp = p.max_hp + 40;
        p.clamp_hp();
        assert_eq!(p.hp, p.max_hp);
        assert!(!p.debit(1));
        p.credit(5);
        assert!(p.debit(5));
        assert_eq!(p.gold, 0);
    }

    #[test]
    fn take_removes_only_the_selected_kind() {
        let mut p = stocked();
        assert_eq!(p.take_item(2), Some(Item::new("Curio", 3)));
        assert_eq!(p.take_box(1).map(|b| b.code), Some("tin".to_string()));
        assert_eq!(p.take_item(5), None);
        assert_eq!(p.inventory.len(), 2);
    }

    #[test]
    fn equip_swaps_symmetrically() {
        let mut p = Player::new("pid", "W");
        assert_eq!(p.equip(EquipSlot::Weapon, Item::new("Scrap", 2)), None);
        assert_eq!(p.attack, DEFAULT_ATTACK + 2);
        let old = p.equip(EquipSlot::Weapon, Item::new("Relic", 14));
        assert_eq!(old, Some(Item::new("Scrap", 2)));
        assert_eq!(p.attack, DEFAULT_ATTACK + 14);
        assert_eq!(p.items().collect::<Vec<_>>(), vec![&Item::new("Scrap", 2)]);
        p.equip(EquipSlot::Armor, Item::new("Curio", 6));
        assert_eq!(p.defense, DEFAULT_DEFENSE + 6);
        assert_eq!(p.attack, DEFAULT_ATTACK + 14);
    }

    #[test]
    fn inventory_entries_are_tagged_in_json() {
        let json = serde_json::to_value(InventoryEntry::Item(Item::new("Scrap", 4))).unwrap();
        assert_eq!(json["kind"], "item");
        assert_eq!(json["power"], 4);
        let back: InventoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, InventoryEntry::Item(Item::new("Scrap", 4)));
    }
}
