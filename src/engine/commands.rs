//! Session state and the line-oriented command dispatcher.
//!
//! One line in, one response out. Commands are a flat table over a single
//! mutable [`GameState`]; the only state carried between commands is the
//! current monster, the cached shop offers, and a pending shrine offer.
//!
//! Input errors (bad index, missing prerequisite, unknown command) are plain
//! responses that leave the state untouched. Only `quit`/`exit` end a session.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use log::debug;

use super::combat::{exchange, spawn_monster};
use super::flavor::{bestiary_entry, FlavorSource, NoFlavor};
use super::loot::{open_box, shop_offers, shrine_offers, LootBox, SHRINE_CHOICES};
use super::rng::rng_for;
use super::types::{BoxedLoot, EquipSlot, InventoryEntry, Monster, Player};
use super::world::{exits, render_map, step, zone_at, Direction, MapSize};
use crate::logutil::escape_log;

/// Cycle tag used until the caller supplies one.
pub const DEFAULT_CYCLE: &str = "genesis";

pub const FAREWELL: &str = "Farewell, wanderer.";
pub const NOT_IMPLEMENTED: &str = "That system is not implemented yet in this scaffold.";
pub const UNKNOWN: &str = "Unknown command. Try 'help'.";

const FISH_FINDS: [&str; 4] = ["a bone hook", "a tangle of hair", "a pale minnow", "nothing"];

/// Shop offers computed for one cycle tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopCache {
    pub cycle: String,
    pub offers: Vec<LootBox>,
}

/// Everything one player's session knows. Only `player` is persisted.
pub struct GameState {
    pub player: Player,
    pub size: MapSize,
    pub pos: (i32, i32),
    pub visited: HashSet<(i32, i32)>,
    pub cycle: String,
    pub shop: Option<ShopCache>,
    pub discovered: BTreeSet<String>,
    pub shrine: Option<[LootBox; SHRINE_CHOICES]>,
    pub current: Option<Monster>,
    flavor: Arc<dyn FlavorSource>,
}

impl GameState {
    /// Fresh session on the default 7x5 viewport, standing at its center.
    pub fn new(player: Player) -> Self {
        let size = MapSize::default();
        let pos = size.center();
        Self {
            player,
            size,
            pos,
            visited: HashSet::from([pos]),
            cycle: DEFAULT_CYCLE.to_string(),
            shop: None,
            discovered: BTreeSet::new(),
            shrine: None,
            current: None,
            flavor: Arc::new(NoFlavor),
        }
    }

    /// Use a different viewport. Resets position to its center.
    pub fn with_map_size(mut self, size: MapSize) -> Self {
        self.size = size;
        self.pos = size.center();
        self.visited = HashSet::from([self.pos]);
        self
    }

    pub fn with_cycle(mut self, cycle: impl Into<String>) -> Self {
        self.cycle = cycle.into();
        self
    }

    pub fn with_flavor(mut self, flavor: Arc<dyn FlavorSource>) -> Self {
        self.flavor = flavor;
        self
    }

    /// Move to a new cycle tag. Cached shop offers from another cycle are
    /// ignored from then on.
    pub fn set_cycle(&mut self, cycle: &str) {
        if self.cycle != cycle {
            debug!("cycle {} -> {}", self.cycle, escape_log(cycle));
            self.cycle = cycle.to_string();
        }
    }

    /// Offers cached for the current cycle, if any.
    pub fn current_offers(&self) -> Option<&[LootBox]> {
        self.shop
            .as_ref()
            .filter(|c| c.cycle == self.cycle)
            .map(|c| c.offers.as_slice())
    }
}

/// Interpret one line of input. Returns the response and whether the session
/// is over.
pub fn dispatch(gs: &mut GameState, line: &str) -> (String, bool) {
    debug!(
        "dispatch player={} line='{}'",
        escape_log(&gs.player.id),
        escape_log(line)
    );
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return ("Say something. Try 'help'.".to_string(), false);
    };
    let args: Vec<&str> = tokens.collect();
    let cmd = head.strip_prefix('!').unwrap_or(head).to_lowercase();

    let out = match cmd.as_str() {
        "quit" | "exit" => return (FAREWELL.to_string(), true),
        "help" => help_text().to_string(),
        "stats" => stats_line(&gs.player),
        "attack" => do_attack(gs),
        "fish" => do_fish(gs),
        "inv" => render_inventory(&gs.player),
        "bestiary" => do_bestiary(gs, &args),
        "shop" => do_shop(gs),
        "buy" => do_buy(gs, args.first().copied()),
        "open" => do_open(gs, args.first().copied()),
        "shrine" => do_shrine(gs),
        "take" => do_take(gs, args.first().copied()),
        "equip" => do_equip(gs, &args),
        "sell" => do_sell(gs, args.first().copied()),
        "zone" => describe_zone(gs),
        "map" => render_map(&gs.player.id, gs.size, gs.pos),
        "travel" => do_travel(gs, args.first().copied()),
        "farm" => NOT_IMPLEMENTED.to_string(),
        _ => UNKNOWN.to_string(),
    };
    (out, false)
}

pub fn help_text() -> &'static str {
    "Commands: help, stats, attack, fish, inv, bestiary [name], shop, buy <n>, open <n>, \
     shrine, take <n>, equip <n> [weapon|armor], sell <n>, zone, map, travel <n|s|e|w>, farm, quit"
}

pub fn stats_line(p: &Player) -> String {
    format!(
        "{}: HP {}/{}, ATK {}, DEF {}, GOLD {}",
        p.name, p.hp, p.max_hp, p.attack, p.defense, p.gold
    )
}

/// 1-based selection within `1..=len`.
fn parse_index(arg: &str, len: usize) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|n| (1..=len).contains(n))
}

fn do_attack(gs: &mut GameState) -> String {
    let fresh = !gs.current.as_ref().is_some_and(Monster::is_alive);
    if fresh {
        let biome = zone_at(&gs.player.id, gs.pos, gs.size).biome;
        let monster = spawn_monster(&gs.player.id, biome.name());
        debug!(
            "spawned {} (tier {}) for {}",
            monster.name,
            monster.tier,
            escape_log(&gs.player.id)
        );
        gs.discovered.insert(monster.name.clone());
        gs.current = Some(monster);
    }
    let Some(monster) = gs.current.as_mut() else {
        return UNKNOWN.to_string();
    };
    let out = exchange(&mut gs.player, monster);
    if !monster.is_alive() {
        gs.current = None;
    }
    out
}

fn do_fish(gs: &GameState) -> String {
    let mut rng = rng_for(&[&gs.player.id, &"fish"]);
    format!(
        "You cast into black water and pull up {}.",
        rng.pick(&FISH_FINDS)
    )
}

fn box_label(b: &BoxedLoot) -> String {
    format!("{}[T{}]", b.name, b.tier)
}

pub fn render_inventory(p: &Player) -> String {
    fn numbered(labels: Vec<String>) -> String {
        if labels.is_empty() {
            return "(none)".to_string();
        }
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| format!("{}:{}", i + 1, l))
            .collect::<Vec<_>>()
            .join(", ")
    }

    let boxes = numbered(p.boxes().map(box_label).collect());
    let items = numbered(p.items().map(|it| it.label()).collect());
    let slot = |s: EquipSlot| {
        p.equipped(s)
            .map(|it| it.label())
            .unwrap_or_else(|| "-".to_string())
    };
    format!(
        "Boxes: {}\nItems: {}\nEquipped: weapon {}, armor {}",
        boxes,
        items,
        slot(EquipSlot::Weapon),
        slot(EquipSlot::Armor)
    )
}

fn do_bestiary(gs: &GameState, args: &[&str]) -> String {
    if args.is_empty() {
        if gs.discovered.is_empty() {
            return "Your bestiary is empty. Fight something first.".to_string();
        }
        let names: Vec<&str> = gs.discovered.iter().map(String::as_str).collect();
        return format!("Discovered: {}", names.join(", "));
    }
    let wanted = args.join(" ");
    let name = gs
        .discovered
        .iter()
        .find(|n| n.eq_ignore_ascii_case(&wanted))
        .cloned()
        .unwrap_or(wanted);
    bestiary_entry(gs.flavor.as_ref(), &name)
}

fn list_offers(offers: &[LootBox]) -> String {
    offers
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{}. {} (T{}) - {}g", i + 1, b.name, b.tier, b.price))
        .collect::<Vec<_>>()
        .join("\n")
}

fn do_shop(gs: &mut GameState) -> String {
    if gs.current_offers().is_none() {
        gs.shop = Some(ShopCache {
            cycle: gs.cycle.clone(),
            offers: shop_offers(&gs.player.id, &gs.cycle),
        });
    }
    let offers = gs.current_offers().unwrap_or_default();
    format!(
        "The shop for {}:\n{}\nUse 'buy <n>'.",
        gs.cycle,
        list_offers(offers)
    )
}

fn do_buy(gs: &mut GameState, arg: Option<&str>) -> String {
    let Some(offers) = gs.current_offers() else {
        return "Nothing on offer. Check the 'shop' first.".to_string();
    };
    let Some(arg) = arg else {
        return "Usage: buy <n>".to_string();
    };
    let Some(n) = parse_index(arg, offers.len()) else {
        return format!("Pick an offer between 1 and {}.", offers.len());
    };
    let offer = offers[n - 1];
    if !gs.player.debit(offer.price) {
        return format!(
            "You cannot afford the {} ({}g; you have {}g).",
            offer.name, offer.price, gs.player.gold
        );
    }
    gs.player
        .inventory
        .push(InventoryEntry::Box(BoxedLoot::from(&offer)));
    format!("Purchased {} for {}g.", offer.name, offer.price)
}

fn do_open(gs: &mut GameState, arg: Option<&str>) -> String {
    let count = gs.player.boxes().count();
    if count == 0 {
        return "You have no boxes to open.".to_string();
    }
    let Some(arg) = arg else {
        return "Usage: open <n>".to_string();
    };
    let Some(boxed) = parse_index(arg, count).and_then(|n| gs.player.take_box(n)) else {
        return format!("Pick a box between 1 and {}.", count);
    };
    let rewards = open_box(&gs.player.id, &boxed, "open");
    let labels: Vec<String> = rewards.iter().map(|it| it.label()).collect();
    gs.player
        .inventory
        .extend(rewards.into_iter().map(InventoryEntry::Item));
    format!("You open the {} and find: {}.", boxed.name, labels.join(", "))
}

fn do_shrine(gs: &mut GameState) -> String {
    let offers = shrine_offers(&gs.player.id, &gs.cycle);
    gs.shrine = Some(offers);
    format!(
        "A shrine hums in the dark. Choose:\n{}\nUse 'take <n>'.",
        list_offers(&offers)
    )
}

fn do_take(gs: &mut GameState, arg: Option<&str>) -> String {
    let Some(offers) = gs.shrine else {
        return "There are no shrine choices waiting. Find a 'shrine' first.".to_string();
    };
    let Some(n) = arg.and_then(|a| parse_index(a, offers.len())) else {
        return format!("Take one of 1-{}.", offers.len());
    };
    let chosen = offers[n - 1];
    gs.player
        .inventory
        .push(InventoryEntry::Box(BoxedLoot::from(&chosen)));
    gs.shrine = None;
    format!("You receive a {}.", chosen.name)
}

/// Accepts `equip <n> [slot]` and `equip [slot] <n>`; slot defaults to weapon.
fn do_equip(gs: &mut GameState, args: &[&str]) -> String {
    let mut slot = None;
    let mut index = None;
    for arg in args {
        if let Some(s) = EquipSlot::parse(arg) {
            slot = Some(s);
        } else if let Ok(n) = arg.parse::<usize>() {
            index = Some(n);
        } else {
            return "Usage: equip <n> [weapon|armor]".to_string();
        }
    }
    let Some(n) = index else {
        return NOT_IMPLEMENTED.to_string();
    };
    let slot = slot.unwrap_or(EquipSlot::Weapon);
    let Some(item) = gs.player.take_item(n) else {
        return format!("No item #{}. Check 'inv'.", n);
    };
    let label = item.label();
    let previous = gs.player.equip(slot, item);
    let stat = match slot {
        EquipSlot::Weapon => gs.player.attack,
        EquipSlot::Armor => gs.player.defense,
    };
    let mut out = format!(
        "Equipped {} as {} ({} {}).",
        label,
        slot.label(),
        slot.stat(),
        stat
    );
    if let Some(old) = previous {
        out.push_str(&format!(" {} returns to your pack.", old.label()));
    }
    out
}

fn do_sell(gs: &mut GameState, arg: Option<&str>) -> String {
    let Some(arg) = arg else {
        return NOT_IMPLEMENTED.to_string();
    };
    let Some(item) = arg.parse::<usize>().ok().and_then(|n| gs.player.take_item(n)) else {
        return format!("No item #{}. Check 'inv'.", arg);
    };
    let price = item.power.max(1);
    gs.player.credit(price);
    format!("Sold {} for {}g.", item.name, price)
}

fn exit_list(gs: &GameState) -> String {
    let names: Vec<&str> = exits(gs.pos, gs.size).iter().map(|d| d.name()).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn describe_zone(gs: &GameState) -> String {
    let zone = zone_at(&gs.player.id, gs.pos, gs.size);
    format!(
        "You stand in the {} ({}, tier {}) at {},{}.\nExits: {}",
        zone.name,
        zone.biome,
        zone.tier,
        zone.x,
        zone.y,
        exit_list(gs)
    )
}

fn do_travel(gs: &mut GameState, arg: Option<&str>) -> String {
    let Some(arg) = arg else {
        return "Usage: travel <n|s|e|w>".to_string();
    };
    let Some(dir) = Direction::parse(arg) else {
        return format!("'{}' is not a direction. Use n, s, e or w.", arg);
    };
    let Some(next) = step(gs.pos, dir, gs.size) else {
        return format!("You cannot go {}; the mist is impassable there.", dir.name());
    };
    gs.pos = next;
    gs.visited.insert(next);
    let zone = zone_at(&gs.player.id, gs.pos, gs.size);
    format!(
        "You travel {} into the {} ({}, tier {}).\nExits: {}",
        dir.name(),
        zone.name,
        zone.biome,
        zone.tier,
        exit_list(gs)
    )
}
