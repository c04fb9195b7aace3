//! World generation: zones as a pure function of (player, x, y), a bounded
//! viewport map, and compass movement inside it.
//!
//! Zones are never stored. Asking for the same coordinates twice re-derives the
//! same zone from its seed key `("zone", player_id, x, y)`.

use std::fmt;

use super::rng::rng_for;

/// Biomes in their fixed enumeration order. Order matters: the biome draw
/// indexes into this list and the map legend follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Biome {
    Wastes,
    Fen,
    Heath,
    Moor,
    Ashwood,
    Saltplain,
}

pub const BIOMES: [Biome; 6] = [
    Biome::Wastes,
    Biome::Fen,
    Biome::Heath,
    Biome::Moor,
    Biome::Ashwood,
    Biome::Saltplain,
];

impl Biome {
    pub fn name(self) -> &'static str {
        match self {
            Biome::Wastes => "wastes",
            Biome::Fen => "fen",
            Biome::Heath => "heath",
            Biome::Moor => "moor",
            Biome::Ashwood => "ashwood",
            Biome::Saltplain => "saltplain",
        }
    }

    /// Map glyph: first letter of the name.
    pub fn letter(self) -> char {
        self.name().chars().next().unwrap_or('?')
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const ADJECTIVES: [&str; 6] = [
    "ashen",
    "bleak",
    "sodden",
    "howling",
    "salt-bitten",
    "ironbound",
];
const NOUNS: [&str; 7] = ["barrow", "copse", "ridge", "sink", "trace", "glen", "cut"];

/// A generated region of the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub x: i32,
    pub y: i32,
    pub name: String,
    pub biome: Biome,
    pub tier: u32,
}

/// Danger tier grows with distance from the origin.
/// Defined for every `i32` pair; the sum is taken in `u64`.
pub fn zone_tier(x: i32, y: i32) -> u32 {
    let distance = u64::from(x.unsigned_abs()) + u64::from(y.unsigned_abs());
    u32::try_from(1 + distance / 2).unwrap_or(u32::MAX)
}

/// Derive the zone at world coordinates `(x, y)` for `player_id`.
///
/// Draw order is fixed: biome, then name adjective, then name noun.
pub fn zone_for(player_id: &str, x: i32, y: i32) -> Zone {
    let mut rng = rng_for(&[&"zone", &player_id, &x, &y]);
    let biome = *rng.pick(&BIOMES);
    let tier = zone_tier(x, y);
    let adjective = rng.pick(&ADJECTIVES);
    let noun = rng.pick(&NOUNS);
    Zone {
        x,
        y,
        name: format!("{} {}", adjective, noun),
        biome,
        tier,
    }
}

/// Viewport dimensions. Both should be odd so the grid has a center cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSize {
    pub width: i32,
    pub height: i32,
}

impl MapSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.width / 2, self.height / 2)
    }
}

impl Default for MapSize {
    fn default() -> Self {
        MapSize::new(7, 5)
    }
}

/// `0 <= x < width && 0 <= y < height`.
pub fn in_bounds(x: i32, y: i32, size: MapSize) -> bool {
    (0..size.width).contains(&x) && (0..size.height).contains(&y)
}

/// Translate a viewport cell into world coordinates (grid center = origin).
pub fn world_coords(pos: (i32, i32), size: MapSize) -> (i32, i32) {
    let (cx, cy) = size.center();
    (pos.0 - cx, pos.1 - cy)
}

/// Zone under a viewport cell.
pub fn zone_at(player_id: &str, pos: (i32, i32), size: MapSize) -> Zone {
    let (wx, wy) = world_coords(pos, size);
    zone_for(player_id, wx, wy)
}

/// Compass directions, in the order exits are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::West,
    Direction::East,
];

impl Direction {
    /// Parse from the first character of `arg` (case-insensitive).
    pub fn parse(arg: &str) -> Option<Self> {
        match arg.chars().next()?.to_ascii_lowercase() {
            'n' => Some(Direction::North),
            's' => Some(Direction::South),
            'w' => Some(Direction::West),
            'e' => Some(Direction::East),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::West => 'W',
            Direction::East => 'E',
        }
    }
}

/// Cell reached by stepping `dir` from `pos`, if it stays inside the viewport.
/// Never wraps.
pub fn step(pos: (i32, i32), dir: Direction, size: MapSize) -> Option<(i32, i32)> {
    let (dx, dy) = dir.delta();
    let next = (pos.0 + dx, pos.1 + dy);
    in_bounds(next.0, next.1, size).then_some(next)
}

/// Directions that lead to an in-bounds neighbour.
pub fn exits(pos: (i32, i32), size: MapSize) -> Vec<Direction> {
    DIRECTIONS
        .into_iter()
        .filter(|d| step(pos, *d, size).is_some())
        .collect()
}

/// Legend line mapping each biome glyph to its name, in enumeration order.
pub fn legend() -> String {
    let parts: Vec<String> = BIOMES
        .iter()
        .map(|b| format!("{}:{}", b.letter(), b.name()))
        .collect();
    format!("({})", parts.join(", "))
}

/// Render the viewport: `@` at `pos`, otherwise the biome glyph of each cell,
/// one line per row, followed by the legend.
pub fn render_map(player_id: &str, size: MapSize, pos: (i32, i32)) -> String {
    let mut rows: Vec<String> = Vec::with_capacity(size.height.max(0) as usize + 1);
    for y in 0..size.height {
        let mut row = String::with_capacity(size.width.max(0) as usize);
        for x in 0..size.width {
            if (x, y) == pos {
                row.push('@');
            } else {
                row.push(zone_at(player_id, (x, y), size).biome.letter());
            }
        }
        rows.push(row);
    }
    rows.push(legend());
    rows.join("\n")
}
