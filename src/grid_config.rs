//! This module implements the static description of a crossword puzzle: which cells can be
//! filled, how they are grouped into slots, and where those slots cross. Everything here is built
//! once and then only read by the fill engine.

use std::collections::HashMap;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assignment::Assignment;
use crate::word_list::WordList;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed x and y coords for a cell in the grid, where y = 0 in the top row.
pub type GridCoord = (usize, usize);

/// Characters marking a fillable cell in a grid template. Anything else is a block.
pub const OPEN_CELL_CHARS: [char; 2] = ['_', '.'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridConfigError {
    #[error("Grid must have at least one row")]
    EmptyGrid,

    #[error("More than two slots cross in cell {0:?}")]
    CellSharedByTooManySlots(GridCoord),

    #[error("Slots {0} and {1} share more than one cell")]
    RepeatedOverlap(SlotId, SlotId),

    #[error("Slot starting at {0:?} has zero length")]
    EmptySlot(GridCoord),
}

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct identifying a specific slot in the grid. Two slots are the same slot iff all of these
/// fields match.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SlotSpec {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl SlotSpec {
    /// Parse a string like "1,2,down,5" into a `SlotSpec` struct.
    pub fn from_key(key: &str) -> Result<SlotSpec, String> {
        let key_parts: Vec<&str> = key.split(',').collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let x: Result<usize, _> = key_parts[0].parse();
        let y: Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: Result<usize, _> = key_parts[3].parse();

        if let (Ok(x), Ok(y), Some(direction), Ok(length)) = (x, y, direction, length) {
            Ok(SlotSpec {
                start_cell: (x, y),
                direction,
                length,
            })
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        format!(
            "{},{},{},{}",
            self.start_cell.0, self.start_cell.1, direction, self.length,
        )
    }

    /// Generate the coords for each cell of this entry.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0 + cell_idx, self.start_cell.1),
                Direction::Down => (self.start_cell.0, self.start_cell.1 + cell_idx),
            })
            .collect()
    }
}

/// Serialize a `SlotSpec` into a string key.
#[cfg(feature = "serde")]
impl Serialize for SlotSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `SlotSpec` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SlotSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        SlotSpec::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: Vec<Option<Crossing>>,
}

impl SlotConfig {
    /// Generate a `SlotSpec` identifying this slot.
    #[must_use]
    pub fn slot_spec(&self) -> SlotSpec {
        SlotSpec {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        self.slot_spec().cell_coords()
    }
}

/// The cell shared by each pair of crossing slots, stored once per pair under the key
/// `(lower id, higher id)`.
#[derive(Debug, Clone, Default)]
pub struct OverlapMap {
    cells_by_pair: HashMap<(SlotId, SlotId), (usize, usize)>,
}

impl OverlapMap {
    /// Record that cell `cells.0` of slot `a` is cell `cells.1` of slot `b`, returning any
    /// overlap previously recorded for the pair.
    pub fn insert(
        &mut self,
        a: SlotId,
        b: SlotId,
        cells: (usize, usize),
    ) -> Option<(usize, usize)> {
        if a <= b {
            self.cells_by_pair.insert((a, b), cells)
        } else {
            self.cells_by_pair
                .insert((b, a), (cells.1, cells.0))
                .map(|(b_cell, a_cell)| (a_cell, b_cell))
        }
    }

    /// The pair `(i, j)` such that character `i` of slot `a` must equal character `j` of slot `b`,
    /// or `None` if the slots don't cross.
    #[must_use]
    pub fn get(&self, a: SlotId, b: SlotId) -> Option<(usize, usize)> {
        if a <= b {
            self.cells_by_pair.get(&(a, b)).copied()
        } else {
            self.cells_by_pair
                .get(&(b, a))
                .map(|&(b_cell, a_cell)| (a_cell, b_cell))
        }
    }

    /// The number of distinct crossing pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells_by_pair.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells_by_pair.is_empty()
    }
}

/// Everything the fill engine needs to know about the shape of a puzzle.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Config representing all of the slots in the grid and their crossings.
    pub slot_configs: Vec<SlotConfig>,

    /// The shared cell for each pair of crossing slots.
    pub overlaps: OverlapMap,

    /// For each slot, the ids of the slots crossing it, in ascending order.
    pub neighbors: Vec<Vec<SlotId>>,

    /// The width and height of the grid.
    pub width: usize,
    pub height: usize,

    /// A flat array saying whether each cell can hold a letter, in order of row and then column.
    pub open_cells: Vec<bool>,
}

impl GridConfig {
    /// Build a config for the given slots. The grid is sized to fit every slot, and exactly the
    /// cells covered by a slot are open.
    pub fn from_slot_specs(entries: &[SlotSpec]) -> Result<GridConfig, GridConfigError> {
        let coords: Vec<GridCoord> = entries.iter().flat_map(SlotSpec::cell_coords).collect();
        let width = coords.iter().map(|&(x, _)| x + 1).max().unwrap_or(0);
        let height = coords.iter().map(|&(_, y)| y + 1).max().unwrap_or(0);

        let mut open_cells = vec![false; width * height];
        for (x, y) in coords {
            open_cells[y * width + x] = true;
        }

        GridConfig::new(entries, width, height, open_cells)
    }

    /// Build a config for the given slots on a grid with an explicit shape.
    pub fn new(
        entries: &[SlotSpec],
        width: usize,
        height: usize,
        open_cells: Vec<bool>,
    ) -> Result<GridConfig, GridConfigError> {
        let slot_configs = generate_slot_configs(entries)?;

        let mut overlaps = OverlapMap::default();
        let mut neighbors: Vec<Vec<SlotId>> = vec![vec![]; slot_configs.len()];

        for slot_config in &slot_configs {
            for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
                let Some(Crossing {
                    other_slot_id,
                    other_slot_cell,
                }) = *crossing
                else {
                    continue;
                };

                // Each crossing is seen from both sides, so only record it from the lower id.
                if slot_config.id < other_slot_id
                    && overlaps
                        .insert(slot_config.id, other_slot_id, (cell_idx, other_slot_cell))
                        .is_some()
                {
                    return Err(GridConfigError::RepeatedOverlap(
                        slot_config.id,
                        other_slot_id,
                    ));
                }

                neighbors[slot_config.id].push(other_slot_id);
            }
        }

        for slot_neighbors in &mut neighbors {
            slot_neighbors.sort_unstable();
            slot_neighbors.dedup();
        }

        Ok(GridConfig {
            slot_configs,
            overlaps,
            neighbors,
            width,
            height,
            open_cells,
        })
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// See `OverlapMap::get`.
    #[must_use]
    pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<(usize, usize)> {
        self.overlaps.get(a, b)
    }

    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    /// Find the id of the slot matching the given spec, if there is one.
    #[must_use]
    pub fn slot_id_for_spec(&self, spec: &SlotSpec) -> Option<SlotId> {
        self.slot_configs
            .iter()
            .find(|slot_config| slot_config.slot_spec() == *spec)
            .map(|slot_config| slot_config.id)
    }
}

/// Given `SlotSpec` structs specifying the positions of the slots in a grid, generate
/// `SlotConfig`s containing derived information about crossings.
pub fn generate_slot_configs(entries: &[SlotSpec]) -> Result<Vec<SlotConfig>, GridConfigError> {
    // Build a map from cell location to entries involved, which we can then use to calculate
    // crossings.
    let mut entries_by_loc: HashMap<GridCoord, Vec<(usize, usize)>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        if entry.length == 0 {
            return Err(GridConfigError::EmptySlot(entry.start_cell));
        }
        for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
            entries_by_loc
                .entry(loc)
                .or_default()
                .push((entry_idx, cell_idx));
        }
    }

    entries
        .iter()
        .enumerate()
        .map(|(entry_idx, entry)| {
            let crossings = entry
                .cell_coords()
                .into_iter()
                .map(|loc| {
                    let others: Vec<_> = entries_by_loc[&loc]
                        .iter()
                        .filter(|&&(e, _)| e != entry_idx)
                        .collect();

                    match others.as_slice() {
                        [] => Ok(None),
                        [&(other_slot_id, other_slot_cell)] => Ok(Some(Crossing {
                            other_slot_id,
                            other_slot_cell,
                        })),
                        _ => Err(GridConfigError::CellSharedByTooManySlots(loc)),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(SlotConfig {
                id: entry_idx,
                start_cell: entry.start_cell,
                direction: entry.direction,
                length: entry.length,
                crossings,
            })
        })
        .collect()
}

/// Turn a template string into a grid of open/blocked cells. Every character is a cell, including
/// spaces, and rows shorter than the widest row are padded with blocks. Blank lines before the
/// first row and after the last one are ignored, as is indentation shared by every row.
fn parse_template(template: &str) -> Result<Vec<Vec<bool>>, GridConfigError> {
    let lines: Vec<&str> = template.lines().collect();
    let is_blank = |line: &&str| line.trim().is_empty();

    let (Some(first), Some(last)) = (
        lines.iter().position(|line| !is_blank(line)),
        lines.iter().rposition(|line| !is_blank(line)),
    ) else {
        return Err(GridConfigError::EmptyGrid);
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut rows: Vec<Vec<bool>> = lines
        .iter()
        .map(|line| {
            line.chars()
                .skip(indent)
                .map(|c| OPEN_CELL_CHARS.contains(&c))
                .collect()
        })
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, false);
    }

    Ok(rows)
}

/// Find every maximal run of at least two open cells in each row, as lists of `(row idx, col idx)`
/// pairs.
fn build_runs(rows: &[Vec<bool>]) -> Vec<Vec<(usize, usize)>> {
    let mut result = vec![];

    for (row_idx, row) in rows.iter().enumerate() {
        let mut current_run = vec![];

        for (col_idx, &open) in row.iter().enumerate() {
            if open {
                current_run.push((row_idx, col_idx));
            } else {
                if current_run.len() > 1 {
                    result.push(current_run);
                }
                current_run = vec![];
            }
        }

        if current_run.len() > 1 {
            result.push(current_run);
        }
    }

    result
}

/// Generate a list of `SlotSpec`s from a template string with `_` or `.` representing open cells
/// and any other character representing a block. Across slots come first, then down slots, each in
/// reading order.
pub fn generate_slots_from_template_string(
    template: &str,
) -> Result<Vec<SlotSpec>, GridConfigError> {
    let rows = parse_template(template)?;
    Ok(slots_for_rows(&rows))
}

fn slots_for_rows(rows: &[Vec<bool>]) -> Vec<SlotSpec> {
    let mut slot_specs: Vec<SlotSpec> = build_runs(rows)
        .into_iter()
        .map(|run| SlotSpec {
            start_cell: (run[0].1, run[0].0),
            direction: Direction::Across,
            length: run.len(),
        })
        .collect();

    let transposed: Vec<Vec<bool>> = (0..rows[0].len())
        .map(|x| rows.iter().map(|row| row[x]).collect())
        .collect();

    let mut down_specs: Vec<SlotSpec> = build_runs(&transposed)
        .into_iter()
        .map(|run| SlotSpec {
            start_cell: (run[0].0, run[0].1),
            direction: Direction::Down,
            length: run.len(),
        })
        .collect();
    down_specs.sort_by_key(|spec| (spec.start_cell.1, spec.start_cell.0));

    slot_specs.extend(down_specs);
    slot_specs
}

/// Generate a `GridConfig` from a template string; see `generate_slots_from_template_string`.
pub fn generate_grid_config_from_template_string(
    template: &str,
) -> Result<GridConfig, GridConfigError> {
    let rows = parse_template(template)?;
    let slot_specs = slots_for_rows(&rows);

    let width = rows[0].len();
    let height = rows.len();
    let open_cells = rows.into_iter().flatten().collect();

    GridConfig::new(&slot_specs, width, height, open_cells)
}

/// Turn the given grid config and assignment into a rendered string, with `#` for blocks and `.`
/// for open cells that haven't been filled.
#[must_use]
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let mut grid: Vec<Option<char>> = vec![None; config.width * config.height];

    for (slot_id, word_id) in assignment.iter() {
        let slot_config = &config.slot_configs[slot_id];
        let word = word_list.get_word(word_id);

        for (&(x, y), &glyph) in slot_config.cell_coords().iter().zip(&word.glyphs) {
            grid[y * config.width + x] = Some(word_list.glyphs[glyph]);
        }
    }

    grid.chunks(config.width.max(1))
        .zip(config.open_cells.chunks(config.width.max(1)))
        .map(|(line, open_line)| {
            line.iter()
                .zip(open_line)
                .map(|(cell, &open)| match (cell, open) {
                    (Some(ch), _) => *ch,
                    (None, true) => '.',
                    (None, false) => '#',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
