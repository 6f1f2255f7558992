/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

#![warn(missing_docs)]

//! Bounded grid world for cleaning-robot simulations.
//!
//! The grid is non-toroidal with a wall ring on the border and an
//! 8-neighborhood (Moore) adjacency. Each square holds exactly one tagged
//! variant: open floor, wall, obstacle, dirt, or a charging station with an
//! occupancy slot. Mobile agents are not stored in the grid; they reference
//! coordinates and are tracked by the simulation that owns them.

use serde::{Deserialize, Serialize};

/// Identity of a mobile agent, used by station slots to serialize charging.
pub type AgentId = u32;

/// Grid construction error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Coordinate lies outside the grid.
    #[error("coordinate out of bounds: {0}")]
    OutOfBounds(Coordinate),

    /// The target square already holds something.
    #[error("square is not open floor: {0}")]
    NotOpen(Coordinate),

    /// An ASCII map had rows of different lengths.
    #[error("map rows have unequal widths")]
    RaggedMap,

    /// An ASCII map contained a character outside the map alphabet.
    #[error("unknown map character: {0:?}")]
    UnknownMapCharacter(char),

    /// An ASCII map had no rows.
    #[error("map is empty")]
    EmptyMap,
}

/// A grid coordinate. `Ord` so that ordered collections of coordinates
/// iterate in a stable, deterministic order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Coordinate {
    /// Column, 0 at the left edge.
    pub x: i32,

    /// Row, 0 at the top edge.
    pub y: i32,
}

impl Coordinate {
    /// Create a coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance: `|dx| + |dy|`.
    pub fn manhattan_distance(&self, other: Coordinate) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance: `max(|dx|, |dy|)`. Two squares are Moore-adjacent
    /// (or equal) exactly when this is at most 1.
    pub fn chebyshev_distance(&self, other: Coordinate) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Occupancy slot of a charging station. At most one agent holds the slot at
/// a time; holding it is what permits charging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct StationSlot {
    /// The agent currently holding the slot, if any.
    pub occupied_by: Option<AgentId>,
}

impl StationSlot {
    /// Take the slot. Succeeds if the slot is free or already held by the
    /// same agent; an agent that finds the slot held by another does not
    /// take it.
    pub fn occupy(&mut self, agent: AgentId) -> bool {
        match self.occupied_by {
            None => {
                self.occupied_by = Some(agent);
                true
            }
            Some(holder) => holder == agent,
        }
    }

    /// Free the slot.
    pub fn release(&mut self) {
        self.occupied_by = None;
    }

    /// Whether no agent holds the slot.
    pub fn is_free(&self) -> bool {
        self.occupied_by.is_none()
    }

    /// Whether the given agent holds the slot.
    pub fn is_held_by(&self, agent: AgentId) -> bool {
        self.occupied_by == Some(agent)
    }
}

/// One square of the grid. Cleaning rewrites `Dirt` to `Open`, so a square
/// that has been cleaned can never become dirty again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Clean, walkable floor.
    Open,

    /// Border wall. Impassable.
    Wall,

    /// Interior obstacle. Impassable.
    Obstacle,

    /// Dirty floor, walkable and cleanable.
    Dirt,

    /// Charging station with its occupancy slot.
    Station(StationSlot),
}

/// The grid world: a fixed width x height board of [`Square`]s, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    width: i32,
    height: i32,
    squares: Vec<Square>,
    initial_dirt: usize,
}

impl std::fmt::Display for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = match self.get(Coordinate::new(x, y)) {
                    Square::Open => '.',
                    Square::Wall => '#',
                    Square::Obstacle => 'o',
                    Square::Dirt => 'd',
                    Square::Station(slot) if slot.is_free() => 'c',
                    Square::Station(_) => 'C',
                };
                s.push(c);
            }
            if y < self.height - 1 {
                s.push('\n');
            }
        }
        write!(f, "{}", s)
    }
}

impl World {
    /// Create a world with an open interior and a wall ring on the border.
    pub fn new(width: i32, height: i32) -> Self {
        let mut squares = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    squares.push(Square::Wall);
                } else {
                    squares.push(Square::Open);
                }
            }
        }
        Self {
            width,
            height,
            squares,
            initial_dirt: 0,
        }
    }

    /// Build a world from an ASCII map.
    ///
    /// Alphabet: `#` wall, `o` obstacle, `d` dirt, `c` charging station,
    /// `.` open floor. Rows must all have the same width. Leading and
    /// trailing blank lines and per-line whitespace are ignored so maps can
    /// be written inline in raw strings.
    pub fn parse(map: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(GridError::EmptyMap);
        }

        let width = rows[0].chars().count();
        let mut squares = Vec::with_capacity(width * rows.len());
        let mut initial_dirt = 0;
        for row in &rows {
            if row.chars().count() != width {
                return Err(GridError::RaggedMap);
            }
            for c in row.chars() {
                let square = match c {
                    '.' => Square::Open,
                    '#' => Square::Wall,
                    'o' => Square::Obstacle,
                    'd' => Square::Dirt,
                    'c' => Square::Station(StationSlot::default()),
                    other => return Err(GridError::UnknownMapCharacter(other)),
                };
                if square == Square::Dirt {
                    initial_dirt += 1;
                }
                squares.push(square);
            }
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            squares,
            initial_dirt,
        })
    }

    /// Grid width.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, coordinate: Coordinate) -> usize {
        (coordinate.y * self.width + coordinate.x) as usize
    }

    /// Whether the coordinate lies inside the grid.
    pub fn in_bounds(&self, coordinate: Coordinate) -> bool {
        coordinate.x >= 0
            && coordinate.x < self.width
            && coordinate.y >= 0
            && coordinate.y < self.height
    }

    /// Get a square. The coordinate must be in bounds.
    pub fn get(&self, coordinate: Coordinate) -> Square {
        self.squares[self.index(coordinate)]
    }

    fn get_mut(&mut self, coordinate: Coordinate) -> &mut Square {
        let index = self.index(coordinate);
        &mut self.squares[index]
    }

    /// The Moore neighborhood: up to 8 in-bounds adjacent coordinates, in a
    /// deterministic row-major order.
    pub fn neighbors(&self, coordinate: Coordinate) -> Vec<Coordinate> {
        let mut result = Vec::with_capacity(8);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbor = Coordinate::new(coordinate.x + dx, coordinate.y + dy);
                if self.in_bounds(neighbor) {
                    result.push(neighbor);
                }
            }
        }
        result
    }

    /// Whether a square can be moved onto: in bounds and neither wall nor
    /// obstacle.
    pub fn is_safe(&self, coordinate: Coordinate) -> bool {
        if !self.in_bounds(coordinate) {
            return false;
        }
        !matches!(self.get(coordinate), Square::Wall | Square::Obstacle)
    }

    /// The safe subset of the Moore neighborhood, preserving neighbor order.
    pub fn safe_neighbors(&self, coordinate: Coordinate) -> Vec<Coordinate> {
        self.neighbors(coordinate)
            .into_iter()
            .filter(|&n| self.is_safe(n))
            .collect()
    }

    /// Whether the square holds dirt.
    pub fn has_dirt(&self, coordinate: Coordinate) -> bool {
        self.get(coordinate) == Square::Dirt
    }

    /// Whether the square is a charging station.
    pub fn is_station(&self, coordinate: Coordinate) -> bool {
        matches!(self.get(coordinate), Square::Station(_))
    }

    /// Mutable access to a station's occupancy slot, if the square is one.
    pub fn station_mut(&mut self, coordinate: Coordinate) -> Option<&mut StationSlot> {
        match self.get_mut(coordinate) {
            Square::Station(slot) => Some(slot),
            _ => None,
        }
    }

    /// All station coordinates in row-major order.
    pub fn station_coordinates(&self) -> Vec<Coordinate> {
        let mut result = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let coordinate = Coordinate::new(x, y);
                if self.is_station(coordinate) {
                    result.push(coordinate);
                }
            }
        }
        result
    }

    /// Clean a square. Returns true iff the square held dirt; the square
    /// becomes open floor, permanently.
    pub fn clean(&mut self, coordinate: Coordinate) -> bool {
        if self.has_dirt(coordinate) {
            *self.get_mut(coordinate) = Square::Open;
            true
        } else {
            false
        }
    }

    /// Number of squares still holding dirt.
    pub fn dirt_remaining(&self) -> usize {
        self.squares.iter().filter(|&&s| s == Square::Dirt).count()
    }

    /// Number of dirt squares at construction time.
    pub fn initial_dirt(&self) -> usize {
        self.initial_dirt
    }

    fn place(&mut self, coordinate: Coordinate, square: Square) -> Result<(), GridError> {
        if !self.in_bounds(coordinate) {
            return Err(GridError::OutOfBounds(coordinate));
        }
        if self.get(coordinate) != Square::Open {
            return Err(GridError::NotOpen(coordinate));
        }
        *self.get_mut(coordinate) = square;
        Ok(())
    }

    /// Place an interior obstacle on an open square.
    pub fn place_obstacle(&mut self, coordinate: Coordinate) -> Result<(), GridError> {
        self.place(coordinate, Square::Obstacle)
    }

    /// Place dirt on an open square.
    pub fn place_dirt(&mut self, coordinate: Coordinate) -> Result<(), GridError> {
        self.place(coordinate, Square::Dirt)?;
        self.initial_dirt += 1;
        Ok(())
    }

    /// Place a charging station on an open square.
    pub fn place_station(&mut self, coordinate: Coordinate) -> Result<(), GridError> {
        self.place(coordinate, Square::Station(StationSlot::default()))
    }
}
