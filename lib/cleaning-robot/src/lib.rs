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

//! State and decision logic for a battery-powered cleaning robot on a
//! bounded Moore grid.
//!
//! [`Robot`] is the mutable per-agent state: position, battery, counters,
//! visited squares, and the set of charging stations the robot knows about.
//! The [`engine`] module advances one robot by one tick through a five-mode
//! state machine; [`gossip`] merges station knowledge between co-located
//! robots.

use std::collections::BTreeSet;

use grid_world::{AgentId, Coordinate};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

pub mod engine;
pub mod gossip;

/// The pseudo-random generator threaded through every decision that needs
/// randomness, for reproducibility.
pub type Rng = rand_pcg::Pcg64;

/// Battery capacity, in percent.
pub const BATTERY_CAPACITY: i32 = 100;

/// Battery cost of one move.
pub const MOVE_COST: i32 = 1;

/// Battery cost of cleaning one square.
pub const CLEAN_COST: i32 = 1;

/// Battery gained per tick spent charging.
pub const CHARGE_PER_TURN: i32 = 5;

/// Battery level at which a charging robot goes back to work.
pub const CHARGED_ENOUGH: i32 = 80;

/// Battery level at or below which the robot heads for a station no matter
/// how close one is.
pub const LOW_BATTERY: i32 = 30;

/// Extra battery the robot keeps in reserve over the distance to the
/// nearest known station, so it can always get back before running out.
pub const RETURN_MARGIN: i32 = 5;

/// The robot's state-machine mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Roaming toward squares it has not seen yet.
    Exploring,

    /// Cleaning the square it stands on.
    Cleaning,

    /// Heading for dirt spotted in the neighborhood.
    MovingToDirt,

    /// Heading for the nearest known charging station.
    MovingToCharge,

    /// Standing on a station, recharging.
    Charging,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Mode::Exploring => "exploring",
            Mode::Cleaning => "cleaning",
            Mode::MovingToDirt => "moving_to_dirt",
            Mode::MovingToCharge => "moving_to_charge",
            Mode::Charging => "charging",
        };
        write!(f, "{}", tag)
    }
}

/// Mutable state of one cleaning robot. Created once at simulation start on
/// a charging station, mutated every tick by [`engine::step`], never
/// destroyed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Robot {
    /// Unique identity, used for station slot ownership.
    pub id: AgentId,

    /// Current square. The robot references the square, it does not own it.
    pub position: Coordinate,

    /// Battery charge in percent, clamped to `[0, BATTERY_CAPACITY]`.
    pub battery: i32,

    /// Current state-machine mode.
    pub mode: Mode,

    /// The station the robot started on. Always in `known_stations`, and
    /// the fallback target should that set ever be empty.
    pub home_station: Coordinate,

    /// Stations the robot has seen or heard about. Grows by observation and
    /// by gossip, never shrinks. Ordered so nearest-station ties resolve
    /// deterministically.
    pub known_stations: BTreeSet<Coordinate>,

    /// Station slot currently held, if any.
    pub occupying: Option<Coordinate>,

    /// Squares cleaned so far.
    pub cleaned_cells: u32,

    /// Moves made so far.
    pub movement_count: u32,

    /// Ticks spent actually charging.
    pub charging_turns: u32,

    visited: FxHashSet<Coordinate>,
    visit_counts: FxHashMap<Coordinate, u32>,
}

impl Robot {
    /// Create a robot at full battery on its home station.
    pub fn new(id: AgentId, start: Coordinate) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut visit_counts = FxHashMap::default();
        visit_counts.insert(start, 1);
        let mut known_stations = BTreeSet::new();
        known_stations.insert(start);
        Self {
            id,
            position: start,
            battery: BATTERY_CAPACITY,
            mode: Mode::Exploring,
            home_station: start,
            known_stations,
            occupying: None,
            cleaned_cells: 0,
            movement_count: 0,
            charging_turns: 0,
            visited,
            visit_counts,
        }
    }

    /// Whether the robot has ever stood on the square.
    pub fn has_visited(&self, coordinate: Coordinate) -> bool {
        self.visited.contains(&coordinate)
    }

    /// How many times the robot has stood on the square.
    pub fn visits(&self, coordinate: Coordinate) -> u32 {
        self.visit_counts.get(&coordinate).copied().unwrap_or(0)
    }

    /// Move one step. Costs [`MOVE_COST`] battery (floored at 0) and
    /// updates the visited bookkeeping.
    pub fn move_to(&mut self, coordinate: Coordinate) {
        self.position = coordinate;
        self.battery = (self.battery - MOVE_COST).max(0);
        self.movement_count += 1;
        self.visited.insert(coordinate);
        *self.visit_counts.entry(coordinate).or_insert(0) += 1;
    }

    /// Account for one cleaned square. Costs [`CLEAN_COST`] battery.
    pub fn record_clean(&mut self) {
        self.battery = (self.battery - CLEAN_COST).max(0);
        self.cleaned_cells += 1;
    }

    /// Charge for one tick. Returns true iff any battery was gained; a full
    /// battery does not count as a charging turn.
    pub fn charge(&mut self) -> bool {
        if self.battery >= BATTERY_CAPACITY {
            return false;
        }
        self.battery = (self.battery + CHARGE_PER_TURN).min(BATTERY_CAPACITY);
        self.charging_turns += 1;
        true
    }

    /// Remember a station coordinate.
    pub fn record_station(&mut self, coordinate: Coordinate) {
        self.known_stations.insert(coordinate);
    }

    /// The nearest known station by Manhattan distance. Ties resolve by the
    /// set's ordering. Falls back to the home station if the set is empty.
    pub fn nearest_known_station(&self) -> Coordinate {
        let mut nearest = None;
        let mut best = i32::MAX;
        for &station in &self.known_stations {
            let distance = self.position.manhattan_distance(station);
            if distance < best {
                best = distance;
                nearest = Some(station);
            }
        }
        nearest.unwrap_or(self.home_station)
    }

    /// Whether the robot should head for a charger: battery at or below
    /// [`LOW_BATTERY`], or not enough left to reach the nearest known
    /// station with [`RETURN_MARGIN`] to spare.
    pub fn needs_to_charge(&self) -> bool {
        let distance = self.position.manhattan_distance(self.nearest_known_station());
        self.battery <= LOW_BATTERY || self.battery <= distance + RETURN_MARGIN
    }

    /// Snapshot for the reporting surface.
    pub fn report(&self) -> RobotReport {
        RobotReport {
            id: self.id,
            position: self.position,
            battery: self.battery,
            mode: self.mode,
            cleaned_cells: self.cleaned_cells,
            movement_count: self.movement_count,
            charging_turns: self.charging_turns,
            known_stations: self.known_stations.len(),
        }
    }
}

/// Read-only per-robot snapshot exposed for display each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotReport {
    /// Robot identity.
    pub id: AgentId,

    /// Current square.
    pub position: Coordinate,

    /// Battery charge in percent.
    pub battery: i32,

    /// Current mode tag.
    pub mode: Mode,

    /// Squares cleaned so far.
    pub cleaned_cells: u32,

    /// Moves made so far.
    pub movement_count: u32,

    /// Ticks spent charging so far.
    pub charging_turns: u32,

    /// Number of stations the robot knows about.
    pub known_stations: usize,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_new_robot_starts_full_and_knows_home() {
        let start = Coordinate::new(1, 1);
        let robot = Robot::new(0, start);
        assert_eq!(robot.battery, BATTERY_CAPACITY);
        assert_eq!(robot.mode, Mode::Exploring);
        assert_eq!(robot.home_station, start);
        assert!(robot.known_stations.contains(&start));
        assert!(robot.has_visited(start));
        assert_eq!(robot.visits(start), 1);
        assert_eq!(robot.occupying, None);
    }

    #[test]
    fn test_move_costs_battery_and_tracks_visits() {
        let mut robot = Robot::new(0, Coordinate::new(1, 1));
        let target = Coordinate::new(2, 2);
        robot.move_to(target);
        assert_eq!(robot.position, target);
        assert_eq!(robot.battery, BATTERY_CAPACITY - MOVE_COST);
        assert_eq!(robot.movement_count, 1);
        assert!(robot.has_visited(target));

        robot.move_to(Coordinate::new(1, 1));
        robot.move_to(target);
        assert_eq!(robot.visits(target), 2);
        assert_eq!(robot.visits(Coordinate::new(1, 1)), 2);
    }

    #[test]
    fn test_battery_floors_at_zero_on_move() {
        let mut robot = Robot::new(0, Coordinate::new(1, 1));
        robot.battery = 0;
        robot.move_to(Coordinate::new(2, 1));
        assert_eq!(robot.battery, 0);
    }

    #[test]
    fn test_charge_caps_at_capacity_and_counts_turns() {
        let mut robot = Robot::new(0, Coordinate::new(1, 1));
        robot.battery = 97;
        assert!(robot.charge());
        assert_eq!(robot.battery, BATTERY_CAPACITY);
        assert_eq!(robot.charging_turns, 1);

        // already full, no turn counted
        assert!(!robot.charge());
        assert_eq!(robot.charging_turns, 1);
    }

    #[test]
    fn test_needs_to_charge_low_battery() {
        let mut robot = Robot::new(0, Coordinate::new(1, 1));
        robot.position = Coordinate::new(2, 1);
        robot.battery = LOW_BATTERY;
        assert!(robot.needs_to_charge());
        robot.battery = LOW_BATTERY + 1;
        assert!(!robot.needs_to_charge());
    }

    #[test]
    fn test_needs_to_charge_with_battery_10_at_distance_3() {
        // battery 10 <= 3 + 5 is false, but 10 <= 30, so the low-battery arm
        // fires; at distance 30 the margin arm fires for battery 35 too.
        let mut robot = Robot::new(0, Coordinate::new(1, 1));
        robot.position = Coordinate::new(4, 1);
        robot.battery = 10;
        assert!(robot.needs_to_charge());

        robot.position = Coordinate::new(31, 1);
        robot.battery = 35;
        assert!(robot.needs_to_charge());
        robot.battery = 37;
        assert!(!robot.needs_to_charge());
    }

    #[test]
    fn test_nearest_known_station_prefers_closer_then_set_order() {
        let mut robot = Robot::new(0, Coordinate::new(5, 5));
        robot.known_stations.clear();
        robot.record_station(Coordinate::new(1, 1));
        robot.record_station(Coordinate::new(6, 5));
        assert_eq!(robot.nearest_known_station(), Coordinate::new(6, 5));

        // two stations at equal distance: the smaller coordinate in set
        // order wins
        let mut robot = Robot::new(1, Coordinate::new(5, 5));
        robot.known_stations.clear();
        robot.record_station(Coordinate::new(4, 5));
        robot.record_station(Coordinate::new(6, 5));
        assert_eq!(robot.nearest_known_station(), Coordinate::new(4, 5));
    }

    #[test]
    fn test_nearest_known_station_falls_back_to_home() {
        let mut robot = Robot::new(0, Coordinate::new(2, 2));
        robot.known_stations.clear();
        assert_eq!(robot.nearest_known_station(), Coordinate::new(2, 2));
    }

    #[test]
    fn test_report_snapshot() {
        let mut robot = Robot::new(3, Coordinate::new(1, 1));
        robot.move_to(Coordinate::new(2, 1));
        robot.record_clean();
        let report = robot.report();
        assert_eq!(report.id, 3);
        assert_eq!(report.position, Coordinate::new(2, 1));
        assert_eq!(report.battery, BATTERY_CAPACITY - MOVE_COST - CLEAN_COST);
        assert_eq!(report.mode, Mode::Exploring);
        assert_eq!(report.cleaned_cells, 1);
        assert_eq!(report.movement_count, 1);
        assert_eq!(report.known_stations, 1);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Move,
        Clean,
        Charge,
    }

    fn vec_of_op() -> impl Strategy<Value = Vec<Op>> {
        prop::collection::vec(
            prop_oneof![Just(Op::Move), Just(Op::Clean), Just(Op::Charge)],
            0..256,
        )
    }

    proptest! {
        #[test]
        fn test_battery_stays_clamped_under_any_op_sequence(ops in vec_of_op()) {
            let mut robot = Robot::new(0, Coordinate::new(1, 1));
            for op in ops {
                match op {
                    Op::Move => robot.move_to(Coordinate::new(2, 1)),
                    Op::Clean => robot.record_clean(),
                    Op::Charge => {
                        robot.charge();
                    }
                }
                prop_assert!(robot.battery >= 0);
                prop_assert!(robot.battery <= BATTERY_CAPACITY);
            }
        }

        #[test]
        fn test_counters_are_monotone(ops in vec_of_op()) {
            let mut robot = Robot::new(0, Coordinate::new(1, 1));
            let mut previous = (0, 0, 0);
            for op in ops {
                match op {
                    Op::Move => robot.move_to(Coordinate::new(2, 1)),
                    Op::Clean => robot.record_clean(),
                    Op::Charge => {
                        robot.charge();
                    }
                }
                let current = (robot.movement_count, robot.cleaned_cells, robot.charging_turns);
                prop_assert!(current.0 >= previous.0);
                prop_assert!(current.1 >= previous.1);
                prop_assert!(current.2 >= previous.2);
                previous = current;
            }
        }
    }
}
