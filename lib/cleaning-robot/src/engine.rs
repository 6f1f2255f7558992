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

//! The finite-state controller: one [`step`] per robot per tick.

use std::collections::VecDeque;

use grid_world::{Coordinate, World};
use rand::seq::SliceRandom;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{Mode, Robot, Rng, CHARGED_ENOUGH};

/// Exploration policy used when there is nothing to clean and no need to
/// charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Explorer {
    /// Pick an unvisited safe neighbor uniformly at random; if every safe
    /// neighbor has been visited, take the least-visited one.
    Local,

    /// Breadth-first search over safe squares for the nearest unvisited
    /// coordinate and take the first step along that path; if nothing
    /// unvisited is reachable, take the least-visited safe neighbor.
    Frontier,
}

/// Advance one robot by one tick.
///
/// A robot at battery 0 is forced into `Charging` and is otherwise inert:
/// the only way back is to already be standing on a station whose slot it
/// can take. Away from a station it releases any slot it held and freezes,
/// a terminal condition for that robot unless the world changes around it.
pub fn step(robot: &mut Robot, world: &mut World, explorer: Explorer, rng: &mut Rng) {
    if robot.battery <= 0 {
        robot.mode = Mode::Charging;
        if !try_charge(robot, world) {
            release_station(robot, world);
        }
        return;
    }

    match robot.mode {
        Mode::Charging => {
            if world.is_station(robot.position) {
                try_charge(robot, world);
                if robot.battery >= CHARGED_ENOUGH {
                    robot.mode = Mode::Exploring;
                    release_station(robot, world);
                }
            } else {
                robot.mode = Mode::MovingToCharge;
            }
        }
        Mode::MovingToCharge => {
            let target = robot.nearest_known_station();
            if let Some(next) = step_toward(world, robot.position, target) {
                robot.move_to(next);
            }
            if world.is_station(robot.position) {
                robot.record_station(robot.position);
                robot.mode = Mode::Charging;
            }
        }
        Mode::Exploring => {
            if world.has_dirt(robot.position) {
                robot.mode = Mode::Cleaning;
            } else if dirty_neighbor(world, robot.position).is_some() {
                robot.mode = Mode::MovingToDirt;
            } else if robot.needs_to_charge() {
                robot.mode = Mode::MovingToCharge;
            } else {
                explore(robot, world, explorer, rng);
            }
        }
        Mode::Cleaning => {
            let cleaned = clean_current(robot, world);
            if !cleaned {
                robot.mode = Mode::Exploring;
            } else if robot.needs_to_charge() {
                robot.mode = Mode::MovingToCharge;
            }
        }
        Mode::MovingToDirt => {
            match dirty_neighbor(world, robot.position) {
                Some(next) => robot.move_to(next),
                None => robot.mode = Mode::Exploring,
            }
            if world.has_dirt(robot.position) {
                robot.mode = Mode::Cleaning;
            } else if robot.needs_to_charge() {
                robot.mode = Mode::MovingToCharge;
            }
        }
    }
}

/// Clean the robot's current square. Returns true iff it held dirt.
fn clean_current(robot: &mut Robot, world: &mut World) -> bool {
    if world.clean(robot.position) {
        robot.record_clean();
        true
    } else {
        false
    }
}

/// Occupy and charge at the robot's current square. Returns false if the
/// square is not a station or the slot is held by another robot; a
/// contested slot means no charge this tick, though the robot may still
/// stand there.
fn try_charge(robot: &mut Robot, world: &mut World) -> bool {
    let position = robot.position;
    let id = robot.id;
    let slot = match world.station_mut(position) {
        Some(slot) => slot,
        None => return false,
    };
    robot.record_station(position);
    if !slot.occupy(id) {
        return false;
    }
    robot.occupying = Some(position);
    robot.charge();
    true
}

/// Release the station slot the robot holds, if any.
fn release_station(robot: &mut Robot, world: &mut World) {
    if let Some(coordinate) = robot.occupying.take() {
        if let Some(slot) = world.station_mut(coordinate) {
            if slot.is_held_by(robot.id) {
                slot.release();
            }
        }
    }
}

/// First safe neighbor holding dirt, in neighborhood order.
fn dirty_neighbor(world: &World, position: Coordinate) -> Option<Coordinate> {
    world
        .safe_neighbors(position)
        .into_iter()
        .find(|&n| world.has_dirt(n))
}

/// Greedy Manhattan-distance descent: the safe neighbor closest to the
/// target, first minimum on ties. None if no neighbor is safe.
fn step_toward(world: &World, position: Coordinate, target: Coordinate) -> Option<Coordinate> {
    world
        .safe_neighbors(position)
        .into_iter()
        .min_by_key(|n| n.manhattan_distance(target))
}

/// The least-visited safe neighbor, first minimum on ties.
fn least_visited(robot: &Robot, world: &World) -> Option<Coordinate> {
    world
        .safe_neighbors(robot.position)
        .into_iter()
        .min_by_key(|&n| robot.visits(n))
}

/// Breadth-first search from the robot's square over safe squares for the
/// nearest coordinate outside its visited set. Returns the first step along
/// the shortest path, or None if nothing unvisited is reachable.
fn first_step_to_unvisited(robot: &Robot, world: &World) -> Option<Coordinate> {
    let start = robot.position;
    let mut seen = FxHashSet::default();
    let mut parent: FxHashMap<Coordinate, Coordinate> = FxHashMap::default();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current != start && !robot.has_visited(current) {
            // walk the parent chain back to the square adjacent to the start
            let mut step = current;
            while parent[&step] != start {
                step = parent[&step];
            }
            return Some(step);
        }
        for neighbor in world.safe_neighbors(current) {
            if seen.insert(neighbor) {
                parent.insert(neighbor, current);
                queue.push_back(neighbor);
            }
        }
    }

    None
}

/// One exploration move. With no safe neighbor at all the robot stays put
/// for the tick.
fn explore(robot: &mut Robot, world: &World, explorer: Explorer, rng: &mut Rng) {
    match explorer {
        Explorer::Frontier => {
            if let Some(next) = first_step_to_unvisited(robot, world) {
                robot.move_to(next);
                return;
            }
        }
        Explorer::Local => {
            let unvisited: Vec<Coordinate> = world
                .safe_neighbors(robot.position)
                .into_iter()
                .filter(|&n| !robot.has_visited(n))
                .collect();
            if let Some(&next) = unvisited.choose(rng) {
                robot.move_to(next);
                return;
            }
        }
    }
    if let Some(next) = least_visited(robot, world) {
        robot.move_to(next);
    }
}
