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

//! The coordinator: a single-threaded, turn-based simulation loop.
//!
//! One tick advances every robot exactly once, in an order reshuffled each
//! tick. Each robot's turn runs to completion (gossip, then one state
//! transition) before the next robot's turn begins; the only inter-robot
//! contention point is a charging station's slot, which the occupy/release
//! protocol serializes. A run ends when the step ceiling is reached, when
//! every robot's battery is empty, or when no dirt remains.

use cleaning_robot::engine::Explorer;
use cleaning_robot::{engine, gossip, Robot, RobotReport, Rng};
use grid_world::World;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Simulation construction error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// A world without a charging station cannot host robots.
    #[error("world has no charging stations")]
    NoStations,
}

/// Run parameters. Battery costs and thresholds are fixed constants of the
/// robots, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Hard ceiling on the number of ticks.
    pub max_steps: u32,

    /// Exploration policy shared by every robot.
    pub explorer: Explorer,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            explorer: Explorer::Local,
        }
    }
}

/// Simulation-level snapshot for the reporting surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Ticks executed so far.
    pub steps: u32,

    /// The first tick at which no dirt remained, if that has happened.
    pub time_all_clean: Option<u32>,

    /// Dirt squares present at construction.
    pub initial_dirt: usize,

    /// Dirt squares still present.
    pub dirt_remaining: usize,

    /// Percent of the initially dirty squares now clean.
    pub percent_clean: f64,

    /// Per-robot snapshots.
    pub robots: Vec<RobotReport>,
}

/// A world plus its robots and the tick loop that drives them.
pub struct Simulation {
    world: World,
    robots: Vec<Robot>,
    config: SimulationConfig,
    rng: Rng,
    steps: u32,
    time_all_clean: Option<u32>,
    active: bool,
}

impl Simulation {
    /// Create a simulation with one robot per charging station, each
    /// starting on its own station at full battery.
    pub fn new(world: World, config: SimulationConfig, rng: Rng) -> Result<Self, SimulationError> {
        let stations = world.station_coordinates();
        if stations.is_empty() {
            return Err(SimulationError::NoStations);
        }
        let robots = stations
            .into_iter()
            .enumerate()
            .map(|(id, coordinate)| Robot::new(id as u32, coordinate))
            .collect();
        Ok(Self {
            world,
            robots,
            config,
            rng,
            steps: 0,
            time_all_clean: None,
            active: true,
        })
    }

    /// Run one tick. A no-op once the simulation has gone inactive.
    pub fn tick(&mut self) {
        if !self.active {
            return;
        }
        if self.steps >= self.config.max_steps {
            self.active = false;
            return;
        }
        if self.robots.iter().all(|robot| robot.battery <= 0) {
            self.active = false;
            return;
        }

        let mut order: Vec<usize> = (0..self.robots.len()).collect();
        order.shuffle(&mut self.rng);
        for index in order {
            gossip::exchange(&mut self.robots, index);
            engine::step(
                &mut self.robots[index],
                &mut self.world,
                self.config.explorer,
                &mut self.rng,
            );
        }
        self.steps += 1;

        if self.time_all_clean.is_none() && self.world.dirt_remaining() == 0 {
            self.time_all_clean = Some(self.steps);
            self.active = false;
        }
    }

    /// Tick until the simulation goes inactive. Always halts within the
    /// configured step ceiling.
    pub fn run(&mut self) {
        while self.active {
            self.tick();
        }
    }

    /// Whether the simulation is still running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks executed so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// The first tick at which no dirt remained, if that has happened. Set
    /// at most once.
    pub fn time_all_clean(&self) -> Option<u32> {
        self.time_all_clean
    }

    /// The world being cleaned.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The robots, in spawn order.
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    /// Percent of the initially dirty squares now clean. A world that
    /// started with no dirt reports zero, matching the counters-based view
    /// that nothing has been cleaned.
    pub fn percent_clean(&self) -> f64 {
        let initial = self.world.initial_dirt();
        if initial == 0 {
            return 0.0;
        }
        let cleaned = initial - self.world.dirt_remaining();
        cleaned as f64 / initial as f64 * 100.0
    }

    /// Snapshot of the whole run for display.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            steps: self.steps,
            time_all_clean: self.time_all_clean,
            initial_dirt: self.world.initial_dirt(),
            dirt_remaining: self.world.dirt_remaining(),
            percent_clean: self.percent_clean(),
            robots: self.robots.iter().map(Robot::report).collect(),
        }
    }
}
