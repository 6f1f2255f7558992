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

use cleaning_robot::engine::Explorer;
use cleaning_sim::{Simulation, SimulationConfig};
use grid_world::World;
use rand::SeedableRng;

// Two robots, two stations, an obstacle block in the middle, dirt scattered
// on both sides.
const DEMO_MAP: &str = "####################\n\
                        #c....d......d.....#\n\
                        #..d......oo.....d.#\n\
                        #.....d...oo...d...#\n\
                        #.d.....d......d...#\n\
                        #....d.......d....c#\n\
                        ####################";

fn main() {
    let world = World::parse(DEMO_MAP).expect("demo map is malformed");
    let config = SimulationConfig {
        max_steps: 5_000,
        explorer: Explorer::Frontier,
    };
    let rng = rand_pcg::Pcg64::seed_from_u64(42);

    println!("starting world:");
    println!("{}", world);

    let mut simulation = Simulation::new(world, config, rng).expect("demo map has no stations");
    simulation.run();

    println!();
    println!("world after {} steps:", simulation.steps());
    println!("{}", simulation.world());
    println!();

    match simulation.time_all_clean() {
        Some(tick) => println!("all clean at step {}", tick),
        None => println!(
            "stopped with {} dirty squares left",
            simulation.world().dirt_remaining()
        ),
    }

    let report = simulation.report();
    let output = serde_json::to_string_pretty(&report).expect("report serialization failed");
    println!("{}", output);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_map_runs_to_termination() {
        let world = World::parse(DEMO_MAP).expect("demo map is malformed");
        assert_eq!(world.station_coordinates().len(), 2);

        let config = SimulationConfig {
            max_steps: 5_000,
            explorer: Explorer::Frontier,
        };
        let rng = rand_pcg::Pcg64::seed_from_u64(42);
        let mut simulation = Simulation::new(world, config, rng).expect("new failed");
        simulation.run();

        assert!(!simulation.is_active());
        assert!(simulation.steps() <= 5_000);
        let report = simulation.report();
        assert_eq!(report.robots.len(), 2);
        assert!(serde_json::to_string(&report).is_ok());
    }
}
