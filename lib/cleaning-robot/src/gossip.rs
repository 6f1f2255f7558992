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

//! Passive knowledge exchange between co-located robots.
//!
//! Before a robot takes its state transition for the tick, it merges its
//! known-station set with every robot standing in its Moore neighborhood or
//! on its own square. The merge is an explicit union written back to both
//! sides: commutative and idempotent by construction, with no sharing of
//! the underlying sets. Within a tick the coordinator runs these exchanges
//! sequentially in the tick's shuffled agent order, so whether knowledge
//! relays transitively through a chain of robots in a single tick depends
//! on that order. Across ticks every pair that keeps meeting converges.

use std::collections::BTreeSet;

use grid_world::Coordinate;

use crate::Robot;

/// Merge station knowledge between `robots[index]` and every robot
/// co-located with it (Chebyshev distance at most 1). Both sides end up
/// with the union of the two sets.
pub fn exchange(robots: &mut [Robot], index: usize) {
    let here = robots[index].position;
    for other in 0..robots.len() {
        if other == index {
            continue;
        }
        if robots[other].position.chebyshev_distance(here) > 1 {
            continue;
        }
        let union: BTreeSet<Coordinate> = robots[index]
            .known_stations
            .union(&robots[other].known_stations)
            .copied()
            .collect();
        robots[index].known_stations = union.clone();
        robots[other].known_stations = union;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot_at(id: u32, x: i32, y: i32) -> Robot {
        Robot::new(id, Coordinate::new(x, y))
    }

    #[test]
    fn test_adjacent_robots_swap_station_knowledge() {
        let mut robots = vec![robot_at(0, 1, 1), robot_at(1, 2, 2)];
        exchange(&mut robots, 0);

        let expected: BTreeSet<Coordinate> =
            [Coordinate::new(1, 1), Coordinate::new(2, 2)].into_iter().collect();
        assert_eq!(robots[0].known_stations, expected);
        assert_eq!(robots[1].known_stations, expected);
    }

    #[test]
    fn test_same_square_counts_as_co_located() {
        let mut robots = vec![robot_at(0, 3, 3), robot_at(1, 3, 3)];
        robots[1].record_station(Coordinate::new(7, 7));
        exchange(&mut robots, 0);
        assert!(robots[0].known_stations.contains(&Coordinate::new(7, 7)));
    }

    #[test]
    fn test_distant_robots_do_not_exchange() {
        let mut robots = vec![robot_at(0, 1, 1), robot_at(1, 3, 1)];
        exchange(&mut robots, 0);
        assert_eq!(robots[0].known_stations.len(), 1);
        assert_eq!(robots[1].known_stations.len(), 1);
    }

    #[test]
    fn test_exchange_is_idempotent() {
        let mut robots = vec![robot_at(0, 1, 1), robot_at(1, 2, 1)];
        exchange(&mut robots, 0);
        let after_first = (
            robots[0].known_stations.clone(),
            robots[1].known_stations.clone(),
        );
        exchange(&mut robots, 0);
        exchange(&mut robots, 1);
        assert_eq!(robots[0].known_stations, after_first.0);
        assert_eq!(robots[1].known_stations, after_first.1);
    }

    #[test]
    fn test_chain_converges_when_the_middle_robot_speaks() {
        // 0 and 2 are out of range of each other; 1 is adjacent to both
        let mut robots = vec![robot_at(0, 1, 1), robot_at(1, 2, 2), robot_at(2, 3, 3)];
        exchange(&mut robots, 1);

        let everything: BTreeSet<Coordinate> = [
            Coordinate::new(1, 1),
            Coordinate::new(2, 2),
            Coordinate::new(3, 3),
        ]
        .into_iter()
        .collect();
        assert_eq!(robots[1].known_stations, everything);
        assert_eq!(robots[2].known_stations, everything);
        // the endpoint merged before the middle robot learned the rest, so
        // it converges a round later
        assert_eq!(robots[0].known_stations.len(), 2);
        exchange(&mut robots, 0);
        assert_eq!(robots[0].known_stations, everything);
    }
}
