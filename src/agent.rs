//! # Agent
//! Moves an agent along a committed path at a fixed speed per tick.
//!
//! Paths handed to the agent are stored back to front: the next waypoint is the
//! last element, so reaching it is a cheap `pop`.
use crate::common::Point;
use crate::utils;

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    position: Point,
    speed: f64,
}

impl Agent {
    pub fn new(position: Point, speed: f64) -> Self {
        assert!(speed > 0.0, "Agent speed must be positive, got {}", speed);
        Self { position, speed }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Travel up to `budget` along `path` (next waypoint last). Waypoints that are
    /// reached are popped, and any budget left over carries on to the following
    /// waypoint, so several short segments may be consumed in one call.
    pub fn advance(&mut self, path: &mut Vec<Point>, budget: f64) {
        let mut to_travel = budget;
        while let Some(&target) = path.last() {
            let dist = utils::distance(&self.position, &target);
            if dist <= to_travel {
                self.position = target;
                path.pop();
                to_travel -= dist;
            } else {
                self.position = utils::move_towards(&self.position, &target, to_travel);
                return;
            }
        }
    }

    /// One tick of travel at the agent's own speed
    pub fn step_along(&mut self, path: &mut Vec<Point>) {
        self.advance(path, self.speed);
    }

    /// Tick until the path is consumed, calling `on_tick` after every tick.
    /// Returns the number of ticks taken.
    pub fn run_until_empty<F>(&mut self, path: &mut Vec<Point>, mut on_tick: F) -> usize
    where
        F: FnMut(&Agent),
    {
        let mut ticks = 0;
        while !path.is_empty() {
            self.step_along(path);
            ticks += 1;
            on_tick(self);
        }
        ticks
    }
}
