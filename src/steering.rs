//! # Steering
//! Produces the next candidate waypoint when growing the tree from a tree point
//! towards a sampled point. Candidates are bounded to `delta` from the source and
//! rejected if they collide with an obstacle.
//!
//! By default only the candidate itself is checked, so a step may jump across an
//! obstacle thinner than `delta`. `CollisionCheck::Segment` additionally sweeps
//! the connecting segment.
use crate::common::Point;
use crate::environment::Environment;
use crate::utils;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollisionCheck {
    /// Check the candidate point only
    #[default]
    Endpoint,
    /// Check the candidate point and the segment from the source to it
    Segment,
}

pub trait Steering {
    /// Candidate point from `source` towards `destination`, or `None` if the
    /// candidate is in collision.
    fn steer(&self, source: &Point, destination: &Point, env: &Environment) -> Option<Point>;
}

#[derive(Debug, Clone, Copy)]
pub struct StraightLineSteering {
    pub delta: f64,
    pub collision_check: CollisionCheck,
}

impl StraightLineSteering {
    pub fn new(delta: f64, collision_check: CollisionCheck) -> Self {
        assert!(delta > 0.0, "Steering distance must be positive, got {}", delta);
        Self {
            delta,
            collision_check,
        }
    }
}

impl Steering for StraightLineSteering {
    fn steer(&self, source: &Point, destination: &Point, env: &Environment) -> Option<Point> {
        let dist = utils::distance(source, destination);
        let candidate = if dist <= self.delta {
            *destination
        } else {
            utils::move_towards(source, destination, self.delta)
        };
        if !env.obstacle_free(&candidate) {
            return None;
        }
        match self.collision_check {
            CollisionCheck::Endpoint => Some(candidate),
            CollisionCheck::Segment if env.segment_obstacle_free(source, &candidate) => {
                Some(candidate)
            }
            CollisionCheck::Segment => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Scenario;
    use approx::assert_relative_eq;

    fn env() -> Environment {
        Scenario::default().environment()
    }

    #[test]
    fn test_steer_within_delta_returns_destination() {
        let steering = StraightLineSteering::new(5.0, CollisionCheck::Endpoint);
        let source = Point::new(10.0, 10.0);
        let destination = Point::new(12.5, 13.1);
        assert_eq!(steering.steer(&source, &destination, &env()), Some(destination));
    }

    #[test]
    fn test_steer_within_delta_into_obstacle_is_rejected() {
        let steering = StraightLineSteering::new(5.0, CollisionCheck::Endpoint);
        let source = Point::new(10.0, 18.0);
        let destination = Point::new(10.0, 21.0);
        assert_eq!(steering.steer(&source, &destination, &env()), None);
    }

    #[test]
    fn test_steer_is_bounded_by_delta() {
        let steering = StraightLineSteering::new(5.0, CollisionCheck::Endpoint);
        let source = Point::new(10.0, 10.0);
        let destination = Point::new(90.0, 10.0);
        let candidate = steering.steer(&source, &destination, &env()).unwrap();
        assert_relative_eq!(candidate[0], 15.0);
        assert_relative_eq!(candidate[1], 10.0);
        assert_relative_eq!(utils::distance(&source, &candidate), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_steer_bounded_candidate_in_obstacle_is_rejected() {
        let steering = StraightLineSteering::new(5.0, CollisionCheck::Endpoint);
        let source = Point::new(10.0, 17.0);
        let destination = Point::new(10.0, 90.0);
        assert_eq!(steering.steer(&source, &destination, &env()), None);
    }

    #[test]
    fn test_endpoint_check_tunnels_through_thin_obstacle() {
        let thin = Environment::new(
            100.0,
            100.0,
            vec![Environment::obstacle(Point::new(0.0, 20.0), 100.0, 1.0)],
            Scenario::default().goal_region(),
        );
        let source = Point::new(50.0, 18.0);
        let destination = Point::new(50.0, 22.0);

        let endpoint = StraightLineSteering::new(5.0, CollisionCheck::Endpoint);
        assert_eq!(endpoint.steer(&source, &destination, &thin), Some(destination));

        let segment = StraightLineSteering::new(5.0, CollisionCheck::Segment);
        assert_eq!(segment.steer(&source, &destination, &thin), None);
        let free = Point::new(53.0, 18.0);
        assert_eq!(segment.steer(&source, &free, &thin), Some(free));
    }

    #[test]
    fn test_collision_check_serde() {
        let check: CollisionCheck = serde_json::from_value(serde_json::json!("segment")).unwrap();
        assert_eq!(check, CollisionCheck::Segment);
        assert_eq!(CollisionCheck::default(), CollisionCheck::Endpoint);
    }
}
