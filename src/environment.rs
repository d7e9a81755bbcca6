//! # Environment
//! The bounded 2D workspace the planners operate in: the sampling bounds, a fixed
//! set of axis-aligned rectangular obstacles and the (re-assignable) goal region.
//!
//! All rectangle tests are inclusive, a point on an obstacle edge is in collision
//! and a point on the goal edge is in the goal.
use crate::common::Point;
use crate::error::Result;
use crate::utils;
use config::Config;
use geo::{coord, Intersects, Line, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle a path has to end in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalRegion {
    rect: Rect<f64>,
}

impl GoalRegion {
    pub fn new(min: Point, max: Point) -> Self {
        assert!(
            min[0] < max[0] && min[1] < max[1],
            "Goal region corners are inverted or degenerate: min {:?}, max {:?}",
            min,
            max
        );
        Self {
            rect: Rect::new(utils::to_coord(&min), utils::to_coord(&max)),
        }
    }

    /// Square goal region of side `2 * half_extent` centered on `center`
    pub fn around(center: Point, half_extent: f64) -> Self {
        assert!(half_extent > 0.0, "Goal half extent must be positive");
        let rect = utils::bbox_from_corner_points(&center, &center, half_extent, half_extent);
        Self::new(utils::to_point(rect.min()), utils::to_point(rect.max()))
    }

    pub fn contains(&self, p: &Point) -> bool {
        self.rect.intersects(&utils::to_coord(p))
    }

    pub fn min(&self) -> Point {
        utils::to_point(self.rect.min())
    }

    pub fn max(&self) -> Point {
        utils::to_point(self.rect.max())
    }

    pub fn rect(&self) -> &Rect<f64> {
        &self.rect
    }
}

#[derive(Debug, Clone)]
pub struct Environment {
    pub bounds: Rect<f64>,
    pub obstacles: Vec<Rect<f64>>,
    goal: GoalRegion,
}

impl Environment {
    /// Workspace spanning `[0, width] x [0, height]`
    pub fn new(width: f64, height: f64, obstacles: Vec<Rect<f64>>, goal: GoalRegion) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "Workspace bounds must be positive, got {} x {}",
            width,
            height
        );
        Self {
            bounds: Rect::new(coord! {x: 0.0, y: 0.0}, coord! {x: width, y: height}),
            obstacles,
            goal,
        }
    }

    /// Obstacle given as its corner with the smallest coordinates plus extent
    pub fn obstacle(corner: Point, width: f64, height: f64) -> Rect<f64> {
        assert!(
            width > 0.0 && height > 0.0,
            "Obstacle at {:?} is degenerate: {} x {}",
            corner,
            width,
            height
        );
        Rect::new(
            coord! {x: corner[0], y: corner[1]},
            coord! {x: corner[0] + width, y: corner[1] + height},
        )
    }

    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }

    pub fn goal(&self) -> &GoalRegion {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: GoalRegion) {
        self.goal = goal;
    }

    pub fn in_goal(&self, p: &Point) -> bool {
        self.goal.contains(p)
    }

    pub fn inside_bounds(&self, p: &Point) -> bool {
        self.bounds.intersects(&utils::to_coord(p))
    }

    /// Check that a point is outside every obstacle
    pub fn obstacle_free(&self, p: &Point) -> bool {
        let c = utils::to_coord(p);
        !self.obstacles.iter().any(|obstacle| obstacle.intersects(&c))
    }

    /// Check that the straight segment between two points touches no obstacle
    pub fn segment_obstacle_free(&self, p1: &Point, p2: &Point) -> bool {
        let line = Line::new(utils::to_coord(p1), utils::to_coord(p2));
        !self.obstacles.iter().any(|obstacle| line.intersects(obstacle))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ObstacleConfig {
    pub corner: [f64; 2],
    pub width: f64,
    pub height: f64,
}

/// Everything needed to set up a planning problem, loadable from a parameter file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scenario {
    pub start: [f64; 2],
    pub goal: [[f64; 2]; 2],
    pub bounds: [f64; 2],
    pub obstacles: Vec<ObstacleConfig>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            start: [10.0, 10.0],
            goal: [[85.0, 85.0], [95.0, 95.0]],
            bounds: [100.0, 100.0],
            obstacles: vec![
                ObstacleConfig {
                    corner: [0.0, 20.0],
                    width: 80.0,
                    height: 20.0,
                },
                ObstacleConfig {
                    corner: [20.0, 60.0],
                    width: 80.0,
                    height: 20.0,
                },
            ],
        }
    }
}

impl Scenario {
    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        let cfg = serde_json::from_value(json)?;
        Ok(cfg)
    }

    pub fn from_file(filename: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(config::File::with_name(filename))
            .build()?
            .try_deserialize::<Scenario>()?;
        Ok(cfg)
    }

    pub fn to_file(&self, filename: &str) -> Result<()> {
        serde_json::to_writer_pretty(std::fs::File::create(filename)?, &self)?;
        Ok(())
    }

    pub fn start_point(&self) -> Point {
        Point::new(self.start[0], self.start[1])
    }

    pub fn goal_region(&self) -> GoalRegion {
        GoalRegion::new(
            Point::new(self.goal[0][0], self.goal[0][1]),
            Point::new(self.goal[1][0], self.goal[1][1]),
        )
    }

    pub fn environment(&self) -> Environment {
        let obstacles = self
            .obstacles
            .iter()
            .map(|o| Environment::obstacle(Point::new(o.corner[0], o.corner[1]), o.width, o.height))
            .collect();
        Environment::new(self.bounds[0], self.bounds[1], obstacles, self.goal_region())
    }
}
