//! # Anytime RRT*
//! Online replanning on top of a growing tree. Each cycle commits the first few
//! edges of the current best path, prunes everything the agent leaves behind,
//! re-roots the tree at the end of the committed piece and lets the agent drive
//! it while the tree keeps growing.
//!
use crate::common::{NodeId, Point};
use crate::environment::{Environment, GoalRegion, Scenario};
use crate::error::Result;
use crate::planner::{Planner, Stepper};
use crate::rrt_star::{RRTStar, RRTStarParams};
use config::Config;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, info};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AnytimeParams {
    pub trajectory_length: usize, // number of edges committed per cycle
    pub agent_speed: f64,         // distance travelled per tick
}

impl Default for AnytimeParams {
    fn default() -> Self {
        Self {
            trajectory_length: 5,
            agent_speed: 0.1,
        }
    }
}

impl AnytimeParams {
    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        let cfg = serde_json::from_value(json)?;
        Ok(cfg)
    }

    pub fn from_file(filename: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(config::File::with_name(filename))
            .build()?
            .try_deserialize::<AnytimeParams>()?;
        Ok(cfg)
    }

    pub fn to_file(&self, filename: &str) -> Result<()> {
        serde_json::to_writer_pretty(std::fs::File::create(filename)?, &self)?;
        Ok(())
    }
}

/// What happened during one commit / prune / execute cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Committed trajectory, from the old root to the new root
    pub trajectory: Vec<Point>,
    /// Growth steps needed before a path to the goal existed
    pub search_steps: u64,
    pub pruned: usize,
    /// Agent ticks, each one also a growth step
    pub execution_ticks: usize,
}

pub struct AnytimeRRTStar<S: Stepper = RRTStar> {
    planner: Planner<S>,
    params: AnytimeParams,
    executed: Vec<Vec<Point>>,
    num_cycles: u64,
}

impl AnytimeRRTStar<RRTStar> {
    pub fn from_scenario(
        scenario: &Scenario,
        rrt_star_params: RRTStarParams,
        params: AnytimeParams,
        seed: Option<u64>,
    ) -> Self {
        Self::new(
            scenario.start_point(),
            scenario.environment(),
            RRTStar::new(rrt_star_params, seed),
            params,
        )
    }
}

impl<S: Stepper> AnytimeRRTStar<S> {
    pub fn new(start: Point, env: Environment, stepper: S, params: AnytimeParams) -> Self {
        assert!(
            params.trajectory_length >= 1,
            "At least one edge must be committed per cycle"
        );
        info!("Anytime RRT* initialized with params: {:?}", params);
        Self {
            planner: Planner::new(start, env, stepper, params.agent_speed),
            params,
            executed: Vec::new(),
            num_cycles: 0,
        }
    }

    pub fn planner(&self) -> &Planner<S> {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut Planner<S> {
        &mut self.planner
    }

    pub fn params(&self) -> &AnytimeParams {
        &self.params
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Move the goal. The trajectory driven towards the old goal is forgotten.
    pub fn set_goal(&mut self, goal: GoalRegion) {
        self.planner.set_goal(goal);
        self.executed.clear();
    }

    /// Everything the agent has driven since the last goal change
    pub fn executed_trajectory(&self) -> Vec<Point> {
        let mut points: Vec<Point> = Vec::new();
        for trajectory in self.executed.iter() {
            for p in trajectory.iter() {
                if points.last() != Some(p) {
                    points.push(*p);
                }
            }
        }
        points
    }

    /// Grow until a new point lands in the goal region. Returns the number of steps.
    pub fn step_until_found_goal(&mut self) -> u64 {
        let mut num_steps = 0;
        loop {
            num_steps += 1;
            if self.planner.step().reached_goal() {
                return num_steps;
            }
        }
    }

    /// The first `trajectory_length` edges of the current best path
    pub fn commit_trajectory(&self) -> Vec<NodeId> {
        let mut ids = self.planner.best_path_ids();
        ids.truncate(self.params.trajectory_length + 1);
        ids
    }

    /// Remove the committed trajectory (except its last point) together with
    /// every branch hanging off it, and make the last point the new root.
    /// Returns the number of points removed.
    pub fn prune_tree_and_set_new_root(&mut self, trajectory: &[NodeId]) -> usize {
        let (first, new_root) = match (trajectory.first(), trajectory.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return 0,
        };
        let tree = self.planner.tree_mut();
        assert_eq!(
            tree.parent(first),
            None,
            "Trajectory must start at the root"
        );

        let mut num_pruned = 0;
        let mut stack = vec![first];
        while let Some(current) = stack.pop() {
            if tree.parent(current).is_some() {
                tree.detach(current);
            }
            if current != new_root {
                stack.extend(tree.remove(current));
                num_pruned += 1;
            }
        }
        tree.set_root(new_root);
        debug!(
            "Pruned {} points | New root: {:?} | Num nodes: {}",
            num_pruned,
            tree.point(new_root),
            tree.len()
        );
        num_pruned
    }

    pub fn run_cycle(&mut self) -> CycleReport {
        let search_steps = if self.planner.best_path_ids().is_empty() {
            self.step_until_found_goal()
        } else {
            0
        };

        let ids = self.commit_trajectory();
        let trajectory = ids
            .iter()
            .map(|&id| self.planner.tree().point(id))
            .collect::<Vec<_>>();
        let pruned = self.prune_tree_and_set_new_root(&ids);

        let mut path = trajectory.iter().rev().copied().collect::<Vec<_>>();
        let execution_ticks = self.planner.run_until_empty(&mut path, true);
        self.executed.push(trajectory.clone());
        self.num_cycles += 1;
        info!(
            "Cycle {} | Search steps: {} | Pruned: {} | Ticks: {} | Num nodes: {}",
            self.num_cycles,
            search_steps,
            pruned,
            execution_ticks,
            self.planner.tree().len()
        );
        CycleReport {
            trajectory,
            search_steps,
            pruned,
            execution_ticks,
        }
    }

    /// Run cycles until `hook` breaks. The hook runs between cycles and may move
    /// the goal. Returns the number of cycles run.
    pub fn run<F>(&mut self, mut hook: F) -> u64
    where
        F: FnMut(&mut Self, &CycleReport) -> ControlFlow<()>,
    {
        let mut num_run = 0;
        loop {
            let report = self.run_cycle();
            num_run += 1;
            if hook(self, &report).is_break() {
                return num_run;
            }
        }
    }
}
