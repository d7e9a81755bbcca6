//! # Planner
//! Couples a search tree, the environment and an agent with a tree growth policy.
//! The policies (RRT, RRT*) implement [`Stepper`] and only ever see the tree and
//! the environment they are handed, so the same planner drives either of them.
use crate::agent::Agent;
use crate::common::{NodeId, Point, Solution, TreeObserver};
use crate::environment::{Environment, GoalRegion};
use crate::tree::SearchTree;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The steered candidate was in collision, nothing changed
    Rejected,
    Inserted { node: NodeId, in_goal: bool },
}

impl StepOutcome {
    pub fn inserted(&self) -> Option<NodeId> {
        match self {
            StepOutcome::Inserted { node, .. } => Some(*node),
            StepOutcome::Rejected => None,
        }
    }

    pub fn reached_goal(&self) -> bool {
        matches!(self, StepOutcome::Inserted { in_goal: true, .. })
    }
}

/// One unit of tree growth
pub trait Stepper {
    fn step(&mut self, tree: &mut SearchTree, env: &Environment) -> StepOutcome;
}

pub struct Planner<S: Stepper> {
    tree: SearchTree,
    env: Environment,
    stepper: S,
    agent: Agent,
}

impl<S: Stepper> Planner<S> {
    pub fn new(start: Point, env: Environment, stepper: S, agent_speed: f64) -> Self {
        assert!(
            env.obstacle_free(&start),
            "Start {:?} lies inside an obstacle",
            start
        );
        Self {
            tree: SearchTree::new(start),
            env,
            stepper,
            agent: Agent::new(start, agent_speed),
        }
    }

    pub fn step(&mut self) -> StepOutcome {
        self.stepper.step(&mut self.tree, &self.env)
    }

    /// Attempt `num_steps` growth steps, returning how many inserted a point
    pub fn run_steps(&mut self, num_steps: u64) -> u64 {
        let mut num_inserted = 0;
        for i in 0..num_steps {
            if i % 100 == 0 {
                debug!("{} steps completed", i);
            }
            if self.step().inserted().is_some() {
                num_inserted += 1;
            }
        }
        num_inserted
    }

    /// Step until `num_inserted` points have been added, returning the number of attempts
    pub fn grow_until_inserted(&mut self, num_inserted: usize) -> u64 {
        let mut attempts = 0;
        let mut inserted = 0;
        while inserted < num_inserted {
            attempts += 1;
            if self.step().inserted().is_some() {
                inserted += 1;
            }
        }
        attempts
    }

    /// Lowest cost tree point inside the goal region
    fn best_goal_node(&self) -> Option<(NodeId, f64)> {
        let mut best: Option<(NodeId, f64)> = None;
        for (id, node) in self.tree.iter() {
            if !self.env.in_goal(&node.point) {
                continue;
            }
            let cost = self.tree.cost(id);
            if best.map_or(true, |(_, c_best)| cost < c_best) {
                best = Some((id, cost));
            }
        }
        best
    }

    /// Node handles of the lowest cost path from the root into the goal region,
    /// empty if no tree point is in the goal yet
    pub fn best_path_ids(&self) -> Vec<NodeId> {
        match self.best_goal_node() {
            Some((id, cost)) => {
                debug!("Path cost: {}", cost);
                self.tree.path_from_root(id)
            }
            None => Vec::new(),
        }
    }

    pub fn best_path_to_goal(&self) -> Vec<Point> {
        self.best_path_ids()
            .into_iter()
            .map(|id| self.tree.point(id))
            .collect()
    }

    pub fn best_solution(&self) -> Option<Solution> {
        let (id, cost) = self.best_goal_node()?;
        let path = self
            .tree
            .path_from_root(id)
            .into_iter()
            .map(|id| self.tree.point(id))
            .collect::<Vec<_>>();
        Some(Solution::new(&path, cost))
    }

    /// Root path to the tree point nearest `position`
    pub fn path_to_nearest(&self, position: &Point) -> Vec<Point> {
        let nearest = self.tree.nearest(position);
        self.tree
            .path_from_root(nearest)
            .into_iter()
            .map(|id| self.tree.point(id))
            .collect()
    }

    /// Replace the goal region. Takes effect from the next step or query on.
    pub fn set_goal(&mut self, goal: GoalRegion) {
        info!("Goal set to {:?} - {:?}", goal.min(), goal.max());
        self.env.set_goal(goal);
    }

    pub fn goal(&self) -> &GoalRegion {
        self.env.goal()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut SearchTree {
        &mut self.tree
    }

    pub fn set_observer(&mut self, observer: Box<dyn TreeObserver>) {
        self.tree.set_observer(observer);
    }

    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    pub fn stepper_mut(&mut self) -> &mut S {
        &mut self.stepper
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Move the agent up to `budget` along `path` (next waypoint last)
    pub fn advance(&mut self, path: &mut Vec<Point>, budget: f64) {
        self.agent.advance(path, budget);
    }

    /// Move the agent at its own speed until `path` is consumed, optionally growing
    /// the tree once per tick. Returns the number of ticks.
    pub fn run_until_empty(&mut self, path: &mut Vec<Point>, step_growth: bool) -> usize {
        let stepper = &mut self.stepper;
        let tree = &mut self.tree;
        let env = &self.env;
        self.agent.run_until_empty(path, |_| {
            if step_growth {
                stepper.step(tree, env);
            }
        })
    }
}
