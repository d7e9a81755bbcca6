//! # RRT*
//! Contains the main RRT* functionality. On top of the plain RRT step, a new
//! point is attached to the cheapest parent in its neighbourhood, and the
//! neighbours are afterwards rewired through the new point whenever that
//! shortens their path to the root.
//!
use crate::common::{NodeId, Point};
use crate::environment::Environment;
use crate::error::Result;
use crate::planner::{StepOutcome, Stepper};
use crate::steering::{CollisionCheck, Steering, StraightLineSteering};
use crate::tree::SearchTree;
use crate::utils;
use config::Config;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RRTStarParams {
    pub delta: f64,   // max steering distance, also caps the neighbour radius
    pub gamma: f64,   // nearest neighbor radius parameter
    pub epsilon: f64, // slack on the neighbour radius
    pub collision_check: CollisionCheck,
    pub log_interval: u64, // 0 disables progress logging
}

impl Default for RRTStarParams {
    fn default() -> Self {
        Self {
            delta: 5.0,
            gamma: 250.0,
            epsilon: 1e-9,
            collision_check: CollisionCheck::Endpoint,
            log_interval: 5000,
        }
    }
}

impl RRTStarParams {
    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        let cfg = serde_json::from_value(json)?;
        Ok(cfg)
    }

    pub fn from_file(filename: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(config::File::with_name(filename))
            .build()?
            .try_deserialize::<RRTStarParams>()?;
        Ok(cfg)
    }

    pub fn to_file(&self, filename: &str) -> Result<()> {
        serde_json::to_writer_pretty(std::fs::File::create(filename)?, &self)?;
        Ok(())
    }
}

/// Compute nearest neighbours radius as in RRT* by Karaman and Frazzoli,
/// capped at the steering distance `delta`
pub fn compute_nn_radius(num_nodes: usize, gamma: f64, delta: f64) -> f64 {
    let n = num_nodes as f64;
    let ball_radius = gamma * (n.log2() / n).sqrt();
    ball_radius.min(delta)
}

pub struct RRTStar {
    pub params: RRTStarParams,
    pub steering: StraightLineSteering,
    pub num_iter: u64,
    rng: ChaChaRng,
}

impl RRTStar {
    /// A fixed `seed` makes the run reproducible, `None` seeds from entropy
    pub fn new(params: RRTStarParams, seed: Option<u64>) -> Self {
        info!("RRT* initialized with params: {:?}", params);
        let rng = match seed {
            Some(seed) => ChaChaRng::seed_from_u64(seed),
            None => ChaChaRng::from_entropy(),
        };
        Self {
            params,
            steering: StraightLineSteering::new(params.delta, params.collision_check),
            num_iter: 0,
            rng,
        }
    }

    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = ChaChaRng::seed_from_u64(seed);
    }

    pub fn sample(&mut self, env: &Environment) -> Point {
        utils::sample_from_bbox(&env.bounds, &mut self.rng)
    }

    /// Tree points within the current neighbour radius of `p`. A lone root is
    /// always a neighbour.
    pub fn nearest_neighbors(&self, tree: &SearchTree, p: &Point) -> Vec<NodeId> {
        if tree.len() == 1 {
            return vec![tree.root()];
        }
        let ball_radius = compute_nn_radius(tree.len(), self.params.gamma, self.params.delta);
        tree.within_distance(p, ball_radius + self.params.epsilon)
    }

    fn connectable(&self, env: &Environment, p1: &Point, p2: &Point) -> bool {
        match self.params.collision_check {
            CollisionCheck::Endpoint => true,
            CollisionCheck::Segment => env.segment_obstacle_free(p1, p2),
        }
    }

    /// Select parent here as the one giving minimum cost. The near points are
    /// tried first in the order given and `nearest` last, so the earliest
    /// candidate wins a tie.
    pub fn choose_parent(
        &self,
        tree: &SearchTree,
        env: &Environment,
        p_new: &Point,
        nearest: NodeId,
        near: &[NodeId],
    ) -> NodeId {
        let mut parent = None;
        let mut c_min = f64::INFINITY;
        for &candidate in near.iter().chain(std::iter::once(&nearest)) {
            let p_candidate = tree.point(candidate);
            if candidate != nearest && !self.connectable(env, &p_candidate, p_new) {
                continue;
            }
            let cost = tree.cost(candidate) + utils::distance(&p_candidate, p_new);
            if cost < c_min {
                c_min = cost;
                parent = Some(candidate);
            }
        }
        parent.unwrap_or(nearest)
    }

    /// Reroute every near point through `new_node` if that makes it cheaper.
    /// Costs are evaluated at the time each point is checked, so earlier
    /// rewires in the same pass are taken into account.
    pub fn rewire(
        &self,
        tree: &mut SearchTree,
        env: &Environment,
        new_node: NodeId,
        near: &[NodeId],
    ) -> usize {
        let parent = tree.parent(new_node);
        let p_new = tree.point(new_node);
        let mut num_rewired = 0;
        for &member in near.iter() {
            if Some(member) == parent || member == new_node {
                continue;
            }
            let p_member = tree.point(member);
            let cost_via_new = tree.cost(new_node) + utils::distance(&p_new, &p_member);
            let cost_member = tree.cost(member);
            if cost_via_new < cost_member
                && !tree.is_ancestor(member, new_node)
                && self.connectable(env, &p_new, &p_member)
            {
                trace!(
                    "Rewired! | Old cost: {} | New cost: {}",
                    cost_member,
                    cost_via_new
                );
                tree.rewire(member, new_node);
                num_rewired += 1;
            }
        }
        num_rewired
    }
}

impl Stepper for RRTStar {
    fn step(&mut self, tree: &mut SearchTree, env: &Environment) -> StepOutcome {
        self.num_iter += 1;
        if self.params.log_interval > 0 && self.num_iter % self.params.log_interval == 0 {
            info!(
                "Num iter: {} | Num nodes: {} | NN radius: {}",
                self.num_iter,
                tree.len(),
                compute_nn_radius(tree.len(), self.params.gamma, self.params.delta)
            );
        }

        let p_rand = self.sample(env);
        let nearest = tree.nearest(&p_rand);
        let p_new = match self.steering.steer(&tree.point(nearest), &p_rand, env) {
            Some(p) => p,
            None => return StepOutcome::Rejected,
        };

        let near = self.nearest_neighbors(tree, &p_new);
        let parent = self.choose_parent(tree, env, &p_new, nearest, &near);
        let node = tree.insert(p_new, parent);
        self.rewire(tree, env, node, &near);
        StepOutcome::Inserted {
            node,
            in_goal: env.in_goal(&p_new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TreeEvent;
    use crate::environment::Scenario;
    use crate::planner::Planner;
    use approx::assert_relative_eq;
    use std::sync::mpsc::channel;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn env() -> Environment {
        Scenario::default().environment()
    }

    fn rrt_star(seed: u64) -> RRTStar {
        RRTStar::new(RRTStarParams::default(), Some(seed))
    }

    #[test]
    fn test_nn_radius_shrinks() {
        let r_small = compute_nn_radius(10, 250.0, 200.0);
        let r_large = compute_nn_radius(10_000, 250.0, 200.0);
        assert!(r_small > r_large);
        assert_relative_eq!(r_small, 250.0 * (10f64.log2() / 10.0).sqrt());
        // The default steering distance caps both
        assert_eq!(compute_nn_radius(10, 250.0, 5.0), 5.0);
        assert_eq!(compute_nn_radius(10_000, 250.0, 5.0), 5.0);
    }

    #[test]
    fn test_nearest_neighbors_of_lone_root() {
        let tree = SearchTree::new(p(10.0, 10.0));
        let rrt = rrt_star(0);
        assert_eq!(rrt.nearest_neighbors(&tree, &p(90.0, 90.0)), vec![tree.root()]);
    }

    #[test]
    fn test_nearest_neighbors_within_radius() {
        let mut tree = SearchTree::new(p(10.0, 10.0));
        let root = tree.root();
        let a = tree.insert(p(13.0, 14.0), root);
        let b = tree.insert(p(16.0, 18.0), a);
        let rrt = rrt_star(0);
        assert_eq!(rrt.nearest_neighbors(&tree, &p(13.0, 14.0)), vec![root, a, b]);
        assert_eq!(rrt.nearest_neighbors(&tree, &p(18.0, 18.0)), vec![b]);
        assert!(rrt.nearest_neighbors(&tree, &p(50.0, 50.0)).is_empty());
    }

    #[test]
    fn test_choose_parent_minimizes_cost() {
        let mut tree = SearchTree::new(p(0.0, 0.0));
        let root = tree.root();
        let a = tree.insert(p(10.0, 0.0), root);
        let b = tree.insert(p(10.0, 10.0), a);
        let rrt = rrt_star(0);
        let env = env();
        let p_new = p(7.0, 9.0);
        assert_eq!(tree.nearest(&p_new), b);
        assert_eq!(rrt.choose_parent(&tree, &env, &p_new, b, &[root, a, b]), root);
        assert_eq!(rrt.choose_parent(&tree, &env, &p_new, b, &[a]), a);
        assert_eq!(rrt.choose_parent(&tree, &env, &p_new, b, &[]), b);
    }

    #[test]
    fn test_choose_parent_first_wins_ties() {
        let mut tree = SearchTree::new(p(50.0, 50.0));
        let root = tree.root();
        let a = tree.insert(p(52.0, 50.0), root);
        let b = tree.insert(p(48.0, 50.0), root);
        let rrt = rrt_star(0);
        let env = env();
        let p_new = p(50.0, 47.0);
        // Root is the cheapest by far, so leave it out to compare a and b
        assert_eq!(rrt.choose_parent(&tree, &env, &p_new, a, &[a, b]), a);
        assert_eq!(rrt.choose_parent(&tree, &env, &p_new, a, &[b, a]), b);
    }

    #[test]
    fn test_rewire_through_new_node() {
        let (tx, rx) = channel();
        let mut tree = SearchTree::new(p(0.0, 0.0));
        let root = tree.root();
        let a = tree.insert(p(10.0, 0.0), root);
        let b = tree.insert(p(10.0, 10.0), a);
        let n = tree.insert(p(3.0, 6.0), root);
        tree.set_observer(Box::new(tx));

        let rrt = rrt_star(0);
        let num_rewired = rrt.rewire(&mut tree, &env(), n, &[root, a, b]);
        assert_eq!(num_rewired, 1);
        assert_eq!(tree.parent(b), Some(n));
        assert_eq!(tree.parent(a), Some(root));
        assert!(!tree.children(a).contains(&b));
        assert_relative_eq!(tree.cost(b), 45f64.sqrt() + 65f64.sqrt(), epsilon = 1e-12);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![TreeEvent::Rewired {
                child: b,
                old_parent: a,
                new_parent: n
            }]
        );
    }

    #[test]
    fn test_tree_stays_acyclic_with_monotonic_cost() {
        let scenario = Scenario::default();
        let mut planner = Planner::new(
            scenario.start_point(),
            scenario.environment(),
            rrt_star(5),
            0.1,
        );
        planner.grow_until_inserted(1500);
        let tree = planner.tree();
        assert_eq!(tree.len(), 1501);
        assert!(tree.is_consistent());
        for (id, node) in tree.iter() {
            if let Some(parent) = node.parent {
                assert!(tree.cost(parent) <= tree.cost(id));
            }
            assert!(planner.env().obstacle_free(&node.point));
        }
    }

    #[test]
    fn test_segment_collision_check_keeps_edges_free() {
        let scenario = Scenario::default();
        let params = RRTStarParams {
            collision_check: CollisionCheck::Segment,
            ..Default::default()
        };
        let mut planner = Planner::new(
            scenario.start_point(),
            scenario.environment(),
            RRTStar::new(params, Some(9)),
            0.1,
        );
        planner.run_steps(2000);
        assert!(planner.tree().is_consistent());
        for (from, to) in planner.tree().edges() {
            assert!(planner.env().segment_obstacle_free(&from, &to));
        }
    }

    #[test]
    fn test_rrt_star_reaches_goal() {
        let scenario = Scenario::default();
        let mut planner = Planner::new(
            scenario.start_point(),
            scenario.environment(),
            rrt_star(1),
            0.1,
        );
        planner.grow_until_inserted(2000);
        let path = planner.best_path_to_goal();
        assert!(!path.is_empty());
        assert_eq!(path[0], p(10.0, 10.0));
        assert!(planner.env().in_goal(path.last().unwrap()));
        for pair in path.windows(2) {
            assert!(utils::distance(&pair[0], &pair[1]) <= 5.0 + 1e-6);
        }
        let soln = planner.best_solution().unwrap();
        assert_relative_eq!(soln.cost, utils::compute_path_length(&path), epsilon = 1e-9);
    }

    #[test]
    fn test_params_config() {
        let params = RRTStarParams::from_json_value(serde_json::json!({ "gamma": 100.0 })).unwrap();
        assert_eq!(params.gamma, 100.0);
        assert_eq!(params.delta, 5.0);
        assert_eq!(params.epsilon, 1e-9);

        let filename = std::env::temp_dir().join("anytime_rrt_star_rrt_star_params_test.json");
        let filename = filename.to_str().unwrap();
        params.to_file(filename).unwrap();
        assert_eq!(RRTStarParams::from_file(filename).unwrap(), params);
        std::fs::remove_file(filename).unwrap();
    }
}
