//! # RRT
//! Contains the plain RRT growth policy: sample, find the nearest tree point,
//! steer towards the sample and attach the candidate under the nearest point.
//!
use crate::common::Point;
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
use tracing::info;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RRTParams {
    pub delta: f64, // max steering distance
    pub collision_check: CollisionCheck,
    pub log_interval: u64, // 0 disables progress logging
}

impl Default for RRTParams {
    fn default() -> Self {
        Self {
            delta: 5.0,
            collision_check: CollisionCheck::Endpoint,
            log_interval: 5000,
        }
    }
}

impl RRTParams {
    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        let cfg = serde_json::from_value(json)?;
        Ok(cfg)
    }

    pub fn from_file(filename: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(config::File::with_name(filename))
            .build()?
            .try_deserialize::<RRTParams>()?;
        Ok(cfg)
    }

    pub fn to_file(&self, filename: &str) -> Result<()> {
        serde_json::to_writer_pretty(std::fs::File::create(filename)?, &self)?;
        Ok(())
    }
}

pub struct RRT {
    pub params: RRTParams,
    pub steering: StraightLineSteering,
    pub num_iter: u64,
    rng: ChaChaRng,
}

impl RRT {
    /// A fixed `seed` makes the run reproducible, `None` seeds from entropy
    pub fn new(params: RRTParams, seed: Option<u64>) -> Self {
        info!("RRT initialized with params: {:?}", params);
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
}

impl Stepper for RRT {
    fn step(&mut self, tree: &mut SearchTree, env: &Environment) -> StepOutcome {
        self.num_iter += 1;
        if self.params.log_interval > 0 && self.num_iter % self.params.log_interval == 0 {
            info!("Num iter: {} | Num nodes: {}", self.num_iter, tree.len());
        }

        let p_rand = self.sample(env);
        let nearest = tree.nearest(&p_rand);
        let p_new = match self.steering.steer(&tree.point(nearest), &p_rand, env) {
            Some(p) => p,
            None => return StepOutcome::Rejected,
        };
        let node = tree.insert(p_new, nearest);
        StepOutcome::Inserted {
            node,
            in_goal: env.in_goal(&p_new),
        }
    }
}
