//! # Anytime RRT* Library
//! Implements sampling based motion planning for a point agent in a bounded 2D
//! workspace with axis-aligned rectangular obstacles:
//! - RRT
//! - RRT*
//! - Anytime RRT* (commit part of the best path, prune, re-root and execute
//!   while the tree keeps growing)
//!
//! ## Usage
//! Build an [`environment::Environment`] (or load a [`environment::Scenario`]
//! from file), pick a growth policy and drive it through a [`planner::Planner`],
//! or hand everything to [`anytime::AnytimeRRTStar`] for online replanning.
//! Tree changes can be observed through [`common::TreeObserver`], e.g. to keep a
//! drawing in sync.
pub mod agent;
pub mod anytime;
pub mod common;
pub mod environment;
pub mod error;
pub mod planner;
pub mod plot;
pub mod rrt;
pub mod rrt_star;
pub mod steering;
pub mod tree;
pub mod utils;
