//! # Plot
//! SVG rendering of the workspace, the tree and optionally a path and the agent.
//! Only reads from the tree, so it can be called between any two steps.
use crate::common::Point;
use crate::environment::Environment;
use crate::tree::SearchTree;
use plotters::prelude::*;

pub fn draw_tree(
    filename: &str,
    tree: &SearchTree,
    env: &Environment,
    path: Option<&[Point]>,
    agent: Option<&Point>,
) -> Result<(), Box<dyn std::error::Error>> {
    let drawing_area = SVGBackend::new(filename, (640, 640)).into_drawing_area();
    drawing_area.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&drawing_area).margin(10).build_cartesian_2d(
        env.bounds.min().x..env.bounds.max().x,
        env.bounds.min().y..env.bounds.max().y,
    )?;

    chart.draw_series(env.obstacles.iter().map(|obstacle| {
        Rectangle::new(
            [
                (obstacle.min().x, obstacle.min().y),
                (obstacle.max().x, obstacle.max().y),
            ],
            BLACK.mix(0.6).filled(),
        )
    }))?;

    let goal = env.goal();
    chart.draw_series(std::iter::once(Rectangle::new(
        [(goal.min()[0], goal.min()[1]), (goal.max()[0], goal.max()[1])],
        GREEN.mix(0.4).filled(),
    )))?;

    chart.draw_series(
        tree.edges()
            .map(|(from, to)| PathElement::new(vec![(from[0], from[1]), (to[0], to[1])], &BLUE)),
    )?;
    chart.draw_series(
        tree.points()
            .map(|p| Circle::new((p[0], p[1]), 1, RED.filled())),
    )?;

    if let Some(path) = path {
        chart.draw_series(LineSeries::new(
            path.iter().map(|p| (p[0], p[1])),
            GREEN.stroke_width(2),
        ))?;
    }
    if let Some(agent) = agent {
        chart.draw_series(std::iter::once(Circle::new(
            (agent[0], agent[1]),
            4,
            MAGENTA.filled(),
        )))?;
    }

    drawing_area.present()?;
    Ok(())
}
