use std::num::NonZero;
use std::process::ExitCode;

use tilewave::builder::GridGraphBuilder;
use tilewave::{Catalog, CatalogError, Direction, Prototype, SocketSet, SolverBuilder, SolverFailure};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const MAX_ATTEMPTS: u64 = 32;

// right, left, down, up as bits 0..=3
const PIPE_GLYPHS: [char; 16] = [' ', '╶', '╴', '─', '╷', '┌', '┐', '┬', '╵', '└', '┘', '┴', '│', '├', '┤', '┼'];

fn demo_catalog() -> Result<Catalog, CatalogError> {
    Catalog::with_rotations([
        Prototype::new("empty", SocketSet::uniform("0"), 6.0),
        Prototype::new("end", SocketSet::new("1", "0", "0", "0"), 0.5),
        Prototype::new("straight", SocketSet::new("1", "1", "0", "0"), 3.0),
        Prototype::new("corner", SocketSet::new("1", "0", "1", "0"), 2.0),
        Prototype::new("tee", SocketSet::new("1", "1", "1", "0"), 1.0),
        Prototype::new("cross", SocketSet::uniform("1"), 0.5),
        // one-way conveyors: "ab" only fits "ba", so a belt keeps its direction until it reaches a sink
        Prototype::new("belt", SocketSet::new("ab", "ba", "0", "0"), 0.6),
        Prototype::new("source", SocketSet::new("ab", "0", "0", "0"), 0.05),
        Prototype::new("sink", SocketSet::new("0", "ba", "0", "0"), 0.1),
    ])
}

fn glyph(prototype: &Prototype) -> char {
    let side = |direction| prototype.socket(direction).value();

    if let Some(out) = [Direction::PositiveX, Direction::NegativeX, Direction::PositiveZ, Direction::NegativeZ].into_iter()
        .position(|direction| side(direction) == "ab") {
        return ['>', '<', 'v', '^'][out];
    }
    if prototype.payload() == "sink" {
        return 'o';
    }

    let bits = [Direction::PositiveX, Direction::NegativeX, Direction::PositiveZ, Direction::NegativeZ].into_iter()
        .enumerate()
        .filter(|(_, direction)| side(*direction) == "1")
        .fold(0, |bits, (bit, _)| bits | 1 << bit);
    PIPE_GLYPHS[bits]
}

fn parse_args() -> Result<(usize, usize, u64), String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let arg = |index: usize, default: &str| args.get(index).cloned().unwrap_or_else(|| default.to_string());

    let width = arg(0, "24").parse().map_err(|e| format!("bad width: {e}"))?;
    let height = arg(1, "12").parse().map_err(|e| format!("bad height: {e}"))?;
    let seed = arg(2, "0").parse().map_err(|e| format!("bad seed: {e}"))?;
    Ok((width, height, seed))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (width, height, seed) = match parse_args() {
        Ok(args) => args,
        Err(reason) => {
            error!(%reason, "usage: solver [width] [height] [seed]");
            return ExitCode::FAILURE;
        }
    };
    let (Some(width), Some(height)) = (NonZero::new(width), NonZero::new(height)) else {
        error!(width, height, "grid dimensions must be nonzero");
        return ExitCode::FAILURE;
    };

    let catalog = match demo_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(%e, "demo catalog rejected");
            return ExitCode::FAILURE;
        }
    };
    let (mut graph, layout) = match GridGraphBuilder::with_dims((width, height)).build() {
        Ok(built) => built,
        Err(reasons) => {
            error!(?reasons, "grid builder invalid");
            return ExitCode::FAILURE;
        }
    };

    for attempt in 0..MAX_ATTEMPTS {
        let seed = seed.wrapping_add(attempt);
        let mut solver = match SolverBuilder::new(&catalog).seed(seed).boundary_socket("0").build(&graph) {
            Ok(solver) => solver,
            Err(e) => {
                error!(%e, "could not set up the solve");
                return ExitCode::FAILURE;
            }
        };

        match solver.solve() {
            Ok(()) => {}
            Err(SolverFailure::Contradiction { cell }) => {
                warn!(seed, cell, "contradiction, retrying with the next seed");
                continue;
            }
            Err(e) => {
                error!(%e, "solve failed");
                return ExitCode::FAILURE;
            }
        }

        if let Err(e) = solver.write_to_graph(&mut graph) {
            error!(%e, "could not store the result");
            return ExitCode::FAILURE;
        }

        info!(seed, attempts = attempt + 1, "solved");
        print!("{}", layout.render(&graph, glyph));
        return ExitCode::SUCCESS;
    }

    error!(attempts = MAX_ATTEMPTS, "every attempt contradicted");
    ExitCode::FAILURE
}
