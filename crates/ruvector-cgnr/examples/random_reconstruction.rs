//! Reconstruct a random 100x20 problem and report timing.
//!
//! ```text
//! cargo run --example random_reconstruction [-- out.pgm]
//! ```
//!
//! Set `RUST_LOG=ruvector_cgnr=trace` to see per-iteration residuals. When a
//! path is given, the 5x4 reconstruction is written there as an ASCII PGM.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use ruvector_cgnr::{CgnrSolver, ImageFrame, SyntheticProblem};
use tracing_subscriber::EnvFilter;

const ROWS: usize = 100;
const COLS: usize = 20;
const SEED: u64 = 2024;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ruvector_cgnr=debug")),
        )
        .init();

    let problem = SyntheticProblem::uniform(ROWS, COLS, SEED);
    let result = CgnrSolver::default().solve(&problem.operator, &problem.observation)?;

    println!("iterations:    {}", result.iterations);
    println!("elapsed:       {:.6} s", result.elapsed_seconds());
    println!("residual norm: {:.6e}", result.residual_norm);

    if let Some(path) = std::env::args().nth(1) {
        let frame = ImageFrame::from_solution(&result.image, 5, 4)?.normalize();
        frame.write_pgm(BufWriter::new(File::create(&path)?))?;
        println!("image written to {path}");
    }

    Ok(())
}
