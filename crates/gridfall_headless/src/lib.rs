//! Headless playthrough runner.
//!
//! Loads serialized playthroughs, re-simulates them and reports on the
//! result. Used from CI to catch simulation regressions: any change
//! that alters the outcome of a recorded run shows up as a different
//! final state hash.
//!
//! - **stdout**: the report
//! - **stderr**: logs (human readable, `RUST_LOG` controlled)
//!
//! ```bash
//! # Re-simulate a recording and print the outcome
//! cargo run -p gridfall_headless -- verify --file run.gfp
//!
//! # Render the board as it was at tick 300
//! cargo run -p gridfall_headless -- inspect --file run.gfp --tick 300
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod render;
pub mod runner;

pub use render::render_ascii;
pub use runner::{inspect_at, verify_file, HeadlessError, ReplayReport};
