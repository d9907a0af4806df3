pub mod config;
pub mod engine;
pub mod error;
pub mod stack;
pub mod stream;
pub mod tape;

pub use config::{BoundsPolicy, EngineConfig, EofPolicy};
pub use engine::{Engine, RunStats, run_file, run_program};
pub use error::{Error, ErrorKind, Result};
