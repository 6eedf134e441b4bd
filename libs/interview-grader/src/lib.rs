//! Code execution and grading engine for the sum-array coding round.
//!
//! `Grader::evaluate` runs untrusted source in a sandbox (a Docker container
//! or an isolated local interpreter) and scores it against the fixed oracle.

pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod harness;
pub mod process;


pub use executor::Grader;
