pub mod cpm;

pub use cpm::{run_cpm_program, CpmRun};
