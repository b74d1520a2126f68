//! Test harnesses

mod simulator;

pub use simulator::StudySimulator;
