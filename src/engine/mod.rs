pub mod round;
pub mod runner;
