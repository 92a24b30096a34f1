pub mod config;
pub mod reducer;
pub mod runner;
pub mod state;
