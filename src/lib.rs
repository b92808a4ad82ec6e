//! Interview simulator — scripted job interviews with randomized feedback.

pub mod cli;
pub mod config;
pub mod error;
pub mod interview;
