//! Screen print manual pricing: tier lookup, print cost with margin and flash,
//! additional locations, safety stripes, setup and LTM fees.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
