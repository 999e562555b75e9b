//! Command implementations for the Vigil CLI

pub mod check;
pub mod route;
pub mod run;
