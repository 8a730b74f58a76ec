//! Utility functions for the application

pub mod sql;
pub mod time;
