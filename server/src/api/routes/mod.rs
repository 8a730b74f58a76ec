//! API route handlers

pub mod data;
pub mod health;
