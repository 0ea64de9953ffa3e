// src/models/mod.rs

pub mod listing;
pub mod region;
pub mod user;
