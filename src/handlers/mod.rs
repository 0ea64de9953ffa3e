// src/handlers/mod.rs

pub mod auth;
pub mod listings;
pub mod regions;
pub mod users;
