// src/handlers/mod.rs

pub mod admin;
pub mod challenge;
pub mod completion;
pub mod leaderboard;
