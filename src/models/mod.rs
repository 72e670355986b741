// src/models/mod.rs

pub mod challenge;
pub mod completion;
pub mod leaderboard;
pub mod user;
