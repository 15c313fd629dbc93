// src/models/mod.rs

pub mod analytics;
pub mod answer;
pub mod content;
pub mod question;
pub mod user;
