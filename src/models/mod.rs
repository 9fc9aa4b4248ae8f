// src/models/mod.rs

pub mod course;
pub mod enrollment;
pub mod question;
pub mod submission;
pub mod user;
