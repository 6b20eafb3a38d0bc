//! Persistence for students, exercises, categories, progress history and
//! per-set rows, behind async repository traits.
#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;
