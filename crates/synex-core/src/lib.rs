pub mod catalog;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod repository;
