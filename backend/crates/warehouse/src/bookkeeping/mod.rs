pub mod bigquery_repository;
pub mod bookkeeper;
pub mod models;
pub mod repositories;
