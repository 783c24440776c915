//! Helpers for tests: fresh databases, seed data and recording doubles for the outside collaborators.
pub mod doubles;
pub mod prepare_env;
pub mod seed;
