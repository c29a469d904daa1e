//! Cascading recipe resolution engine.
//!
//! A request for a cuisine, dish type and ingredient list is resolved
//! through four levels in order: the local SQLite recipe cache, external
//! recipe providers, sister cuisines from the cuisine atlas, and a
//! generative fallback. Results found outside the cache are written back.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
