pub mod aggregator;
pub mod alternatives;
pub mod atlas;
pub mod cascade;
pub mod catalog;
pub mod dish_type;
pub mod generator;
pub mod knowledge;
pub mod local_cache;
pub mod protein;
pub mod providers;
pub mod quality;
