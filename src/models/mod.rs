pub mod recipe;
pub mod search;
