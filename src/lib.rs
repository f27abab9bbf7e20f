pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod stats;
pub mod sync;
pub mod vocab;
pub mod wikibase;
