pub mod cli;
pub mod config;
pub mod corpus;
pub mod judge;
pub mod providers;
pub mod ragmark_tracing;
pub mod recording;
pub mod report;
pub mod retrieval;
pub mod runner;
