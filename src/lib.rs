pub mod chronology;
pub mod config;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod render;
