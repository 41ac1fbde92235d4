// Murmur: Markov sentences and word clouds from observed timeline posts.
//
// This is the library root. Each module corresponds to a major subsystem
// of the generation pipeline.

pub mod audit;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod status;
pub mod tokenize;
pub mod web;
pub mod wordcloud;
