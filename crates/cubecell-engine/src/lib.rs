//! cubecell_engine - Address codec, dependency graph, formula parser and evaluator.

pub mod engine;
