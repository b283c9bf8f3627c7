//! cellgraph_engine - Cell positions, values and the formula language.

pub mod engine;
