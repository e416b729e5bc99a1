//! # cpa-utils
//!
//! Building blocks shared by configurable program analyses: graph algorithms
//! (strongly connected components and elementary cycles), a control-flow
//! automaton with traversals and loop detection, helpers to look through
//! wrapper states, precisions and CPAs, recognisers for compiler builtins,
//! machine models, and wrappers around the external tools CBMC and CIL.
//!
//! Global services such as the unique id counter and the random number
//! generator are not statics; see [`context::AnalysisContext`].

pub mod builtins;
pub mod cfa;
pub mod context;
pub mod graph;
pub mod machine_model;
pub mod process;
pub mod strings;
pub mod tuple;
pub mod typed_vec;
pub mod wrapper;
