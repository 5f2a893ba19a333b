//! Leaf utilities shared by the engine: shape broadcasting, timestamp
//! normalization and name derivation.

pub mod broadcast;
pub mod naming;
pub mod time;
