//! Labeled dataset input model

pub mod array;

pub use array::{Coordinate, Dataset, Variable};
