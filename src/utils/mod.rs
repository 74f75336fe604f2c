//! # Utilities Module
//!
//! Geometry helpers and the marching-squares lookup used by tunnel generation.

pub mod marching_squares;
pub mod math;

pub use marching_squares::*;
pub use math::*;
