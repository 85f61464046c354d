//! Layout and per-event aggregation for a square crystal calorimeter.
//!
//! [`geometry`] derives where every crystal sits and which grid cells are left
//! open for the beam. [`aggregation`] turns the hits of one event into one row
//! of each output table, and [`tables`] writes those rows out.

pub mod aggregation;
pub mod common;
pub mod domain;
pub mod geometry;
pub mod tables;
