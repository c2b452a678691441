//! Adapter implementations for admission ports.

pub mod memory;
pub mod postgres;
