//! Unit tests for the admission engine.
