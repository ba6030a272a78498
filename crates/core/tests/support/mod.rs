//! Shared test helpers for `pdpsync-core` integration tests.
//!
//! In-memory doubles of every port plus flow and acknowledgement fixtures,
//! so scenario tests can focus on behaviour instead of wiring.

#![allow(dead_code)]

pub mod fixtures;
pub mod provider;
pub mod repositories;
