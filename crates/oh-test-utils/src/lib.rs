//! Test utilities for the Office Hours coordinator.
//!
//! - [`MockStore`] - in-memory implementation of the store capability
//!   contract, with write counting and fault injection
//! - [`FakeClock`] - deterministic timestamp source
//! - [`fixtures`] - pre-wired coordinator test beds

pub mod fixtures;
pub mod mock_store;

pub use fixtures::{uid, FakeClock, TestBed};
pub use mock_store::MockStore;
