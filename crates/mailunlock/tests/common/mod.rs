//! Shared test utilities for integration tests.

pub mod fakes;
pub mod harness;
pub mod pdf;

#[allow(unused_imports)]
pub use fakes::{FakeMailSource, RecordingReporter, ScriptedUnlocker};
#[allow(unused_imports)]
pub use harness::TestHarness;
