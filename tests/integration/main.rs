//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below exercises one part of the control core against the
//! mock sensor layer in `mock_hw`.  Everything runs on the host with no
//! real hardware required.

mod builder_tests;
mod mock_hw;
mod zone_tests;
