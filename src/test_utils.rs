// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons.
//!
//! Millisecond positions, volumes and frame rates are `f32`/`f64` values
//! computed through several divisions, so tests compare them with the
//! `approx` macros re-exported here instead of `assert_eq!`.

pub use approx::{assert_abs_diff_eq, assert_relative_eq};

/// Tolerance for millisecond positions derived from frame arithmetic.
pub const MS_EPSILON: f64 = 1e-6;
