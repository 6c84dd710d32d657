//! # redrate-compound — Fixed-point compounding.
//!
//! All calculations use integer arithmetic only, so every implementation
//! that follows the same flooring rule produces the same bits.
//!
//! - **Exponentiation**: `base^n` by square-and-multiply, each product
//!   floored by the scale.
//! - **Root search**: the largest base whose floored power stays at or below
//!   a target, by bounded bisection.
//! - **Timeline search**: spreads a one-year compounded multiplier over the
//!   longest timeline whose per-second root reproduces it.

pub mod engine;
pub mod timeline;

pub use engine::Compounder;
