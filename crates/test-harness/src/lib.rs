//! Test harness for scripted modeling sessions.
//!
//! Provides a named-feature builder over a [`Timeline`](feature_engine::Timeline)
//! and the mock kernel, plus assertion helpers that report what they saw.
//!
//! # Key Components
//!
//! - [`ModelBuilder`]: fluent API for building and verifying models
//! - [`helpers`]: sketch element builders and reference constructors
//! - [`assertions`]: assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod workflow;

pub use helpers::HarnessError;
pub use workflow::ModelBuilder;
