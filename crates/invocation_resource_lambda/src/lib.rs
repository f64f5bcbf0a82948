//! AWS Lambda adapters for invocation-backed resources.
//!
//! This crate owns runtime integration details (SDK client construction,
//! credential and region resolution, the synchronous invoke bridge) and the
//! `lambdabased` command line entry point. Lifecycle semantics live in
//! `invocation_resource_core`.

pub mod adapters;
pub mod config;
