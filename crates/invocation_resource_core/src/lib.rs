//! Lifecycle primitives for invocation-backed pseudo-resources.
//!
//! A managed resource has no state of its own: creating or updating it means
//! synchronously invoking a remote function and recording the response, and
//! deleting it optionally invokes a finalizer function. This crate owns the
//! resource contract, the lifecycle handler and the reconcile harness that
//! decides when the handler runs. It intentionally excludes AWS SDK concerns,
//! which live in `invocation_resource_lambda`.

pub mod contract;
pub mod error;
pub mod invoker;
pub mod lifecycle;
pub mod logging;
pub mod reconcile;
pub mod state;
