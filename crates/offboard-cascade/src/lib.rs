//! The deletion cascade for staff accounts.
//!
//! [`Cascade::delete_entity`] runs the invariant guard, walks the reference
//! catalog through the step executor in order, then removes the data-plane
//! record and finally the identity-plane record. Every run ends in a
//! [`DeletionReport`](offboard_core::report::DeletionReport); nothing that
//! can be expected to go wrong is raised as an error.

mod deadline;

pub mod error;
pub mod executor;
pub mod guard;
pub mod orchestrator;
pub mod verify;

pub use error::{Error, Result};
pub use orchestrator::{Cascade, CascadeOptions};

#[cfg(test)]
mod fake;
