//! The ownership and sharing core: who may read, write and delete a device's
//! state, how share grants move through their lifecycle, how telemetry reports
//! are reconciled into a single current-status row, and how deletes cascade.
//!
//! Everything here is stateless between calls; all state lives in the
//! database. The HTTP layer resolves the caller into an [`AuthContext`] and
//! hands it to these modules, which make every authorization decision
//! explicitly against it.

pub mod authority;
pub mod cascade;
pub mod error;
pub mod sharing;
pub mod status;

pub use authority::{AccessSource, AuthContext};
pub use error::{CoreError, CoreResult};
