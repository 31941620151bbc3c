//! team-grouping: split a class roster into teams or pairs and refine the
//! result by hand before exporting it.
//!
//! The [`engine`] turns a roster into a [`Grouping`] under one of the
//! [`Policy`] variants. An [`EditSession`] takes a generated grouping and
//! applies validated manual edits until it is saved or cancelled.

pub mod editor;
pub mod engine;
pub mod error;
pub mod group;
pub mod policy;
pub mod render;
pub mod roster;
pub mod store;

pub use editor::{EditSession, SaveRejected, StudentSource};
pub use engine::{partition, partition_by_name, partition_with};
pub use error::{EditConflict, SaveValidationError, StoreError, UnknownPolicyError, ValidationError};
pub use group::{Group, GroupStats, Grouping};
pub use policy::{Policy, PolicyFamily};
pub use roster::{ClassStats, Roster, Sex, SortField, Student};
