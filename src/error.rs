//! Error types for roster validation, policy lookup, editing and storage.

use thiserror::Error;

/// A student or roster failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("student name cannot be empty")]
    EmptyName,

    #[error("a student named \"{0}\" already exists in the class")]
    DuplicateName(String),

    #[error("invalid score {score} for student \"{name}\": score must be 0-100")]
    ScoreOutOfRange { name: String, score: i64 },

    #[error("invalid sex \"{0}\": use M or F")]
    InvalidSex(String),

    #[error("student {} not found: the class has {len} student(s)", .index + 1)]
    IndexOutOfRange { index: usize, len: usize },
}

/// The requested partition policy name is not one of the known tools.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown policy: {0}")]
pub struct UnknownPolicyError(pub String);

/// An edit could not be applied. The session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditConflict {
    /// Target group already holds the policy maximum.
    #[error("team is full: group {} already has {max} students", .group + 1)]
    TeamFull { group: usize, max: usize },

    /// The source indices no longer point at a student.
    #[error("student not found")]
    StudentNotFound,

    #[error("group {} not found", .0 + 1)]
    GroupNotFound(usize),

    /// Target is past the "create new group" slot.
    #[error("invalid target group {}: there are only {groups} groups", .target + 1)]
    InvalidTarget { target: usize, groups: usize },
}

/// `save()` refused to commit the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveValidationError {
    #[error("group {} has only {size} student(s); minimum is {min}", .group + 1)]
    Undersized { group: usize, size: usize, min: usize },

    #[error("{0} student(s) are unassigned; assign every student before saving")]
    Unassigned(usize),
}

/// Failures of the file-backed roster provider and grouping sink.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed class data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("a class named \"{0}\" already exists")]
    ClassExists(String),

    #[error("class name cannot be empty")]
    EmptyClassName,

    #[error("class \"{class}\" is invalid: {source}")]
    InvalidClass {
        class: String,
        #[source]
        source: ValidationError,
    },
}
