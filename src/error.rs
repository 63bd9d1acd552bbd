// src/error.rs
//! Error handling for the physics crate.
//!
//! Nothing in a simulation step is fatal: configuration problems (bad gravity,
//! bad collider extents) surface as values of this type at the boundary where
//! they are detected and are then recovered from by the caller.

use std::fmt;
use thiserror::Error;

/// Main error type. Send + Sync + 'static.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PhysicsError {
    /// A box collider declared a non-positive or non-finite half extent.
    #[error("invalid collider: half extents must be positive and finite, got {extents}")]
    InvalidCollider { extents: String },

    /// The scene `gravity` property was not a numeric array of the right arity.
    #[error("malformed gravity: expected {expected} numbers, got {found}")]
    MalformedGravity { expected: usize, found: String },

    /// A component record could not be understood.
    #[error("invalid component `{kind}`: {reason}")]
    InvalidComponent { kind: String, reason: String },

    /// JSON (de)serialization of scenes and configs.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Simple custom message.
    #[error("{0}")]
    Custom(String),

    /// Context chaining.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<PhysicsError>,
    },
}

impl PhysicsError {
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn format(args: fmt::Arguments) -> Self {
        Self::Custom(fmt::format(args))
    }

    #[inline]
    pub(crate) fn invalid_component<K: Into<String>, R: Into<String>>(kind: K, reason: R) -> Self {
        Self::InvalidComponent {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with a description of what was being attempted.
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context layers.
    pub fn root(&self) -> &PhysicsError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    #[inline]
    pub fn is_invalid_collider(&self) -> bool {
        matches!(self.root(), PhysicsError::InvalidCollider { .. })
    }

    #[inline]
    pub fn is_malformed_gravity(&self) -> bool {
        matches!(self.root(), PhysicsError::MalformedGravity { .. })
    }

    #[inline]
    pub fn is_json(&self) -> bool {
        matches!(self.root(), PhysicsError::Json(_))
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PhysicsError>;
