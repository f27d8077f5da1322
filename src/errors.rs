//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`FableError`] covers all failure modes including:
//! - Backend context acquisition and loss
//! - Shader compilation and linking failures
//! - Renderer lifecycle misuse
//!
//! Structural scene-graph misuse (self-attach, cycle creation) is *not* an
//! error value: those mutations are rejected in place with a warning
//! diagnostic and the tree left unchanged. Per-drawable resource failures are
//! likewise recovered locally by skipping the drawable for the frame.
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, FableError>`.

use thiserror::Error;

/// The main error type for the engine.
#[derive(Error, Debug)]
pub enum FableError {
    // ========================================================================
    // Backend & Context Errors (fatal to the renderer instance)
    // ========================================================================
    /// No graphics context could be acquired from the backend.
    #[error("Graphics context unavailable: {0}")]
    ContextUnavailable(String),

    /// The underlying graphics context was lost. The renderer must be fully
    /// re-initialized; this is never retried automatically.
    #[error("Graphics context lost")]
    ContextLost,

    // ========================================================================
    // Shader Errors (localized to one material/drawable)
    // ========================================================================
    /// A shader stage failed to compile.
    #[error("Shader compile error in '{label}': {log}")]
    ShaderCompile {
        /// Label of the material or program being compiled
        label: String,
        /// Compiler diagnostic output
        log: String,
    },

    /// Compiled shader stages failed to link into a program.
    #[error("Program link error in '{label}': {log}")]
    ShaderLink {
        /// Label of the material or program being linked
        label: String,
        /// Linker diagnostic output
        log: String,
    },

    // ========================================================================
    // Renderer Lifecycle Errors
    // ========================================================================
    /// The node handed to `render` carries no camera component.
    #[error("Node has no camera component")]
    CameraNotFound,
}

/// Alias for `Result<T, FableError>`.
pub type Result<T> = std::result::Result<T, FableError>;
