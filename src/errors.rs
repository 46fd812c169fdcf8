//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`StrataError`] covers the failure modes of the
//! compositor and the resource layer:
//! - Pass contract violations (a pass without a `render` implementation)
//! - Composer state errors (rendering after `dispose`, bad pass indices)
//! - Backend errors surfaced by a [`Renderer`](crate::renderer::Renderer)
//!
//! Backend errors are never caught or translated by the compositor; they
//! travel unchanged to the caller of [`EffectComposer::render`](crate::EffectComposer::render).
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata::errors::{StrataError, Result};
//!
//! fn run(composer: &mut EffectComposer<HeadlessRenderer>) -> Result<()> {
//!     composer.render(Some(1.0 / 60.0))?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the compositor and its resource registries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrataError {
    // ========================================================================
    // Pass Contract Errors
    // ========================================================================
    /// A pass was asked to render but never overrode [`Pass::render`](crate::Pass::render).
    #[error("Pass '{pass}': render() must be implemented in derived pass")]
    PassNotImplemented {
        /// Name reported by the offending pass
        pass: String,
    },

    /// MaskPass / ClearMaskPass are not correctly paired in a pass sequence.
    #[error("Unpaired mask pass at index {index}: {reason}")]
    UnpairedMask {
        /// Index of the pass that breaks the pairing
        index: usize,
        /// Human readable description
        reason: &'static str,
    },

    // ========================================================================
    // Composer State Errors
    // ========================================================================
    /// The composer released its render targets and cannot render anymore.
    #[error("EffectComposer was disposed; call reset() before rendering again")]
    ComposerDisposed,

    /// Pass index out of bounds for an insertion.
    #[error("Pass index out of bounds: {index} (len: {len})")]
    PassIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Current number of passes
        len: usize,
    },

    /// A pass could not lock its shared scene or camera.
    #[error("{pass}: shared {resource} is locked elsewhere")]
    SceneLocked {
        /// Name of the pass that tried to lock
        pass: String,
        /// "scene" or "camera"
        resource: &'static str,
    },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// A fullscreen material refers to a program the backend cannot run.
    #[error("Unknown shader program: {0}")]
    UnknownProgram(String),

    /// A mesh refers to a geometry that its scene does not own.
    #[error("Mesh '{mesh}' refers to a missing geometry")]
    MissingGeometry {
        /// Mesh name
        mesh: String,
    },

    /// A mesh refers to a material that its scene does not own.
    #[error("Mesh '{mesh}' refers to a missing material")]
    MissingMaterial {
        /// Mesh name
        mesh: String,
    },

    /// Generic backend failure (context loss, device errors).
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
