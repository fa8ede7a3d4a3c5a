// src/error.rs
//! Error handling for the whole crate.
//!
//! Per-path and per-texture failures are recovered close to where they happen
//! (logged and skipped); only whole-document failures travel up to the
//! caller's `on_error` hook. The kinds below mirror that split.

use std::fmt;
use thiserror::Error;

/// Main error type. Send + Sync + 'static so it crosses await points.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed SVG markup or a document without an `<svg>` root.
    #[error("SVG parse error: {0}")]
    Parse(String),

    /// A single path produced no usable geometry.
    #[error("shape {index} could not be built: {reason}")]
    ShapeBuild { index: usize, reason: String },

    /// A texture URL failed to fetch or decode.
    #[error("failed to load texture '{url}': {reason}")]
    TextureLoad { url: String, reason: String },

    /// Disposal of an already-freed or foreign resource.
    #[error("resource disposal error: {0}")]
    ResourceDisposal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

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
        source: Box<Error>,
    },
}

impl Error {
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    /// Formatted custom error, used by `bail!`.
    #[inline]
    pub fn format(args: fmt::Arguments) -> Self {
        Self::Custom(fmt::format(args))
    }

    #[inline]
    pub fn msg(msg: &'static str) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    #[inline]
    pub fn texture_load(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::TextureLoad {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap with a context message.
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    #[inline]
    pub fn is_parse(&self) -> bool {
        matches!(self.root(), Error::Parse(_))
    }

    #[inline]
    pub fn is_shape_build(&self) -> bool {
        matches!(self.root(), Error::ShapeBuild { .. })
    }

    #[inline]
    pub fn is_texture_load(&self) -> bool {
        matches!(self.root(), Error::TextureLoad { .. })
    }

    #[inline]
    pub fn is_disposal(&self) -> bool {
        matches!(self.root(), Error::ResourceDisposal(_))
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<usvg::Error> for Error {
    fn from(err: usvg::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

/// `Result` alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
