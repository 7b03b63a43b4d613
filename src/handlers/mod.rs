//! Handler builders and associated traits.
//!
//! Provides a builder API for constructing the mail handlers in a type-safe
//! manner. Each builder validates its configuration and implements
//! [`HandlerBuilderTrait`], which can hand out either the concrete handler or
//! a boxed [`FemtoHandlerTrait`] ready for registration with a logger.

use std::io;

use thiserror::Error;

use crate::handler::FemtoHandlerTrait;

mod builder_macros;
mod common;
pub mod mail_builder;
pub mod summarising_builder;

pub use common::TlsMode;
pub use mail_builder::MailHandlerBuilder;
pub use summarising_builder::SummarisingHandlerBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst reading configuration.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    Ini(String),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    /// Concrete handler produced by the builder.
    type Handler: FemtoHandlerTrait + 'static;

    /// Validate the configuration and build the concrete handler.
    fn build_inner(&self) -> Result<Self::Handler, ConfigurationError>;

    /// Build the handler as a trait object.
    fn build(&self) -> Result<Box<dyn FemtoHandlerTrait>, ConfigurationError> {
        Ok(Box::new(self.build_inner()?))
    }
}
