//! Error taxonomy for the conversion pipeline.

use crate::source::Span;

/// Error raised while converting one node or one declaring unit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// A construct has no valid or implemented translation.
    #[error("{message}")]
    NodeConversion { span: Span, message: String },

    #[error("unsupported syntax '{kind}'")]
    Unsupported { kind: String, span: Span },

    /// A temporary was read outside the scope that registered it.
    #[error("temporary '{id}' is not registered in the active scope")]
    ScopeViolation { id: String },

    /// A hoisted initializer would shadow or be shadowed by existing target code.
    #[error(
        "initializer for '{owner}.{member}' collides with an existing name in {routine} \
         (initializer at {}, existing at {})",
        fmt_span(.init_span), fmt_span(.existing_span)
    )]
    InitializerCollision {
        owner: String,
        member: String,
        routine: String,
        init_span: Option<Span>,
        existing_span: Option<Span>,
    },

    #[error("no unique candidate for call to '{callee}'")]
    UnresolvedRepairSymbol { callee: String },
}

fn fmt_span(span: &Option<Span>) -> String {
    span.map(|s| s.to_string())
        .unwrap_or_else(|| "<generated>".to_string())
}

impl ConvertError {
    pub fn node(span: Span, message: impl Into<String>) -> Self {
        Self::NodeConversion {
            span,
            message: message.into(),
        }
    }

    /// Unit-fatal errors abort the enclosing declaring unit instead of
    /// being downgraded to a placeholder.
    pub fn is_unit_fatal(&self) -> bool {
        matches!(
            self,
            Self::ScopeViolation { .. } | Self::InitializerCollision { .. }
        )
    }
}

/// Error that can occur when a parser service reads source text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Parse(String),
}

/// Error loading [`crate::config::ConvertOptions`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Error for one file of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("conversion cancelled")]
    Cancelled,
}
