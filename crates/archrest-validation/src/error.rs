//! Schema construction errors.

/// Errors raised while building a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A pattern rule could not be compiled.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compiler error.
        #[source]
        source: regex::Error,
    },
}
