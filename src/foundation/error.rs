/// Convenience result type used across blurest.
pub type BlurestResult<T> = Result<T, BlurestError>;

/// Top-level error taxonomy used by decoding, CSS generation and the loading element.
#[derive(thiserror::Error, Debug)]
pub enum BlurestError {
    /// Malformed placeholder string or out-of-range caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A symbol outside the base83 alphabet, or a value that does not fit.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A decode or validation failure observed while generating CSS.
    #[error("generation error: {context}: {source}")]
    Generation {
        /// What the generator was doing when it failed.
        context: String,
        /// The underlying failure.
        #[source]
        source: Box<BlurestError>,
    },

    /// The real image could not be fetched.
    #[error("load error: {0}")]
    Load(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures of the base83 codec.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// `symbol` at char index `position` is not part of the alphabet.
    #[error("invalid base83 symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        /// The offending character.
        symbol: char,
        /// Char index within the decoded input.
        position: usize,
    },

    /// The decoded value exceeds `u64::MAX`.
    #[error("base83 value overflows 64 bits")]
    Overflow,
}

impl BlurestError {
    /// Build a [`BlurestError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap `source` into a [`BlurestError::Generation`] value.
    pub fn generation(context: impl Into<String>, source: BlurestError) -> Self {
        Self::Generation {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Build a [`BlurestError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`BlurestError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Innermost non-generation error, following [`BlurestError::Generation`] wrappers.
    pub fn root_cause(&self) -> &BlurestError {
        match self {
            Self::Generation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
