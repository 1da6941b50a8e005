use std::borrow::Cow;

/// Errors raised while constructing domain values.
#[mhost_derive::mhost_error]
pub enum DomainError {
    /// An identifier was empty or whitespace-only.
    #[error("Invalid identifier{}: {message}", format_context(.context))]
    InvalidIdentifier { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A routing source name outside `host`, `path`, `header`, `claim`, `all`.
    #[error("Unknown routing source '{name}'{}", format_context(.context))]
    UnknownRoutingSource { name: String, context: Option<Cow<'static, str>> },
}
