use std::borrow::Cow;

/// A specialized [`CacheError`] enum of this crate.
#[factgate_derive::factgate_error]
pub enum CacheError {
    #[error("Invalid cache settings{}: {message}", format_context(.context))]
    InvalidSettings { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The compute, including the wait for a permit, outlived its deadline.
    #[error("Compute timed out{}: {message}", format_context(.context))]
    Timeout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Cache is shut down{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
