#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros shared by the `FactGate` workspace.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! factgate-derive.workspace = true
//! thiserror.workspace = true
//! ```

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into a workspace error type.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait adding `.context(...)` to
///   `Result<T, Name>` and to `Result<T, Source>` for every variant wrapping a `source`.
/// * **Conversions**: `From<Source>` for variants with a `source` field, so `?` works on
///   upstream errors. `From<&'static str>` / `From<String>` when an `Internal` variant with a
///   `message` field exists.
/// * **Formatting helper**: a private `format_context` function usable from `#[error(...)]`
///   strings: `#[error("Cache error{}: {message}", format_context(.context))]`.
///
/// # Requirements
///
/// 1. Only enums with named-field variants are accepted.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. A variant with a `source` field must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[factgate_derive::factgate_error]
/// pub enum CacheError {
///     #[error("Invalid cache settings{}: {message}", format_context(.context))]
///     InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Internal cache error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn factgate_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
