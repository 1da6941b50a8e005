#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the shell host.
//! This crate removes the boilerplate around two recurring patterns: domain error enums
//! and statically registered shell features.
//!
//! ## Usage
//! Add the crate to any workspace member that declares errors or features:
//! ```toml
//! [dependencies]
//! mhost-derive.workspace = true
//! ```
//!
//! The examples below are `ignore`d because a proc-macro crate cannot depend on the
//! runtime crates its expansions refer to.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` carrying this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants whose only fields are
///   `source: T` and `context`, enabling the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` if an
///   `Internal { message, context }` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Every variant must use named fields (tuple and unit variants are rejected).
/// 3. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 4. Variants wrapping an upstream error must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[mhost_derive::mhost_error]
/// pub enum LoaderError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<String, LoaderError> {
///     std::fs::read_to_string("shells.toml").context("Reading shell settings")
/// }
/// ```
#[proc_macro_attribute]
pub fn mhost_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro that turns a struct into a statically discovered shell feature.
///
/// The struct must implement `mhost_kernel::feature::ActivateFeature` (which implies
/// `ShellFeature`). The macro:
/// 1. Implements `FeatureMetadata` with the declared id, dependencies and description.
/// 2. Submits a `FeatureRegistration` to the link-time inventory so that
///    `InventoryDiscovery` picks the feature up without any manual wiring.
///
/// # Arguments
///
/// * `id = "Billing"` - Required feature id (case-insensitive at runtime).
/// * `depends_on = ["Core", ...]` - Optional list of feature ids that must initialize first.
/// * `description = "..."` - Optional human-readable description stored as metadata.
///
/// # Example
/// ```rust,ignore
/// #[mhost_derive::shell_feature(id = "Billing", depends_on = ["Core"])]
/// #[derive(Debug)]
/// pub struct BillingFeature {
///     currency: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn shell_feature(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::feature::expand_feature(args.into(), input).into()
}
