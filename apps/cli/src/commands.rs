//! Subcommand handlers.

use crate::AppConfig;
use crate::args::ResolveArgs;
use crate::features::AppInfo;
use anyhow::{Context, Result};
use mhost::ShellRuntime;
use mhost::kernel::prelude::{
    DependencyResolver, FeatureId, InventoryDiscovery, ResolutionContext, ServiceCollection,
};
use std::io::Write;

/// Root registrations shared by every shell.
#[must_use]
pub fn root_services() -> ServiceCollection {
    let mut root = ServiceCollection::new();
    root.add_instance(AppInfo { name: env!("CARGO_PKG_NAME"), version: env!("CARGO_PKG_VERSION") });
    root
}

/// Host and pipeline over the configured shells and the statically registered features.
///
/// # Errors
/// Fails on invalid shell declarations or duplicate ids.
pub fn runtime(config: &AppConfig) -> Result<ShellRuntime> {
    ShellRuntime::from_config(&config.host, &InventoryDiscovery, root_services())
        .context("Failed to assemble the shell host")
}

/// `mhost shells`
///
/// # Errors
/// Fails if any shell cannot be built.
pub fn shells(runtime: &ShellRuntime, out: &mut impl Write) -> Result<()> {
    for shell in runtime.host().all_shells()? {
        writeln!(
            out,
            "{:<16} {:<32} {} services",
            shell.id(),
            join(shell.feature_order()),
            shell.services().len()
        )?;
    }
    Ok(())
}

/// `mhost features`
///
/// # Errors
/// Fails on a missing dependency or a dependency cycle.
pub fn features(runtime: &ShellRuntime, out: &mut impl Write) -> Result<()> {
    let registry = runtime.host().registry();
    for id in DependencyResolver::ordered_all(registry)? {
        let Some(descriptor) = registry.get(&id) else { continue };
        let description = descriptor.metadata().get("description").map_or("", String::as_str);
        if descriptor.dependencies().is_empty() {
            writeln!(out, "{id:<16} {description}")?;
        } else {
            writeln!(out, "{id:<16} {description} (after {})", join(descriptor.dependencies()))?;
        }
    }
    Ok(())
}

/// `mhost resolve`
///
/// # Errors
/// Fails if the selected shell cannot be built.
pub fn resolve(runtime: &ShellRuntime, args: &ResolveArgs, out: &mut impl Write) -> Result<()> {
    let shell = runtime.resolve_shell(&request_context(args))?;
    writeln!(out, "{} {}", shell.id(), join(shell.feature_order()))?;
    Ok(())
}

fn request_context(args: &ResolveArgs) -> ResolutionContext {
    let mut request = ResolutionContext::new();
    if let Some(host) = &args.host {
        request = request.with_host(host);
    }
    if let Some(path) = &args.path {
        request = request.with_path(path);
    }
    for (name, value) in &args.headers {
        request = request.with_header(name, value);
    }
    for (name, value) in &args.claims {
        request = request.with_claim(name, value);
    }
    request
}

fn join(ids: &[FeatureId]) -> String {
    if ids.is_empty() {
        return "-".to_owned();
    }
    ids.iter().map(FeatureId::as_str).collect::<Vec<_>>().join(" -> ")
}
