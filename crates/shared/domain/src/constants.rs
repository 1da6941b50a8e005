//! Well-known names shared by configuration, routing and the host.

/// Name of the shell preferred by default-shell lookups and fallback routing.
pub const DEFAULT_SHELL: &str = "Default";

/// Separator used for nested configuration keys (`Billing:Currency`).
pub const KEY_SEPARATOR: char = ':';

/// Shell property holding the host name(s) routed to the shell.
pub const ROUTING_HOST: &str = "WebRouting:Host";
/// Shell property holding the first path segment routed to the shell.
pub const ROUTING_PATH: &str = "WebRouting:Path";
/// Shell property holding the header value routed to the shell.
pub const ROUTING_HEADER_VALUE: &str = "WebRouting:HeaderValue";
/// Shell property holding the claim value routed to the shell.
pub const ROUTING_CLAIM_VALUE: &str = "WebRouting:ClaimValue";

pub const DEFAULT_TENANT_HEADER: &str = "X-Tenant-Id";
pub const DEFAULT_TENANT_CLAIM: &str = "tenant_id";
