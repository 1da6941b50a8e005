use super::ShellResolverStrategy;
use fxhash::FxHashMap;
use mhost_domain::ShellId;
use mhost_domain::config::RoutingConfig;
use mhost_domain::constants::{
    ROUTING_CLAIM_VALUE, ROUTING_HEADER_VALUE, ROUTING_HOST, ROUTING_PATH,
};
use mhost_domain::resolution::{ResolutionContext, RoutingSources};
use mhost_domain::shell::ShellSettings;
use std::collections::hash_map::Entry;

/// Lowercased key → shell. The first shell to claim a key keeps it.
#[derive(Debug, Clone, Default)]
struct RouteTable {
    routes: FxHashMap<String, ShellId>,
}

impl RouteTable {
    fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, ShellId)>,
        K: AsRef<str>,
    {
        let mut table = Self::default();
        for (key, shell) in pairs {
            table.insert(key.as_ref(), shell);
        }
        table
    }

    /// Returns the shell already holding `key`, if any.
    fn insert(&mut self, key: &str, shell: ShellId) -> Option<&ShellId> {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        match self.routes.entry(key) {
            Entry::Occupied(entry) => Some(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                entry.insert(shell);
                None
            },
        }
    }

    fn get(&self, key: &str) -> Option<ShellId> {
        self.routes.get(&key.trim().to_lowercase()).cloned()
    }

    fn len(&self) -> usize {
        self.routes.len()
    }
}

/// `tenant.example.com:8080` → `tenant.example.com`; `[::1]:80` → `[::1]`.
fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}

/// First non-empty path segment, ignoring any query string.
fn first_segment(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').map(str::trim).find(|segment| !segment.is_empty())
}

/// Exact, case-insensitive match of the request host (without port).
#[derive(Debug, Clone)]
pub struct HostStrategy {
    hosts: RouteTable,
}

impl HostStrategy {
    #[must_use]
    pub fn new<I, K>(hosts: I) -> Self
    where
        I: IntoIterator<Item = (K, ShellId)>,
        K: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|(host, shell)| (strip_port(host.as_ref()).to_owned(), shell));
        Self { hosts: RouteTable::from_pairs(hosts) }
    }
}

impl ShellResolverStrategy for HostStrategy {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.hosts.get(strip_port(context.host()?))
    }

    fn name(&self) -> &str {
        "host"
    }
}

/// Case-insensitive match of the first path segment. `/` and empty paths never match.
#[derive(Debug, Clone)]
pub struct PathStrategy {
    segments: RouteTable,
}

impl PathStrategy {
    #[must_use]
    pub fn new<I, K>(segments: I) -> Self
    where
        I: IntoIterator<Item = (K, ShellId)>,
        K: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|(segment, shell)| (segment.as_ref().trim_matches('/').to_owned(), shell));
        Self { segments: RouteTable::from_pairs(segments) }
    }
}

impl ShellResolverStrategy for PathStrategy {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.segments.get(first_segment(context.path()?)?)
    }

    fn name(&self) -> &str {
        "path"
    }
}

/// Always answers with the same shell. Usually ranked last as the fallback.
#[derive(Debug, Clone)]
pub struct FixedStrategy {
    shell: ShellId,
}

impl FixedStrategy {
    #[must_use]
    pub const fn new(shell: ShellId) -> Self {
        Self { shell }
    }
}

impl ShellResolverStrategy for FixedStrategy {
    fn resolve(&self, _context: &ResolutionContext) -> Option<ShellId> {
        Some(self.shell.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Host, path, header and claim lookups, each enabled by a [`RoutingSources`] flag and
/// tried in that order.
#[derive(Debug, Clone)]
pub struct WebRoutingStrategy {
    sources: RoutingSources,
    header_name: String,
    claim_key: String,
    hosts: RouteTable,
    paths: RouteTable,
    header_values: RouteTable,
    claim_values: RouteTable,
}

impl WebRoutingStrategy {
    /// An empty strategy; tables are filled with the `route_*` methods.
    #[must_use]
    pub fn new(routing: &RoutingConfig) -> Self {
        Self {
            sources: routing.sources,
            header_name: routing.header_name.clone(),
            claim_key: routing.claim_key.clone(),
            hosts: RouteTable::default(),
            paths: RouteTable::default(),
            header_values: RouteTable::default(),
            claim_values: RouteTable::default(),
        }
    }

    /// Builds the tables from each shell's `WebRouting:Host`, `WebRouting:Path`,
    /// `WebRouting:HeaderValue` and `WebRouting:ClaimValue` properties (a string or a list
    /// of strings). When two shells declare the same value the first one keeps it.
    pub fn from_settings<I>(shells: I, routing: &RoutingConfig) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<ShellSettings>,
    {
        let mut strategy = Self::new(routing);
        for settings in shells {
            let settings = settings.as_ref();
            let shell = settings.id();
            for host in settings.property_strings(ROUTING_HOST) {
                strategy.route_host(host, shell.clone());
            }
            for path in settings.property_strings(ROUTING_PATH) {
                strategy.route_path(path, shell.clone());
            }
            for value in settings.property_strings(ROUTING_HEADER_VALUE) {
                strategy.route_header_value(value, shell.clone());
            }
            for value in settings.property_strings(ROUTING_CLAIM_VALUE) {
                strategy.route_claim_value(value, shell.clone());
            }
        }
        tracing::debug!(
            hosts = strategy.hosts.len(),
            paths = strategy.paths.len(),
            header_values = strategy.header_values.len(),
            claim_values = strategy.claim_values.len(),
            "Web routing tables built"
        );
        strategy
    }

    /// Any port on `host` is dropped, as it is on the request side.
    pub fn route_host(&mut self, host: &str, shell: ShellId) -> &mut Self {
        route(&mut self.hosts, "host", strip_port(host), shell);
        self
    }

    pub fn route_path(&mut self, segment: &str, shell: ShellId) -> &mut Self {
        route(&mut self.paths, "path", segment.trim_matches('/'), shell);
        self
    }

    pub fn route_header_value(&mut self, value: &str, shell: ShellId) -> &mut Self {
        route(&mut self.header_values, "header", value, shell);
        self
    }

    pub fn route_claim_value(&mut self, value: &str, shell: ShellId) -> &mut Self {
        route(&mut self.claim_values, "claim", value, shell);
        self
    }

    #[must_use]
    pub const fn sources(&self) -> RoutingSources {
        self.sources
    }

    fn by_host(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.hosts.get(strip_port(context.host()?))
    }

    fn by_path(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.paths.get(first_segment(context.path()?)?)
    }

    fn by_header(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.header_values.get(context.header(&self.header_name)?)
    }

    fn by_claim(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.claim_values.get(context.claim(&self.claim_key)?)
    }
}

fn route(table: &mut RouteTable, source: &str, key: &str, shell: ShellId) {
    let requested = shell.clone();
    if let Some(existing) = table.insert(key, shell) {
        tracing::warn!(
            source,
            value = key,
            kept = %existing,
            ignored = %requested,
            "Duplicate web routing value ignored"
        );
    }
}

impl ShellResolverStrategy for WebRoutingStrategy {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        let lookups: [(RoutingSources, fn(&Self, &ResolutionContext) -> Option<ShellId>); 4] = [
            (RoutingSources::HOST, Self::by_host),
            (RoutingSources::PATH, Self::by_path),
            (RoutingSources::HEADER, Self::by_header),
            (RoutingSources::CLAIM, Self::by_claim),
        ];
        lookups
            .into_iter()
            .filter(|(flag, _)| self.sources.contains(*flag))
            .find_map(|(_, lookup)| lookup(self, context))
    }

    fn name(&self) -> &str {
        "web-routing"
    }
}
