use mhost_kernel::domain::config::RoutingConfig;
use mhost_kernel::domain::constants::{ROUTING_CLAIM_VALUE, ROUTING_HEADER_VALUE, ROUTING_HOST, ROUTING_PATH};
use mhost_kernel::prelude::*;
use mhost_kernel::resolution::{FixedStrategy, HostStrategy, PathStrategy, WebRoutingStrategy};
use serde_json::json;

fn id(name: &str) -> ShellId {
    ShellId::new(name).unwrap()
}

fn shells() -> ShellSettingsCache {
    ShellSettingsCache::from_settings([
        ShellSettings::new(id("Default")),
        ShellSettings::new(id("Acme"))
            .with_property(ROUTING_HOST, json!(["acme.example.com", "acme.local:8080"]))
            .with_property(ROUTING_PATH, "acme")
            .with_property(ROUTING_HEADER_VALUE, "acme-id")
            .with_property(ROUTING_CLAIM_VALUE, "acme-claim"),
        ShellSettings::new(id("Globex"))
            .with_property(ROUTING_HOST, "globex.example.com")
            .with_property(ROUTING_PATH, json!(["globex", "acme"])),
    ])
    .unwrap()
}

#[test]
fn always_none_then_fixed_yields_fixed() {
    let pipeline = ResolutionPipeline::builder()
        .add(0, |_: &ResolutionContext| -> Option<ShellId> { None })
        .add(1, FixedStrategy::new(id("X")))
        .build();
    assert_eq!(pipeline.resolve(&ResolutionContext::new()), Some(id("X")));
}

#[test]
fn standard_pipeline_routes_by_host_and_path() {
    let pipeline = ResolutionPipeline::standard(&shells(), &RoutingConfig::default()).unwrap();
    let names: Vec<_> = pipeline.strategy_names().collect();
    assert_eq!(names, ["web-routing", "fixed"]);

    let by_host = ResolutionContext::new().with_host("ACME.example.com:443");
    assert_eq!(pipeline.resolve(&by_host), Some(id("Acme")));

    let by_path = ResolutionContext::new().with_host("unknown.example.com").with_path("/globex/orders");
    assert_eq!(pipeline.resolve(&by_path), Some(id("Globex")));
}

#[test]
fn host_wins_over_path() {
    let pipeline = ResolutionPipeline::standard(&shells(), &RoutingConfig::default()).unwrap();
    let context = ResolutionContext::new().with_host("globex.example.com").with_path("/acme");
    assert_eq!(pipeline.resolve(&context), Some(id("Globex")));
}

#[test]
fn first_declared_shell_keeps_a_duplicate_value() {
    let pipeline = ResolutionPipeline::standard(&shells(), &RoutingConfig::default()).unwrap();
    let context = ResolutionContext::new().with_path("/acme");
    assert_eq!(pipeline.resolve(&context), Some(id("Acme")));
}

#[test]
fn unmatched_requests_fall_back_to_default() {
    let pipeline = ResolutionPipeline::standard(&shells(), &RoutingConfig::default()).unwrap();
    let context = ResolutionContext::new().with_host("nobody.example.com").with_path("/");
    assert_eq!(pipeline.resolve(&context), Some(id("Default")));
}

#[test]
fn header_and_claim_sources_are_opt_in() {
    let request = ResolutionContext::new()
        .with_header("X-Tenant-Id", "acme-id")
        .with_claim("tenant_id", "acme-claim");

    let default = ResolutionPipeline::standard(&shells(), &RoutingConfig::default()).unwrap();
    assert_eq!(default.resolve(&request), Some(id("Default")));

    let headers = RoutingConfig {
        sources: RoutingSources::HEADER,
        fallback: None,
        ..RoutingConfig::default()
    };
    let pipeline = ResolutionPipeline::standard(&shells(), &headers).unwrap();
    assert_eq!(pipeline.resolve(&request), Some(id("Acme")));

    let claims = RoutingConfig {
        sources: RoutingSources::CLAIM,
        claim_key: "org".to_owned(),
        fallback: None,
        ..RoutingConfig::default()
    };
    let pipeline = ResolutionPipeline::standard(&shells(), &claims).unwrap();
    assert_eq!(pipeline.resolve(&request), None);
    assert_eq!(
        pipeline.resolve(&ResolutionContext::new().with_claim("ORG", "acme-claim")),
        Some(id("Acme"))
    );
}

#[test]
fn custom_strategies_slot_in_by_rank() {
    let pipeline = ResolutionPipeline::builder()
        .add(ResolutionPipeline::FALLBACK_RANK, FixedStrategy::new(id("Default")))
        .add(10, PathStrategy::new([("tenants", id("Directory"))]))
        .add(-10, HostStrategy::new([("admin.example.com", id("Admin"))]))
        .add(ResolutionPipeline::WEB_ROUTING_RANK, WebRoutingStrategy::from_settings(shells().iter(), &RoutingConfig::default()))
        .build();

    let names: Vec<_> = pipeline.strategy_names().collect();
    assert_eq!(names, ["host", "web-routing", "path", "fixed"]);

    let context = ResolutionContext::new().with_host("admin.example.com").with_path("/acme");
    assert_eq!(pipeline.resolve(&context), Some(id("Admin")));
}

#[test]
fn empty_fallback_name_is_rejected() {
    let routing = RoutingConfig { fallback: Some("  ".to_owned()), ..RoutingConfig::default() };
    let err = ResolutionPipeline::standard(&shells(), &routing).unwrap_err();
    assert!(matches!(err, HostError::Domain { .. }));
}
