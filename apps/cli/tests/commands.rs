use mhost::kernel::config::load_config;
use mhost::kernel::prelude::*;
use mhost_cli::AppConfig;
use mhost_cli::args::ResolveArgs;
use mhost_cli::commands;
use mhost_cli::features::{Greeter, Invoicing};
use std::io::Write;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[log]
level = "warn"
console = false

[routing]
sources = ["host", "path", "header"]
header_name = "X-Tenant-Id"

[[shells]]
name = "Default"
features = ["Core"]

[[shells]]
name = "Acme"
features = ["Billing"]

[shells.properties.WebRouting]
Host = "acme.example.com"
Path = "acme"

[shells.configuration.Billing]
Currency = "eur"
"#;

fn app_config(body: &str) -> AppConfig {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp file");
    file.write_all(body.as_bytes()).expect("write config");
    load(&file)
}

fn load(file: &NamedTempFile) -> AppConfig {
    load_config(Some(file.path())).expect("config loads")
}

fn run(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
    let mut out = Vec::new();
    f(&mut out).expect("command succeeds");
    String::from_utf8(out).expect("utf-8 output")
}

#[test]
fn shells_lists_dependencies_before_dependents() {
    let config = app_config(CONFIG);
    let runtime = commands::runtime(&config).expect("runtime");

    let output = run(|out| commands::shells(&runtime, out));
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Default"));
    assert!(lines[0].contains("Core"));
    assert!(lines[1].starts_with("Acme"));
    assert!(lines[1].contains("Core -> Billing"));
}

#[test]
fn features_prints_global_order_with_descriptions() {
    let config = app_config(CONFIG);
    let runtime = commands::runtime(&config).expect("runtime");

    let output = run(|out| commands::features(&runtime, out));
    let core = output.find("Core").expect("Core listed");
    let billing = output.find("Billing").expect("Billing listed");

    assert!(core < billing);
    assert!(output.contains("(after Core)"));
    assert!(output.contains("Shell identity and greeting"));
}

#[test]
fn resolve_routes_by_host_and_falls_back_to_the_default_shell() {
    let config = app_config(CONFIG);
    let runtime = commands::runtime(&config).expect("runtime");

    let routed = ResolveArgs {
        host: Some("ACME.example.com:8443".to_owned()),
        path: None,
        headers: Vec::new(),
        claims: Vec::new(),
    };
    let output = run(|out| commands::resolve(&runtime, &routed, out));
    assert_eq!(output.trim_end(), "Acme Core -> Billing");

    let unknown = ResolveArgs {
        host: Some("unknown.example.com".to_owned()),
        path: Some("/nobody/home".to_owned()),
        headers: Vec::new(),
        claims: Vec::new(),
    };
    let output = run(|out| commands::resolve(&runtime, &unknown, out));
    assert_eq!(output.trim_end(), "Default Core");
}

#[test]
fn billing_reads_shell_configuration_and_core_services() {
    let config = app_config(CONFIG);
    let runtime = commands::runtime(&config).expect("runtime");

    let acme = runtime.host().get_shell(&ShellId::new("acme").expect("id")).expect("shell builds");
    let invoicing = acme.require::<Invoicing>().expect("invoicing registered");
    let greeter = acme.require::<Greeter>().expect("greeter registered");

    assert_eq!(invoicing.currency, "EUR");
    assert_eq!(invoicing.issuer, greeter.message);
    assert!(greeter.message.ends_with("serving Acme"));
}

#[test]
fn invalid_currency_fails_the_shell_build() {
    let config = app_config(&CONFIG.replace("Currency = \"eur\"", "Currency = \"euro\""));
    let runtime = commands::runtime(&config).expect("runtime");

    let err = runtime.host().get_shell(&ShellId::new("Acme").expect("id")).unwrap_err();
    assert!(matches!(err, HostError::FeatureInitialization { .. }), "{err}");
    assert!(err.to_string().contains("ISO 4217"));
}
