//! Demo features, registered at link time with `#[shell_feature]`.

use mhost::kernel::prelude::*;
use mhost::shell_feature;
use std::sync::Arc;

/// Root service describing the running binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Per-shell greeting built by [`CoreFeature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeter {
    pub message: String,
}

/// Per-shell invoicing settings built by [`BillingFeature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoicing {
    pub currency: String,
    pub issuer: String,
}

#[shell_feature(id = "Core", description = "Shell identity and greeting")]
#[derive(Debug)]
pub struct CoreFeature {
    greeting: String,
}

impl ShellFeature for CoreFeature {
    fn configure_services(&self, services: &mut ServiceCollection) -> Result<(), BoxError> {
        services.add_instance(Greeter { message: self.greeting.clone() });
        Ok(())
    }
}

impl ActivateFeature for CoreFeature {
    fn activate(activation: &FeatureActivation<'_>) -> Result<Self, BoxError> {
        let app = activation.root().require::<AppInfo>()?;
        let greeting = format!("{} {} serving {}", app.name, app.version, activation.shell_id());
        Ok(Self { greeting })
    }
}

#[shell_feature(id = "Billing", depends_on = ["Core"], description = "Invoicing in the shell's currency")]
#[derive(Debug)]
pub struct BillingFeature {
    currency: Arc<str>,
}

impl BillingFeature {
    const DEFAULT_CURRENCY: &'static str = "USD";
}

impl ShellFeature for BillingFeature {
    fn configure_services(&self, services: &mut ServiceCollection) -> Result<(), BoxError> {
        let currency = Arc::clone(&self.currency);
        services.add_factory(move |provider| Invoicing {
            currency: currency.to_string(),
            issuer: provider.get::<Greeter>().map(|g| g.message.clone()).unwrap_or_default(),
        });
        Ok(())
    }
}

impl ActivateFeature for BillingFeature {
    fn activate(activation: &FeatureActivation<'_>) -> Result<Self, BoxError> {
        let configuration = activation.configuration().section("Billing");
        let currency = configuration.get("Currency").unwrap_or(Self::DEFAULT_CURRENCY);
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("'{currency}' is not an ISO 4217 currency code").into());
        }
        Ok(Self { currency: Arc::from(currency.to_ascii_uppercase()) })
    }
}
