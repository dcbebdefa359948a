//! Static mapping from [`ProviderId`] to provider constructors.
//!
//! Identifiers are parsed (and rejected) when the stores file loads, so
//! every lookup here is infallible.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;

use fotd_core::{ProviderConfig, ProviderId};

use crate::provider::{Capabilities, FlavorProvider};
use crate::providers::{
    CulversProvider, GoodberrysProvider, KoppsProvider, LeducsProvider, OscarsProvider,
};

/// Builds the provider for `id`, borrowing the shared `client`.
///
/// Options are not validated here; a bad option fails the first network
/// call with [`fotd_core::FlavorError::Config`].
#[must_use]
pub fn create_provider(
    id: ProviderId,
    client: Client,
    config: ProviderConfig,
) -> Arc<dyn FlavorProvider> {
    match id {
        ProviderId::Culvers => Arc::new(CulversProvider::new(client, config)),
        ProviderId::Kopps => Arc::new(KoppsProvider::new(client, config)),
        ProviderId::Oscars => Arc::new(OscarsProvider::new(client, config)),
        ProviderId::Goodberrys => Arc::new(GoodberrysProvider::new(client, config)),
        ProviderId::Leducs => Arc::new(LeducsProvider::new(client, config)),
    }
}

/// Capabilities of `id` without constructing a provider.
#[must_use]
pub fn capabilities(id: ProviderId) -> Capabilities {
    match id {
        ProviderId::Culvers => CulversProvider::CAPABILITIES,
        ProviderId::Kopps => KoppsProvider::CAPABILITIES,
        ProviderId::Oscars => OscarsProvider::CAPABILITIES,
        ProviderId::Goodberrys => GoodberrysProvider::CAPABILITIES,
        ProviderId::Leducs => LeducsProvider::CAPABILITIES,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub name: &'static str,
    pub capabilities: Capabilities,
}

/// One descriptor per registered provider, in [`ProviderId::ALL`] order.
#[must_use]
pub fn descriptors() -> Vec<ProviderDescriptor> {
    ProviderId::ALL
        .into_iter()
        .map(|id| ProviderDescriptor {
            id,
            name: id.display_name(),
            capabilities: capabilities(id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_builds_a_provider_reporting_that_id() {
        let client = Client::new();
        for id in ProviderId::ALL {
            let provider = create_provider(id, client.clone(), ProviderConfig::new());
            assert_eq!(provider.id(), id);
            assert_eq!(provider.provider_id(), id.as_str());
            assert_eq!(provider.capabilities(), capabilities(id));
        }
    }

    #[test]
    fn provider_ids_are_lowercase_without_whitespace() {
        for id in ProviderId::ALL {
            let key = id.as_str();
            assert_eq!(key, key.to_lowercase());
            assert!(!key.chars().any(char::is_whitespace), "{key}");
        }
    }

    #[test]
    fn only_culvers_lacks_a_fixed_catalog() {
        let dynamic: Vec<_> = descriptors()
            .into_iter()
            .filter(|d| !d.capabilities.fixed_catalog)
            .map(|d| d.id)
            .collect();
        assert_eq!(dynamic, vec![ProviderId::Culvers]);
    }

    #[test]
    fn descriptors_serialize_with_lowercase_id() {
        let json = serde_json::to_value(&descriptors()[0]).unwrap();
        assert_eq!(json["id"], "culvers");
        assert_eq!(json["name"], "Culver's");
        assert_eq!(json["capabilities"]["upcoming_flavors"], false);
    }
}
