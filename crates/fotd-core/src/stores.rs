use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LocationKey, ProviderConfig, ProviderId};

pub const DEFAULT_STORE_NAME: &str = "Flavor of the Day";

/// Poll interval in whole minutes, always within `5..=1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpdateInterval(u64);

impl UpdateInterval {
    pub const MIN_MINUTES: u64 = 5;
    pub const MAX_MINUTES: u64 = 1440;
    pub const DEFAULT_MINUTES: u64 = 30;

    /// # Errors
    ///
    /// Returns a human readable reason when `minutes` is out of range.
    pub fn from_minutes(minutes: u64) -> Result<Self, String> {
        if (Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(format!(
                "update interval {minutes} minutes is outside {}..={}",
                Self::MIN_MINUTES,
                Self::MAX_MINUTES
            ))
        }
    }

    #[must_use]
    pub fn minutes(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0 * 60)
    }
}

impl Default for UpdateInterval {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

/// One coordinator's worth of configuration, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub name: String,
    pub provider: ProviderId,
    pub location_id: String,
    pub update_interval: UpdateInterval,
    pub options: ProviderConfig,
}

impl StoreConfig {
    /// Identity used to reject duplicate entries and to label log lines.
    #[must_use]
    pub fn key(&self) -> LocationKey {
        LocationKey {
            provider: self.provider,
            store_id: self.location_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoresFile {
    pub stores: Vec<StoreConfig>,
}

#[derive(Debug, Deserialize)]
struct RawStoresFile {
    #[serde(default)]
    stores: Vec<RawStore>,
}

#[derive(Debug, Deserialize)]
struct RawStore {
    name: Option<String>,
    provider: String,
    location_id: String,
    update_interval_minutes: Option<u64>,
    #[serde(default)]
    options: ProviderConfig,
}

/// Load and validate the stores file.
///
/// Entries without `update_interval_minutes` get `default_interval`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(
    path: &Path,
    default_interval: UpdateInterval,
) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_stores(&content, default_interval)
}

/// Parse and validate stores YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors, unknown provider ids, empty
/// location ids, out-of-range intervals or duplicate `(provider, location_id)`.
pub fn parse_stores(
    content: &str,
    default_interval: UpdateInterval,
) -> Result<StoresFile, ConfigError> {
    let raw: RawStoresFile =
        serde_yaml::from_str(content).map_err(ConfigError::StoresFileParse)?;

    let stores = raw
        .stores
        .into_iter()
        .map(|entry| resolve_store(entry, default_interval))
        .collect::<Result<Vec<_>, _>>()?;

    let stores_file = StoresFile { stores };
    validate_stores(&stores_file)?;
    Ok(stores_file)
}

fn resolve_store(
    raw: RawStore,
    default_interval: UpdateInterval,
) -> Result<StoreConfig, ConfigError> {
    let provider: ProviderId = raw.provider.parse()?;

    let location_id = raw.location_id.trim().to_string();
    if location_id.is_empty() {
        return Err(ConfigError::Validation(format!(
            "store for provider '{provider}' has an empty location_id"
        )));
    }

    let update_interval = match raw.update_interval_minutes {
        Some(minutes) => UpdateInterval::from_minutes(minutes).map_err(|reason| {
            ConfigError::Validation(format!("store '{provider}/{location_id}': {reason}"))
        })?,
        None => default_interval,
    };

    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string());

    Ok(StoreConfig {
        name,
        provider,
        location_id,
        update_interval,
        options: raw.options,
    })
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for store in &stores_file.stores {
        if !seen.insert(store.key()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store: provider '{}' location '{}'",
                store.provider, store.location_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
stores:
  - name: Kitchen Board
    provider: culvers
    location_id: madison-wi-mineral-point-rd
    update_interval_minutes: 60
    options:
      min_request_interval_ms: 2000
  - provider: kopps
    location_id: kopps-glendale
";

    #[test]
    fn parses_entries_and_applies_defaults() {
        let file = parse_stores(SAMPLE, UpdateInterval::default()).unwrap();
        assert_eq!(file.stores.len(), 2);

        let culvers = &file.stores[0];
        assert_eq!(culvers.name, "Kitchen Board");
        assert_eq!(culvers.provider, ProviderId::Culvers);
        assert_eq!(culvers.update_interval.minutes(), 60);
        assert_eq!(
            culvers.options.get_u64("min_request_interval_ms").unwrap(),
            Some(2000)
        );

        let kopps = &file.stores[1];
        assert_eq!(kopps.name, DEFAULT_STORE_NAME);
        assert_eq!(kopps.update_interval.minutes(), 30);
        assert_eq!(kopps.options, ProviderConfig::default());
    }

    #[test]
    fn unknown_provider_fails_at_load() {
        let yaml = "stores:\n  - provider: dairyqueen\n    location_id: x\n";
        let err = parse_stores(yaml, UpdateInterval::default()).unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownProvider { ref id, .. } if id == "dairyqueen"),
            "expected UnknownProvider, got: {err:?}"
        );
    }

    #[test]
    fn empty_location_id_is_rejected() {
        let yaml = "stores:\n  - provider: oscars\n    location_id: '  '\n";
        let err = parse_stores(yaml, UpdateInterval::default()).unwrap_err();
        assert!(err.to_string().contains("empty location_id"));
    }

    #[test]
    fn interval_out_of_range_is_rejected() {
        let yaml = "stores:\n  - provider: oscars\n    location_id: oscars-franklin\n    update_interval_minutes: 2\n";
        let err = parse_stores(yaml, UpdateInterval::default()).unwrap_err();
        assert!(err.to_string().contains("outside 5..=1440"));
    }

    #[test]
    fn duplicate_composite_key_is_rejected() {
        let yaml = "stores:\n  - provider: kopps\n    location_id: kopps-glendale\n  - provider: kopps\n    location_id: kopps-glendale\n";
        let err = parse_stores(yaml, UpdateInterval::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate store"));
    }

    #[test]
    fn same_location_id_under_different_providers_is_allowed() {
        let yaml = "stores:\n  - provider: kopps\n    location_id: shared\n  - provider: oscars\n    location_id: shared\n";
        assert!(parse_stores(yaml, UpdateInterval::default()).is_ok());
    }

    #[test]
    fn store_key_pairs_provider_with_location() {
        let file = parse_stores(SAMPLE, UpdateInterval::default()).unwrap();
        let key = file.stores[1].key();
        assert_eq!(key.provider, ProviderId::Kopps);
        assert_eq!(key.to_string(), "kopps_kopps-glendale");
        assert_ne!(key, file.stores[0].key());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_stores(Path::new("/nonexistent/stores.yaml"), UpdateInterval::default())
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stores.yaml"));
    }

    #[test]
    fn interval_duration_is_in_minutes() {
        let interval = UpdateInterval::from_minutes(5).unwrap();
        assert_eq!(interval.as_duration(), Duration::from_secs(300));
    }
}
