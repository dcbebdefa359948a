//! One-shot provider commands: providers, search, location, flavor,
//! upcoming and check.

use std::sync::Arc;

use anyhow::Context;

use fotd_core::{AppConfig, LocationInfo, ProviderConfig, ProviderId};
use fotd_providers::{build_shared_client, create_provider, descriptors, FlavorProvider};

/// Shortest free-text search the Culver's locator accepts usefully.
const MIN_SEARCH_TERM_LEN: usize = 2;

pub(crate) fn list_providers() {
    let header = format!("{:<12}{:<30}{:<10}FIXED CATALOG", "ID", "NAME", "UPCOMING");
    println!("{header}");
    for d in descriptors() {
        println!(
            "{:<12}{:<30}{:<10}{}",
            d.id.as_str(),
            d.name,
            yes_no(d.capabilities.upcoming_flavors),
            yes_no(d.capabilities.fixed_catalog)
        );
    }
}

pub(crate) async fn search(
    config: &AppConfig,
    provider_id: ProviderId,
    term: &str,
    state: Option<&str>,
    options: &[String],
) -> anyhow::Result<()> {
    let provider = build_provider(config, provider_id, options)?;
    check_search_term(term, provider.capabilities().fixed_catalog)?;

    let locations = provider.search_locations(term.trim(), state).await?;
    if locations.is_empty() {
        println!("no {} stores match \"{term}\"", provider.provider_name());
        return Ok(());
    }
    for location in &locations {
        println!("{:<40}{}", location.store_id, location.display_name());
    }
    Ok(())
}

pub(crate) async fn location(
    config: &AppConfig,
    provider_id: ProviderId,
    location_id: &str,
    options: &[String],
) -> anyhow::Result<()> {
    let provider = build_provider(config, provider_id, options)?;
    let location = provider.get_location_by_id(location_id).await?;
    print_location(&location);
    Ok(())
}

pub(crate) async fn flavor(
    config: &AppConfig,
    provider_id: ProviderId,
    location_id: &str,
    options: &[String],
) -> anyhow::Result<()> {
    let provider = build_provider(config, provider_id, options)?;
    let flavor = provider.get_current_flavor(location_id).await?;
    println!("{}", serde_json::to_string_pretty(&flavor)?);
    Ok(())
}

pub(crate) async fn upcoming(
    config: &AppConfig,
    provider_id: ProviderId,
    location_id: &str,
    days: usize,
    options: &[String],
) -> anyhow::Result<()> {
    let provider = build_provider(config, provider_id, options)?;
    if !provider.capabilities().upcoming_flavors {
        anyhow::bail!("{} does not publish upcoming flavors", provider.provider_name());
    }

    let entries = provider.get_upcoming_flavors(location_id, days).await?;
    if entries.is_empty() {
        println!("no upcoming flavors published");
    }
    for (date, flavor) in &entries {
        println!("{}  {}", date.format("%a %b %-d"), flavor.name());
    }
    Ok(())
}

pub(crate) async fn check(
    config: &AppConfig,
    provider_id: ProviderId,
    location_id: &str,
    options: &[String],
) -> anyhow::Result<()> {
    let provider = build_provider(config, provider_id, options)?;
    if provider.test_connection(location_id).await {
        println!("ok: {} {location_id}", provider.provider_name());
        Ok(())
    } else {
        anyhow::bail!(
            "could not fetch a flavor for {location_id} from {}",
            provider.provider_name()
        )
    }
}

fn build_provider(
    config: &AppConfig,
    provider_id: ProviderId,
    options: &[String],
) -> anyhow::Result<Arc<dyn FlavorProvider>> {
    let client = build_shared_client(
        &config.user_agent,
        config.http_timeout_secs,
        config.http_connect_timeout_secs,
    )
    .context("failed to build HTTP client")?;
    Ok(create_provider(provider_id, client, parse_options(options)?))
}

/// Parses repeated `KEY=VALUE` flags. Values stay strings; numeric options
/// accept numeric strings.
pub(crate) fn parse_options(raw: &[String]) -> anyhow::Result<ProviderConfig> {
    raw.iter()
        .map(|entry| -> anyhow::Result<(String, serde_json::Value)> {
            let (key, value) = entry
                .split_once('=')
                .with_context(|| format!("option \"{entry}\" is not KEY=VALUE"))?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("option \"{entry}\" has an empty key");
            }
            Ok((key.to_string(), serde_json::Value::from(value.trim())))
        })
        .collect()
}

pub(crate) fn check_search_term(term: &str, fixed_catalog: bool) -> anyhow::Result<()> {
    if !fixed_catalog && term.trim().chars().count() < MIN_SEARCH_TERM_LEN {
        anyhow::bail!("search term must be at least {MIN_SEARCH_TERM_LEN} characters");
    }
    Ok(())
}

fn print_location(location: &LocationInfo) {
    println!("{}", location.display_name());
    println!("  id:      {}", location.store_id);
    println!("  address: {}", location.address);
    if let Some(zip) = &location.zip_code {
        println!("  zip:     {zip}");
    }
    if let Some(phone) = &location.phone {
        println!("  phone:   {phone}");
    }
    if let Some(url) = &location.website_url {
        println!("  website: {url}");
    }
    if let (Some(lat), Some(lon)) = (location.latitude, location.longitude) {
        println!("  coords:  {lat:.5}, {lon:.5}");
    }
    if let Some(hours) = &location.hours {
        println!("  hours:");
        for (day, open) in hours {
            let day = format!("{day:?}");
            println!("    {day:<10} {open}");
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
