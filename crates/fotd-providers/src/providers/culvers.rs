//! Culver's: nationwide chain with a public locator API and one page per
//! restaurant.
//!
//! - Search: `GET /api/locator/getLocations?location=..&radius=40233&limit=25`
//! - Lookup and today's flavor: `GET /restaurants/{slug}`; 404 means the
//!   restaurant does not exist.
//!
//! The flavor name is the `h2` immediately preceding the "Today's Flavor of
//! the Day" `h3`. When the page layout changes, the embedded Next.js payload
//! (`props.pageProps.restaurant.FlavorOfTheDay`) is used instead.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use fotd_core::{FlavorError, FlavorInfo, LocationInfo, ProviderConfig, ProviderId};

use crate::html::{clean_text, headings, jsonld_nodes, jsonld_type_is, next_data, normalize_label};
use crate::http::{HttpSession, BROWSER_USER_AGENT};
use crate::provider::{Capabilities, FlavorProvider};

pub const CULVERS_BASE_URL: &str = "https://www.culvers.com";

/// ~25 miles.
const SEARCH_RADIUS_METERS: &str = "40233";
const SEARCH_LIMIT: &str = "25";
const TODAY_LABEL: &str = "today's flavor of the day";
const RESTAURANT_TYPES: &[&str] = &[
    "Restaurant",
    "FastFoodRestaurant",
    "FoodEstablishment",
    "IceCreamShop",
    "LocalBusiness",
];

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

#[derive(Debug, Deserialize)]
struct LocatorResponse {
    data: Option<LocatorData>,
}

#[derive(Debug, Deserialize)]
struct LocatorData {
    #[serde(default)]
    geofences: Vec<Geofence>,
}

#[derive(Debug, Deserialize)]
struct Geofence {
    description: Option<String>,
    metadata: Option<GeofenceMetadata>,
    #[serde(rename = "geometryCenter")]
    geometry_center: Option<GeometryCenter>,
}

#[derive(Debug, Deserialize)]
struct GeofenceMetadata {
    slug: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    #[serde(rename = "postalCode")]
    postal_code: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeometryCenter {
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl Geofence {
    fn into_location(self, base_url: &str) -> Option<LocationInfo> {
        let meta = self.metadata?;
        let slug = meta.slug.filter(|s| !s.trim().is_empty())?;
        let city = meta.city?;
        let label = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| city.clone());

        // GeoJSON order: [longitude, latitude].
        let (latitude, longitude) = match self.geometry_center.map(|g| g.coordinates).as_deref() {
            Some(&[lon, lat]) => (Some(lat), Some(lon)),
            _ => (None, None),
        };

        let website = format!("{base_url}/restaurants/{slug}");
        Some(
            LocationInfo::new(
                slug,
                format!("Culver's - {}", label.trim()),
                meta.street.unwrap_or_default(),
                city,
                meta.state.unwrap_or_default(),
            )
            .with_zip_code(meta.postal_code.as_deref())
            .with_phone(meta.phone.as_deref())
            .with_website_url(Some(&website))
            .with_coordinates(latitude, longitude),
        )
    }
}

pub struct CulversProvider {
    session: HttpSession,
}

impl CulversProvider {
    pub const CAPABILITIES: Capabilities = Capabilities {
        upcoming_flavors: false,
        fixed_catalog: false,
    };

    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            session: HttpSession::new(ProviderId::Culvers, client, config, CULVERS_BASE_URL)
                .with_user_agent(BROWSER_USER_AGENT),
        }
    }

    async fn restaurant_page(&self, location_id: &str) -> Result<String, FlavorError> {
        if !is_valid_slug(location_id) {
            return Err(FlavorError::location_not_found(location_id));
        }
        self.session
            .get_text(&format!("/restaurants/{location_id}"), &[])
            .await
            .map_err(|e| e.not_found_as_location(location_id))
    }
}

#[async_trait]
impl FlavorProvider for CulversProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Culvers
    }

    fn capabilities(&self) -> Capabilities {
        Self::CAPABILITIES
    }

    async fn search_locations(
        &self,
        search_term: &str,
        state: Option<&str>,
    ) -> Result<Vec<LocationInfo>, FlavorError> {
        let term = search_term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let query = [
            ("location", term),
            ("radius", SEARCH_RADIUS_METERS),
            ("limit", SEARCH_LIMIT),
            ("layer", ""),
        ];
        let response: LocatorResponse = self
            .session
            .get_json("/api/locator/getLocations", &query)
            .await
            .map_err(|e| match e.status() {
                Some(400 | 422) => FlavorError::location_not_found(term),
                _ => e,
            })?;

        let base_url = self.session.base_url()?;
        let geofences = response.data.map(|d| d.geofences).unwrap_or_default();
        let total = geofences.len();
        let locations: Vec<LocationInfo> = geofences
            .into_iter()
            .filter_map(|g| g.into_location(base_url))
            .filter(|loc| state.is_none_or(|s| loc.state.eq_ignore_ascii_case(s.trim())))
            .collect();

        tracing::debug!(
            provider = "culvers",
            term,
            total,
            returned = locations.len(),
            "location search complete"
        );
        Ok(locations)
    }

    async fn get_location_by_id(&self, location_id: &str) -> Result<LocationInfo, FlavorError> {
        let html = self.restaurant_page(location_id).await?;
        let base_url = self.session.base_url()?;
        Ok(location_from_jsonld(&html, location_id, base_url)
            .unwrap_or_else(|| location_from_slug(location_id, base_url)))
    }

    async fn get_current_flavor(&self, location_id: &str) -> Result<FlavorInfo, FlavorError> {
        let html = self.restaurant_page(location_id).await?;
        let base_url = self.session.base_url()?;
        extract_flavor(&html, base_url)
            .map(|flavor| flavor.with_available_date(Utc::now()))
            .ok_or_else(|| {
                FlavorError::flavor_not_available(
                    location_id,
                    "restaurant page lists no flavor of the day",
                )
            })
    }
}

fn is_valid_slug(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn extract_flavor(html: &str, base_url: &str) -> Option<FlavorInfo> {
    let embedded = flavor_from_next_data(html, base_url);

    let Some(name) = flavor_name_from_headings(html) else {
        return embedded;
    };

    // The visible heading names the flavor; the payload only contributes
    // details when it describes the same flavor.
    let flavor = FlavorInfo::new(&name)?;
    match embedded {
        Some(rich) if rich.name().eq_ignore_ascii_case(&name) => Some(
            flavor
                .with_description(rich.description())
                .with_image_url(rich.image_url()),
        ),
        _ => Some(flavor),
    }
}

fn flavor_name_from_headings(html: &str) -> Option<String> {
    let found = headings(html);
    let label_at = found
        .iter()
        .position(|h| h.tag == "h3" && normalize_label(&h.text) == TODAY_LABEL)?;
    found[..label_at]
        .iter()
        .rev()
        .find(|h| h.tag == "h2")
        .map(|h| h.text.clone())
        .filter(|name| !name.is_empty())
}

fn flavor_from_next_data(html: &str, base_url: &str) -> Option<FlavorInfo> {
    let data = next_data(html)?;
    let fotd = data.pointer("/props/pageProps/restaurant/FlavorOfTheDay")?;
    let fotd = match fotd {
        Value::Array(items) => items.first()?,
        other => other,
    };

    let text = |key: &str| fotd.get(key).and_then(Value::as_str).map(clean_text);
    let image = text("Image").map(|img| {
        if img.starts_with('/') {
            format!("{base_url}{img}")
        } else {
            img
        }
    });

    Some(
        FlavorInfo::new(text("Name")?)?
            .with_description(text("Description").as_deref())
            .with_image_url(image.as_deref()),
    )
}

fn location_from_jsonld(html: &str, location_id: &str, base_url: &str) -> Option<LocationInfo> {
    let node = jsonld_nodes(html)
        .into_iter()
        .find(|n| jsonld_type_is(n, RESTAURANT_TYPES) && n.get("address").is_some())?;

    let address = node.get("address")?;
    let field = |v: &Value, key: &str| {
        v.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
    };
    let coordinate = |key: &str| {
        node.get("geo").and_then(|g| g.get(key)).and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    };

    let city = field(address, "addressLocality")?;
    let name = field(&node, "name")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Culver's - {city}"));
    let website = format!("{base_url}/restaurants/{location_id}");

    Some(
        LocationInfo::new(
            location_id,
            name,
            field(address, "streetAddress").unwrap_or_default(),
            city,
            field(address, "addressRegion").unwrap_or_default(),
        )
        .with_zip_code(field(address, "postalCode").as_deref())
        .with_phone(field(&node, "telephone").as_deref())
        .with_website_url(Some(&website))
        .with_coordinates(coordinate("latitude"), coordinate("longitude")),
    )
}

/// Best effort when the page carries no structured data. Slugs read
/// `{city}-{state}-{street}`, e.g. `madison-wi-mineral-point-rd`.
fn location_from_slug(location_id: &str, base_url: &str) -> LocationInfo {
    let tokens: Vec<&str> = location_id.split('-').filter(|t| !t.is_empty()).collect();
    let state_at = tokens
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, t)| US_STATES.contains(&t.to_ascii_uppercase().as_str()))
        .map(|(i, _)| i);

    let (city, state, street) = match state_at {
        Some(i) => (
            title_case(&tokens[..i]),
            tokens[i].to_ascii_uppercase(),
            title_case(&tokens[i + 1..]),
        ),
        None => (title_case(&tokens[..tokens.len().min(1)]), String::new(), String::new()),
    };

    let website = format!("{base_url}/restaurants/{location_id}");
    LocationInfo::new(
        location_id,
        format!("Culver's - {}", title_case(&tokens)),
        street,
        city,
        state,
    )
    .with_website_url(Some(&website))
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
