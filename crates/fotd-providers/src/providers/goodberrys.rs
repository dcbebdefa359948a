//! Goodberry's Frozen Custard: nine North Carolina stores, one flavor of
//! the day shown on the home page inside an element whose class contains
//! `flavor-of-the-day`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use fotd_core::{FlavorError, FlavorInfo, LocationInfo, ProviderConfig, ProviderId};

use crate::catalog;
use crate::html::{find_element_with_class, headings};
use crate::http::HttpSession;
use crate::provider::{Capabilities, FlavorProvider};

pub const GOODBERRYS_BASE_URL: &str = "https://goodberrys.com";

const FLAVOR_CLASS: &str = "flavor-of-the-day";
/// How far past the marker element the name heading may appear.
const SEARCH_WINDOW: usize = 4096;

fn stores() -> Vec<LocationInfo> {
    [
        (
            "goodberrys-southern-pines",
            "Southern Pines",
            "231 Carolina Green Pkwy",
            "Southern Pines",
        ),
        (
            "goodberrys-raleigh-spring-forest",
            "Raleigh (Spring Forest)",
            "2421 Spring Forest Rd.",
            "Raleigh",
        ),
        (
            "goodberrys-raleigh-strickland",
            "Raleigh (Strickland Rd)",
            "9700 Strickland Rd.",
            "Raleigh",
        ),
        ("goodberrys-raleigh-clark-ave", "Raleigh (Clark Ave)", "2042 Clark Ave.", "Raleigh"),
        (
            "goodberrys-cary-kildaire-farm",
            "Cary (Kildaire Farm Rd)",
            "1146 Kildaire Farm Rd.",
            "Cary",
        ),
        ("goodberrys-cary-davis-dr", "Cary (Davis Dr)", "2325 Davis Dr.", "Cary"),
        ("goodberrys-garner", "Garner", "1407 Garner Station Blvd.", "Garner"),
        ("goodberrys-wake-forest", "Wake Forest", "11736 Retail Dr.", "Wake Forest"),
        ("goodberrys-durham", "Durham", "3906 N. Roxboro St.", "Durham"),
    ]
    .into_iter()
    .map(|(id, label, address, city)| {
        LocationInfo::new(id, format!("Goodberry's - {label}"), address, city, "NC")
            .with_website_url(Some(GOODBERRYS_BASE_URL))
    })
    .collect()
}

pub struct GoodberrysProvider {
    session: HttpSession,
}

impl GoodberrysProvider {
    pub const CAPABILITIES: Capabilities = Capabilities {
        upcoming_flavors: false,
        fixed_catalog: true,
    };

    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            session: HttpSession::new(ProviderId::Goodberrys, client, config, GOODBERRYS_BASE_URL),
        }
    }
}

#[async_trait]
impl FlavorProvider for GoodberrysProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Goodberrys
    }

    fn capabilities(&self) -> Capabilities {
        Self::CAPABILITIES
    }

    async fn search_locations(
        &self,
        search_term: &str,
        state: Option<&str>,
    ) -> Result<Vec<LocationInfo>, FlavorError> {
        Ok(catalog::search(&stores(), search_term, state))
    }

    async fn get_location_by_id(&self, location_id: &str) -> Result<LocationInfo, FlavorError> {
        catalog::find(&stores(), location_id)
    }

    async fn get_current_flavor(&self, location_id: &str) -> Result<FlavorInfo, FlavorError> {
        catalog::find(&stores(), location_id)?;
        let html = self.session.get_text("/", &[]).await?;

        extract_flavor_name(&html)
            .and_then(FlavorInfo::new)
            .map(|flavor| flavor.with_available_date(Utc::now()))
            .ok_or_else(|| {
                FlavorError::flavor_not_available(
                    location_id,
                    "home page shows no flavor of the day",
                )
            })
    }
}

fn extract_flavor_name(html: &str) -> Option<String> {
    let after = find_element_with_class(html, FLAVOR_CLASS)?;
    headings(&html[after..])
        .into_iter()
        .take_while(|h| h.start < SEARCH_WINDOW)
        .find(|h| !h.text.is_empty())
        .map(|h| h.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_comes_from_first_heading_in_marker_element() {
        let html = r#"
            <h1>Goodberry's</h1>
            <div class="elementor-widget flavor-of-the-day">
              <span>Today's flavor</span>
              <h3>Peach Cobbler</h3>
            </div>
        "#;
        assert_eq!(extract_flavor_name(html).as_deref(), Some("Peach Cobbler"));
    }

    #[test]
    fn strong_tag_also_counts() {
        let html = r#"<p class="flavor-of-the-day-text"><strong>Black Raspberry</strong></p>"#;
        assert_eq!(extract_flavor_name(html).as_deref(), Some("Black Raspberry"));
    }

    #[test]
    fn missing_marker_is_none() {
        assert!(extract_flavor_name("<h3>Peach</h3>").is_none());
    }

    #[test]
    fn catalog_is_all_north_carolina() {
        let all = stores();
        assert_eq!(all.len(), 9);
        assert!(all.iter().all(|s| s.state == "NC"));
        assert_eq!(catalog::search(&all, "cary", None).len(), 2);
    }
}
