//! Oscar's Frozen Custard: two stores, schedule published on the home page
//! as `h5` headings like "Monday, September 29: Red Raspberry".

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use reqwest::Client;

use fotd_core::{FlavorError, FlavorInfo, LocationInfo, ProviderConfig, ProviderId};

use crate::catalog;
use crate::dates::{infer_date, month_from_name, start_of_day, Today};
use crate::html::headings;
use crate::http::HttpSession;
use crate::provider::{select_upcoming, Capabilities, FlavorProvider, UpcomingFlavor};

pub const OSCARS_BASE_URL: &str = "https://www.oscarscustard.com";

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday),?\s+([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?\s*:\s*(.+)$",
    )
    .expect("valid regex")
});

fn stores() -> Vec<LocationInfo> {
    vec![
        LocationInfo::new(
            "oscars-west-allis",
            "Oscar's Frozen Custard - West Allis",
            "2362 S. 108th St.",
            "Milwaukee",
            "WI",
        )
        .with_zip_code(Some("53227"))
        .with_website_url(Some(OSCARS_BASE_URL)),
        LocationInfo::new(
            "oscars-franklin",
            "Oscar's Frozen Custard - Franklin",
            "7041 South 27th St.",
            "Franklin",
            "WI",
        )
        .with_zip_code(Some("53132"))
        .with_website_url(Some(OSCARS_BASE_URL)),
    ]
}

pub struct OscarsProvider {
    session: HttpSession,
    today: Today,
}

impl OscarsProvider {
    pub const CAPABILITIES: Capabilities = Capabilities {
        upcoming_flavors: true,
        fixed_catalog: true,
    };

    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            session: HttpSession::new(ProviderId::Oscars, client, config, OSCARS_BASE_URL),
            today: Today::local(),
        }
    }

    #[must_use]
    pub fn with_today(mut self, today: Today) -> Self {
        self.today = today;
        self
    }

    async fn schedule(&self, location_id: &str) -> Result<Vec<(NaiveDate, String)>, FlavorError> {
        catalog::find(&stores(), location_id)?;
        let html = self.session.get_text("/", &[]).await?;
        Ok(parse_schedule(&html, self.today.get()))
    }
}

#[async_trait]
impl FlavorProvider for OscarsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Oscars
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
        let today = self.today.get();
        self.schedule(location_id)
            .await?
            .into_iter()
            .find(|(date, _)| *date == today)
            .and_then(|(_, name)| FlavorInfo::new(name))
            .map(|flavor| flavor.with_available_date(Utc::now()))
            .ok_or_else(|| {
                FlavorError::flavor_not_available(
                    location_id,
                    format!("no flavor listed for {}", today.format("%A, %B %-d")),
                )
            })
    }

    async fn get_upcoming_flavors(
        &self,
        location_id: &str,
        days: usize,
    ) -> Result<Vec<UpcomingFlavor>, FlavorError> {
        let entries = self
            .schedule(location_id)
            .await?
            .into_iter()
            .filter_map(|(date, name)| {
                let flavor = FlavorInfo::new(name)?.with_available_date(start_of_day(date));
                Some((date, flavor))
            })
            .collect();
        Ok(select_upcoming(entries, self.today.get(), days))
    }
}

/// Dated `h5` entries in page order. Headings that do not parse are skipped.
fn parse_schedule(html: &str, today: NaiveDate) -> Vec<(NaiveDate, String)> {
    headings(html)
        .into_iter()
        .filter(|h| h.tag == "h5")
        .filter_map(|h| {
            let cap = ENTRY_RE.captures(&h.text)?;
            let month = month_from_name(cap.get(1)?.as_str())?;
            let day = cap.get(2)?.as_str().parse().ok()?;
            let date = infer_date(today, month, day)?;
            let name = cap.get(3)?.as_str().trim().to_string();
            (!name.is_empty()).then_some((date, name))
        })
        .collect()
}
