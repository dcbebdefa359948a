//! Kopp's Frozen Custard: three Milwaukee-area stores sharing one flavor
//! schedule.
//!
//! `/flavor-preview` lists days as `<div id="{day of month}">` blocks, each
//! holding one `h3.fw-black` per flavor. Kopp's serves two flavors a day, so
//! names are joined with `" & "`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use reqwest::Client;

use fotd_core::{DayOfWeek, FlavorError, FlavorInfo, LocationInfo, ProviderConfig, ProviderId};

use crate::catalog;
use crate::dates::{infer_day_of_month, start_of_day, Today};
use crate::html::{elements_with_id, headings};
use crate::http::HttpSession;
use crate::provider::{select_upcoming, Capabilities, FlavorProvider, UpcomingFlavor};

pub const KOPPS_BASE_URL: &str = "https://www.kopps.com";

const FLAVOR_CLASS: &str = "fw-black";

fn stores() -> Vec<LocationInfo> {
    let hours = |weekday: &str, weekend: &str| -> BTreeMap<DayOfWeek, String> {
        DayOfWeek::ALL
            .into_iter()
            .map(|day| {
                let h = match day {
                    DayOfWeek::Friday | DayOfWeek::Saturday => weekend,
                    _ => weekday,
                };
                (day, h.to_string())
            })
            .collect()
    };

    [
        ("kopps-greenfield", "Greenfield", "7631 W. Layton Ave.", "53220", "(414) 281-2700"),
        ("kopps-brookfield", "Brookfield", "18880 W. Bluemound Rd.", "53045", "(262) 792-2800"),
        ("kopps-glendale", "Glendale", "5373 N. Port Washington Rd.", "53217", "(414) 354-9800"),
    ]
    .into_iter()
    .map(|(id, city, address, zip, phone)| {
        LocationInfo::new(id, format!("Kopp's Frozen Custard - {city}"), address, city, "WI")
            .with_zip_code(Some(zip))
            .with_phone(Some(phone))
            .with_website_url(Some(KOPPS_BASE_URL))
            .with_hours(hours("10:30am-10pm", "10:30am-11pm"))
    })
    .collect()
}

pub struct KoppsProvider {
    session: HttpSession,
    today: Today,
}

impl KoppsProvider {
    pub const CAPABILITIES: Capabilities = Capabilities {
        upcoming_flavors: true,
        fixed_catalog: true,
    };

    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            session: HttpSession::new(ProviderId::Kopps, client, config, KOPPS_BASE_URL),
            today: Today::local(),
        }
    }

    #[must_use]
    pub fn with_today(mut self, today: Today) -> Self {
        self.today = today;
        self
    }

    async fn preview(&self, location_id: &str) -> Result<Vec<(u32, String)>, FlavorError> {
        catalog::find(&stores(), location_id)?;
        let html = self.session.get_text("/flavor-preview", &[]).await?;
        Ok(day_sections(&html))
    }
}

#[async_trait]
impl FlavorProvider for KoppsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Kopps
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
        let sections = self.preview(location_id).await?;
        let today = self.today.get().day();

        sections
            .into_iter()
            .find(|(day, _)| *day == today)
            .and_then(|(_, name)| FlavorInfo::new(name))
            .map(|flavor| flavor.with_available_date(Utc::now()))
            .ok_or_else(|| {
                FlavorError::flavor_not_available(
                    location_id,
                    format!("flavor preview has no entry for day {today}"),
                )
            })
    }

    async fn get_upcoming_flavors(
        &self,
        location_id: &str,
        days: usize,
    ) -> Result<Vec<UpcomingFlavor>, FlavorError> {
        let sections = self.preview(location_id).await?;
        let today = self.today.get();

        let entries = sections
            .into_iter()
            .filter_map(|(day, name)| {
                let date = infer_day_of_month(today, day)?;
                let flavor = FlavorInfo::new(name)?.with_available_date(start_of_day(date));
                Some((date, flavor))
            })
            .collect();
        Ok(select_upcoming(entries, today, days))
    }
}

/// `(day of month, joined flavor names)` for every day block that lists at
/// least one flavor.
fn day_sections(html: &str) -> Vec<(u32, String)> {
    let starts: Vec<(u32, usize)> = elements_with_id(html, "div")
        .into_iter()
        .filter_map(|(id, start)| {
            let day = id.trim().parse::<u32>().ok()?;
            (1..=31).contains(&day).then_some((day, start))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &(day, start))| {
            let end = starts.get(i + 1).map_or(html.len(), |&(_, next)| next);
            let names: Vec<String> = headings(&html[start..end])
                .into_iter()
                .filter(|h| h.tag == "h3" && h.has_class(FLAVOR_CLASS) && !h.text.is_empty())
                .map(|h| h.text)
                .collect();
            (!names.is_empty()).then(|| (day, names.join(" & ")))
        })
        .collect()
}
