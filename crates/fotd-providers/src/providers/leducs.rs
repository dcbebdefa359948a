//! Leduc's Frozen Custard: a single store in Wales, WI.
//!
//! Both the home page and `/flavor-calendar` list the schedule as text
//! lines of the form "Sep 27: Cookies & Cream"; some layouts put the name
//! on the line after the date.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use reqwest::Client;

use fotd_core::{FlavorError, FlavorInfo, LocationInfo, ProviderConfig, ProviderId};

use crate::catalog;
use crate::dates::{infer_date, month_from_name, start_of_day, Today};
use crate::html::text_lines;
use crate::http::HttpSession;
use crate::provider::{select_upcoming, Capabilities, FlavorProvider, UpcomingFlavor};

pub const LEDUCS_BASE_URL: &str = "https://www.leducscustard.com";

static CALENDAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{3,9})\.?\s+(\d{1,2})\b\s*:?\s*(.*)$").expect("valid regex")
});

fn stores() -> Vec<LocationInfo> {
    vec![LocationInfo::new(
        "leducs-wales",
        "Leduc's Frozen Custard",
        "240 W. Summit Ave.",
        "Wales",
        "WI",
    )
    .with_zip_code(Some("53183"))
    .with_phone(Some("(262) 968-2894"))
    .with_website_url(Some(LEDUCS_BASE_URL))
    .with_daily_hours("11:00AM-9:00PM")]
}

pub struct LeducsProvider {
    session: HttpSession,
    today: Today,
}

impl LeducsProvider {
    pub const CAPABILITIES: Capabilities = Capabilities {
        upcoming_flavors: true,
        fixed_catalog: true,
    };

    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            session: HttpSession::new(ProviderId::Leducs, client, config, LEDUCS_BASE_URL),
            today: Today::local(),
        }
    }

    #[must_use]
    pub fn with_today(mut self, today: Today) -> Self {
        self.today = today;
        self
    }

    async fn calendar(
        &self,
        location_id: &str,
        path: &str,
    ) -> Result<Vec<(NaiveDate, String)>, FlavorError> {
        catalog::find(&stores(), location_id)?;
        let html = self.session.get_text(path, &[]).await?;
        Ok(parse_calendar(&text_lines(&html), self.today.get()))
    }
}

#[async_trait]
impl FlavorProvider for LeducsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Leducs
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
        self.calendar(location_id, "/")
            .await?
            .into_iter()
            .find(|(date, _)| *date == today)
            .and_then(|(_, name)| FlavorInfo::new(name))
            .map(|flavor| flavor.with_available_date(Utc::now()))
            .ok_or_else(|| {
                FlavorError::flavor_not_available(
                    location_id,
                    format!("no flavor listed for {}", today.format("%b %-d")),
                )
            })
    }

    async fn get_upcoming_flavors(
        &self,
        location_id: &str,
        days: usize,
    ) -> Result<Vec<UpcomingFlavor>, FlavorError> {
        let entries = self
            .calendar(location_id, "/flavor-calendar")
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

fn parse_calendar(lines: &[String], today: NaiveDate) -> Vec<(NaiveDate, String)> {
    let dated = |line: &str| -> Option<(NaiveDate, String)> {
        let cap = CALENDAR_RE.captures(line)?;
        let month = month_from_name(cap.get(1)?.as_str())?;
        let day = cap.get(2)?.as_str().parse().ok()?;
        let date = infer_date(today, month, day)?;
        Some((date, cap.get(3).map_or("", |m| m.as_str()).trim().to_string()))
    };

    let mut entries = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some((date, name)) = dated(line) else {
            continue;
        };
        let name = if name.is_empty() {
            // Name on the following line, unless that line is another date.
            match lines.get(i + 1) {
                Some(next) if dated(next).is_none() => next.clone(),
                _ => continue,
            }
        } else {
            name
        };
        entries.push((date, name));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn parses_inline_and_next_line_names() {
        let input = lines(&[
            "Flavor Calendar",
            "Sep 27: Cookies & Cream",
            "Sep 28",
            "Caramel Cashew",
            "Sep 29:",
            "Sep 30: Mint Chip",
            "Open 7 days a week",
        ]);
        let parsed = parse_calendar(&input, date("2026-09-27"));
        assert_eq!(
            parsed,
            vec![
                (date("2026-09-27"), "Cookies & Cream".to_string()),
                (date("2026-09-28"), "Caramel Cashew".to_string()),
                (date("2026-09-30"), "Mint Chip".to_string()),
            ]
        );
    }

    #[test]
    fn year_rolls_over_in_late_december() {
        let parsed = parse_calendar(&lines(&["Jan 2: Eggnog"]), date("2026-12-30"));
        assert_eq!(parsed[0].0, date("2027-01-02"));
    }

    #[test]
    fn single_store_has_daily_hours() {
        let store = &stores()[0];
        assert_eq!(store.store_id, "leducs-wales");
        assert_eq!(store.hours.as_ref().map(std::collections::BTreeMap::len), Some(7));
    }
}
