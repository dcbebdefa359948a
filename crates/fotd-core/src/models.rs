//! Immutable value objects for flavors and store locations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProviderId;

/// Today's (or a scheduled day's) flavor at one store.
///
/// `name` is never empty; [`FlavorInfo::new`] refuses blank names so that
/// "no flavor" can only be expressed as an error. Optional fields are
/// `None` when unknown and never hold an empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlavorInfo {
    name: String,
    description: Option<String>,
    ingredients: Option<Vec<String>>,
    allergens: Option<Vec<String>>,
    image_url: Option<String>,
    available_date: Option<DateTime<Utc>>,
    price: Option<String>,
    nutrition_info: Option<BTreeMap<String, String>>,
}

impl FlavorInfo {
    /// Creates a flavor with only a name. Returns `None` when the trimmed
    /// name is empty.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = non_blank(name.as_ref())?;
        Some(Self {
            name,
            description: None,
            ingredients: None,
            allergens: None,
            image_url: None,
            available_date: None,
            price: None,
            nutrition_info: None,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = description.and_then(non_blank);
        self
    }

    #[must_use]
    pub fn with_ingredients(mut self, ingredients: Vec<String>) -> Self {
        self.ingredients = non_empty_list(ingredients);
        self
    }

    #[must_use]
    pub fn with_allergens(mut self, allergens: Vec<String>) -> Self {
        self.allergens = non_empty_list(allergens);
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: Option<&str>) -> Self {
        self.image_url = image_url.and_then(non_blank);
        self
    }

    #[must_use]
    pub fn with_available_date(mut self, available_date: DateTime<Utc>) -> Self {
        self.available_date = Some(available_date);
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: Option<&str>) -> Self {
        self.price = price.and_then(non_blank);
        self
    }

    #[must_use]
    pub fn with_nutrition_info(mut self, nutrition_info: BTreeMap<String, String>) -> Self {
        let cleaned: BTreeMap<String, String> = nutrition_info
            .into_iter()
            .filter_map(|(k, v)| Some((non_blank(&k)?, non_blank(&v)?)))
            .collect();
        self.nutrition_info = (!cleaned.is_empty()).then_some(cleaned);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn ingredients(&self) -> Option<&[String]> {
        self.ingredients.as_deref()
    }

    #[must_use]
    pub fn allergens(&self) -> Option<&[String]> {
        self.allergens.as_deref()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    #[must_use]
    pub fn available_date(&self) -> Option<DateTime<Utc>> {
        self.available_date
    }

    #[must_use]
    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    #[must_use]
    pub fn nutrition_info(&self) -> Option<&BTreeMap<String, String>> {
        self.nutrition_info.as_ref()
    }
}

/// Day keys for store opening hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];
}

/// A physical store as known to one provider.
///
/// `store_id` is only unique inside its provider; [`LocationInfo::key`]
/// pairs it with the provider to form the real identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub store_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
    pub hours: Option<BTreeMap<DayOfWeek, String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationInfo {
    #[must_use]
    pub fn new(
        store_id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            name: name.into(),
            address: address.into(),
            city: city.into(),
            state: state.into(),
            zip_code: None,
            phone: None,
            website_url: None,
            hours: None,
            latitude: None,
            longitude: None,
        }
    }

    #[must_use]
    pub fn with_zip_code(mut self, zip_code: Option<&str>) -> Self {
        self.zip_code = zip_code.and_then(non_blank);
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: Option<&str>) -> Self {
        self.phone = phone.and_then(non_blank);
        self
    }

    #[must_use]
    pub fn with_website_url(mut self, website_url: Option<&str>) -> Self {
        self.website_url = website_url.and_then(non_blank);
        self
    }

    /// Same opening hours every day of the week.
    #[must_use]
    pub fn with_daily_hours(mut self, hours: &str) -> Self {
        self.hours = Some(
            DayOfWeek::ALL
                .into_iter()
                .map(|day| (day, hours.to_owned()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn with_hours(mut self, hours: BTreeMap<DayOfWeek, String>) -> Self {
        self.hours = (!hours.is_empty()).then_some(hours);
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Human readable label, e.g. `"Kopp's Frozen Custard - Glendale - Glendale, WI"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} - {}, {}", self.name, self.city, self.state)
    }
}

/// Composite identity of a store: `(provider, store_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
    pub provider: ProviderId,
    pub store_id: String,
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.provider, self.store_id)
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn non_empty_list(items: Vec<String>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = items.iter().filter_map(|s| non_blank(s)).collect();
    (!cleaned.is_empty()).then_some(cleaned)
}
