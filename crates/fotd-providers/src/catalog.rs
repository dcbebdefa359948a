//! Search and lookup over hard-wired store lists.

use fotd_core::{FlavorError, LocationInfo};

/// Case-insensitive match of `term` against name, city and address, then an
/// optional exact (case-insensitive) state filter. An empty term matches
/// every store.
#[must_use]
pub fn search(stores: &[LocationInfo], term: &str, state: Option<&str>) -> Vec<LocationInfo> {
    let needle = term.trim().to_lowercase();
    let state = state.map(str::trim).filter(|s| !s.is_empty());

    stores
        .iter()
        .filter(|loc| {
            needle.is_empty()
                || loc.name.to_lowercase().contains(&needle)
                || loc.city.to_lowercase().contains(&needle)
                || loc.address.to_lowercase().contains(&needle)
        })
        .filter(|loc| state.is_none_or(|s| loc.state.eq_ignore_ascii_case(s)))
        .cloned()
        .collect()
}

/// # Errors
///
/// [`FlavorError::LocationNotFound`] when `location_id` is not in `stores`.
pub fn find(stores: &[LocationInfo], location_id: &str) -> Result<LocationInfo, FlavorError> {
    stores
        .iter()
        .find(|loc| loc.store_id == location_id)
        .cloned()
        .ok_or_else(|| FlavorError::location_not_found(location_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> Vec<LocationInfo> {
        vec![
            LocationInfo::new(
                "a-raleigh",
                "Goodberry's - Raleigh",
                "2421 Spring Forest Rd.",
                "Raleigh",
                "NC",
            ),
            LocationInfo::new("a-cary", "Goodberry's - Cary", "2325 Davis Dr.", "Cary", "NC"),
            LocationInfo::new(
                "b-wales",
                "Leduc's Frozen Custard",
                "240 W. Summit Ave.",
                "Wales",
                "WI",
            ),
        ]
    }

    #[test]
    fn empty_term_lists_everything() {
        assert_eq!(search(&stores(), "", None).len(), 3);
    }

    #[test]
    fn term_matches_city_name_or_address() {
        assert_eq!(search(&stores(), "raleigh", None).len(), 1);
        assert_eq!(search(&stores(), "DAVIS", None).len(), 1);
        assert_eq!(search(&stores(), "goodberry", None).len(), 2);
    }

    #[test]
    fn state_filter_applies_after_term() {
        assert_eq!(search(&stores(), "", Some("wi")).len(), 1);
        assert!(search(&stores(), "raleigh", Some("WI")).is_empty());
    }

    #[test]
    fn no_match_is_empty_not_error() {
        assert!(search(&stores(), "anchorage", None).is_empty());
    }

    #[test]
    fn find_unknown_id_is_location_not_found() {
        let err = find(&stores(), "nope").unwrap_err();
        assert!(matches!(err, FlavorError::LocationNotFound { .. }), "got: {err:?}");
        assert_eq!(find(&stores(), "a-cary").unwrap().city, "Cary");
    }
}
