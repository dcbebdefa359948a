use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Closed set of supported store chains.
///
/// The lowercase key is the registry key, the cache namespace and the
/// value written in the stores file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Culvers,
    Kopps,
    Oscars,
    Goodberrys,
    Leducs,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Culvers,
        ProviderId::Kopps,
        ProviderId::Oscars,
        ProviderId::Goodberrys,
        ProviderId::Leducs,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Culvers => "culvers",
            ProviderId::Kopps => "kopps",
            ProviderId::Oscars => "oscars",
            ProviderId::Goodberrys => "goodberrys",
            ProviderId::Leducs => "leducs",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Culvers => "Culver's",
            ProviderId::Kopps => "Kopp's Frozen Custard",
            ProviderId::Oscars => "Oscar's Frozen Custard",
            ProviderId::Goodberrys => "Goodberry's Frozen Custard",
            ProviderId::Leducs => "Leduc's Frozen Custard",
        }
    }

    fn expected_list() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == key)
            .ok_or_else(|| ConfigError::UnknownProvider {
                id: s.to_string(),
                expected: Self::expected_list(),
            })
    }
}
