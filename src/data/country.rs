use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Countries whose days count toward the shared allowance.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Country {
    Austria,
    Belgium,
    #[serde(rename = "Czech Republic")]
    CzechRepublic,
    Denmark,
    Estonia,
    Finland,
    France,
    Germany,
    Greece,
    Hungary,
    Iceland,
    Italy,
    Latvia,
    Liechtenstein,
    Lithuania,
    Luxembourg,
    Malta,
    Netherlands,
    Norway,
    Poland,
    Portugal,
    Slovakia,
    Slovenia,
    Spain,
    Sweden,
    Switzerland,
}

impl Country {
    pub const ALL: [Country; 26] = [
        Country::Austria,
        Country::Belgium,
        Country::CzechRepublic,
        Country::Denmark,
        Country::Estonia,
        Country::Finland,
        Country::France,
        Country::Germany,
        Country::Greece,
        Country::Hungary,
        Country::Iceland,
        Country::Italy,
        Country::Latvia,
        Country::Liechtenstein,
        Country::Lithuania,
        Country::Luxembourg,
        Country::Malta,
        Country::Netherlands,
        Country::Norway,
        Country::Poland,
        Country::Portugal,
        Country::Slovakia,
        Country::Slovenia,
        Country::Spain,
        Country::Sweden,
        Country::Switzerland,
    ];

    /// ISO 3166-1 alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Country::Austria => "AT",
            Country::Belgium => "BE",
            Country::CzechRepublic => "CZ",
            Country::Denmark => "DK",
            Country::Estonia => "EE",
            Country::Finland => "FI",
            Country::France => "FR",
            Country::Germany => "DE",
            Country::Greece => "GR",
            Country::Hungary => "HU",
            Country::Iceland => "IS",
            Country::Italy => "IT",
            Country::Latvia => "LV",
            Country::Liechtenstein => "LI",
            Country::Lithuania => "LT",
            Country::Luxembourg => "LU",
            Country::Malta => "MT",
            Country::Netherlands => "NL",
            Country::Norway => "NO",
            Country::Poland => "PL",
            Country::Portugal => "PT",
            Country::Slovakia => "SK",
            Country::Slovenia => "SI",
            Country::Spain => "ES",
            Country::Sweden => "SE",
            Country::Switzerland => "CH",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Country::Austria => "Austria",
            Country::Belgium => "Belgium",
            Country::CzechRepublic => "Czech Republic",
            Country::Denmark => "Denmark",
            Country::Estonia => "Estonia",
            Country::Finland => "Finland",
            Country::France => "France",
            Country::Germany => "Germany",
            Country::Greece => "Greece",
            Country::Hungary => "Hungary",
            Country::Iceland => "Iceland",
            Country::Italy => "Italy",
            Country::Latvia => "Latvia",
            Country::Liechtenstein => "Liechtenstein",
            Country::Lithuania => "Lithuania",
            Country::Luxembourg => "Luxembourg",
            Country::Malta => "Malta",
            Country::Netherlands => "Netherlands",
            Country::Norway => "Norway",
            Country::Poland => "Poland",
            Country::Portugal => "Portugal",
            Country::Slovakia => "Slovakia",
            Country::Slovenia => "Slovenia",
            Country::Spain => "Spain",
            Country::Sweden => "Sweden",
            Country::Switzerland => "Switzerland",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Country {
    type Err = String;

    /// Accepts either the two-letter code or the display name, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Country::ALL
            .iter()
            .find(|c| c.code().eq_ignore_ascii_case(needle) || c.name().eq_ignore_ascii_case(needle))
            .copied()
            .ok_or_else(|| format!("'{}' is not a tracked country", needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_code() {
        assert_eq!("de".parse::<Country>().unwrap(), Country::Germany);
        assert_eq!("CH".parse::<Country>().unwrap(), Country::Switzerland);
    }

    #[test]
    fn test_parse_by_name() {
        assert_eq!("czech republic".parse::<Country>().unwrap(), Country::CzechRepublic);
        assert_eq!(" Malta ".parse::<Country>().unwrap(), Country::Malta);
    }

    #[test]
    fn test_parse_unknown_errors() {
        let err = "Atlantis".parse::<Country>().unwrap_err();
        assert!(err.contains("Atlantis"));
        // United Kingdom is outside the area.
        assert!("GB".parse::<Country>().is_err());
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = Country::ALL.iter().map(|c| c.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), Country::ALL.len());
    }

    #[test]
    fn test_serializes_as_display_name() {
        let json = serde_json::to_string(&Country::CzechRepublic).unwrap();
        assert_eq!(json, "\"Czech Republic\"");
        let back: Country = serde_json::from_str("\"Netherlands\"").unwrap();
        assert_eq!(back, Country::Netherlands);
    }
}
