use serde::{Deserialize, Serialize};

/// Platform weather condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "clear-night")]
    ClearNight,
    #[serde(rename = "cloudy")]
    Cloudy,
    #[serde(rename = "fog")]
    Fog,
    #[serde(rename = "hail")]
    Hail,
    #[serde(rename = "lightning")]
    Lightning,
    #[serde(rename = "lightning-rainy")]
    LightningRainy,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    #[serde(rename = "pouring")]
    Pouring,
    #[serde(rename = "rainy")]
    Rainy,
    #[serde(rename = "snowy")]
    Snowy,
    #[serde(rename = "snowy-rainy")]
    SnowyRainy,
    #[serde(rename = "sunny")]
    Sunny,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::ClearNight => "clear-night",
            Condition::Cloudy => "cloudy",
            Condition::Fog => "fog",
            Condition::Hail => "hail",
            Condition::Lightning => "lightning",
            Condition::LightningRainy => "lightning-rainy",
            Condition::PartlyCloudy => "partlycloudy",
            Condition::Pouring => "pouring",
            Condition::Rainy => "rainy",
            Condition::Snowy => "snowy",
            Condition::SnowyRainy => "snowy-rainy",
            Condition::Sunny => "sunny",
        }
    }

    /// Look up the condition for a vendor weather symbol.
    ///
    /// Returns `None` for symbols the table does not know about.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let condition = match symbol {
            "sunshine" => Condition::Sunny,
            "sunshine_night" => Condition::ClearNight,
            "partlycloudy" | "partlycloudy2" => Condition::PartlyCloudy,
            "cloudy" | "overcast" => Condition::Cloudy,
            "fog" => Condition::Fog,
            "hail" => Condition::Hail,
            "thunderstorm" => Condition::Lightning,
            "rainheavy" => Condition::LightningRainy,
            "showersheavy" => Condition::Pouring,
            "showers_light" | "showers_moderate" | "showers_rain_light" | "rain"
            | "rain_light" | "rain_moderate" => Condition::Rainy,
            "snow" | "snowshowers" | "snowshowersheavy" | "snowheavy" => Condition::Snowy,
            "snowrain" | "snowrainshowers" | "snowrainshowersheavy" | "snowrainheavy" => {
                Condition::SnowyRainy
            }
            _ => return None,
        };

        Some(condition)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_map_to_conditions() {
        assert_eq!(Condition::from_symbol("sunshine"), Some(Condition::Sunny));
        assert_eq!(Condition::from_symbol("sunshine_night"), Some(Condition::ClearNight));
        assert_eq!(Condition::from_symbol("partlycloudy2"), Some(Condition::PartlyCloudy));
        assert_eq!(Condition::from_symbol("overcast"), Some(Condition::Cloudy));
        assert_eq!(Condition::from_symbol("snowrainheavy"), Some(Condition::SnowyRainy));
        assert_eq!(Condition::from_symbol("showers_light"), Some(Condition::Rainy));
    }

    #[test]
    fn unknown_symbol_has_no_condition() {
        assert_eq!(Condition::from_symbol("volcanic_ash"), None);
        assert_eq!(Condition::from_symbol(""), None);
    }

    #[test]
    fn serializes_as_platform_code() {
        let json = serde_json::to_string(&Condition::LightningRainy).unwrap();
        assert_eq!(json, "\"lightning-rainy\"");
        assert_eq!(Condition::ClearNight.to_string(), "clear-night");
    }
}
