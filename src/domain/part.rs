//! Part identifiers and resolved part records.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Appliance category carried from the identifier list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApplianceCategory {
    Refrigerator,
    Dishwasher,
    Other(String),
}

impl ApplianceCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Refrigerator => "refrigerator",
            Self::Dishwasher => "dishwasher",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for ApplianceCategory {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "refrigerator" | "fridge" => Self::Refrigerator,
            "dishwasher" => Self::Dishwasher,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ApplianceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ApplianceCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplianceCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Input key for one part. Supplied by the caller and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartIdentifier {
    /// Primary site identifier, e.g. `PS11752778`
    #[serde(alias = "ps")]
    pub id: String,

    /// Manufacturer part number, e.g. `W10873791`
    #[serde(default, alias = "mfr")]
    pub manufacturer_id: Option<String>,

    pub brand: String,

    #[serde(alias = "type")]
    pub category: ApplianceCategory,

    /// Human name, only used to build slug-style candidate URLs
    #[serde(default, alias = "name")]
    pub name_hint: Option<String>,
}

impl PartIdentifier {
    pub fn new(id: impl Into<String>, brand: impl Into<String>, category: ApplianceCategory) -> Self {
        Self {
            id: id.into(),
            manufacturer_id: None,
            brand: brand.into(),
            category,
            name_hint: None,
        }
    }

    pub fn with_manufacturer_id(mut self, manufacturer_id: impl Into<String>) -> Self {
        self.manufacturer_id = Some(manufacturer_id.into());
        self
    }

    pub fn with_name_hint(mut self, name: impl Into<String>) -> Self {
        self.name_hint = Some(name.into());
        self
    }
}

/// Strictly positive price in cents.
///
/// A zero amount cannot be represented, so "price unknown" is always `None`
/// at the use site instead of a zero sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(NonZeroU64);

impl Price {
    pub fn from_cents(cents: u64) -> Option<Self> {
        NonZeroU64::new(cents).map(Self)
    }

    /// Parse a plain decimal amount such as `"1,249.5"` or `"49.99"`.
    ///
    /// Rounds to the nearest cent. Returns `None` for zero, negative or
    /// malformed input.
    pub fn parse_amount(raw: &str) -> Option<Self> {
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() || cleaned.starts_with('-') {
            return None;
        }

        let (whole, fraction) = match cleaned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (cleaned.as_str(), ""),
        };
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || (whole.is_empty() && fraction.is_empty())
        {
            return None;
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole.parse::<u64>().ok()?.checked_mul(100)?
        };

        let mut digits = fraction.bytes().map(|b| u64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = u64::from(digits.next().is_some_and(|d| d >= 5));

        let cents = whole_cents.checked_add(tenths * 10 + hundredths + round_up)?;
        Self::from_cents(cents)
    }

    pub fn cents(self) -> u64 {
        self.0.get()
    }

    pub fn as_f64(self) -> f64 {
        self.0.get() as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents() / 100, self.cents() % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(serde::de::Error::custom("price must be strictly positive"));
        }
        Self::from_cents((amount * 100.0).round() as u64)
            .ok_or_else(|| serde::de::Error::custom("price rounds to zero cents"))
    }
}

/// One installation step, numbered by its position in the extracted list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStep {
    pub number: u32,
    pub text: String,
}

/// A resolved part. Built once per successful fetch and never mutated after
/// assembly; enrichment produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub identifier: String,
    pub manufacturer_id: Option<String>,
    pub display_name: String,
    pub category: ApplianceCategory,
    pub brand: String,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub compatible_models: Vec<String>,
    pub symptoms_fixed: Vec<String>,
    pub install_steps: Vec<InstallStep>,
    pub source_url: String,
    pub image_url: String,
}

impl PartRecord {
    /// Image location is a pure function of the identifier
    pub fn image_url_for(base_url: &str, identifier: &str) -> String {
        format!("{}/images/part/{}.jpg", base_url.trim_end_matches('/'), identifier)
    }

    /// Steps rendered as `"1. ...\n2. ..."`
    pub fn install_instructions(&self) -> String {
        self.install_steps
            .iter()
            .map(|step| format!("{}. {}", step.number, step.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Names of optional fields that carry no value
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.display_name.is_empty() {
            missing.push("display_name");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if self.description.is_none() {
            missing.push("description");
        }
        if self.compatible_models.is_empty() {
            missing.push("compatible_models");
        }
        if self.symptoms_fixed.is_empty() {
            missing.push("symptoms_fixed");
        }
        if self.install_steps.is_empty() {
            missing.push("install_steps");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_parse_amount() {
        assert_eq!(Price::parse_amount("49.99").map(Price::cents), Some(4999));
        assert_eq!(Price::parse_amount("1,249.5").map(Price::cents), Some(124_950));
        assert_eq!(Price::parse_amount("12").map(Price::cents), Some(1200));
        assert_eq!(Price::parse_amount("0.005").map(Price::cents), Some(1));
        assert_eq!(Price::parse_amount("0"), None);
        assert_eq!(Price::parse_amount("0.00"), None);
        assert_eq!(Price::parse_amount("-3.00"), None);
        assert_eq!(Price::parse_amount("abc"), None);
        assert_eq!(Price::parse_amount("."), None);
    }

    #[test]
    fn test_price_serializes_as_number() {
        let price = Price::from_cents(4999).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "49.99");
        assert_eq!(price.to_string(), "49.99");

        let back: Price = serde_json::from_str("49.99").unwrap();
        assert_eq!(back, price);
        assert!(serde_json::from_str::<Price>("0").is_err());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(ApplianceCategory::from("Refrigerator"), ApplianceCategory::Refrigerator);
        assert_eq!(ApplianceCategory::from("dishwasher"), ApplianceCategory::Dishwasher);
        assert_eq!(
            ApplianceCategory::from("Range"),
            ApplianceCategory::Other("range".to_string())
        );
    }

    #[test]
    fn test_identifier_accepts_seed_aliases() {
        let raw = r#"{"ps": "PS11752778", "mfr": "W10873791", "name": "Ice Maker Assembly",
                      "type": "refrigerator", "brand": "Whirlpool"}"#;
        let id: PartIdentifier = serde_json::from_str(raw).unwrap();
        assert_eq!(id.id, "PS11752778");
        assert_eq!(id.manufacturer_id.as_deref(), Some("W10873791"));
        assert_eq!(id.name_hint.as_deref(), Some("Ice Maker Assembly"));
        assert_eq!(id.category, ApplianceCategory::Refrigerator);
    }

    #[test]
    fn test_install_instructions_rendering() {
        let record = PartRecord {
            identifier: "PS1".into(),
            manufacturer_id: None,
            display_name: String::new(),
            category: ApplianceCategory::Dishwasher,
            brand: "GE".into(),
            price: None,
            description: None,
            compatible_models: vec![],
            symptoms_fixed: vec![],
            install_steps: vec![
                InstallStep { number: 1, text: "Disconnect power".into() },
                InstallStep { number: 2, text: "Remove old part".into() },
            ],
            source_url: "https://example.test/PS1.htm".into(),
            image_url: PartRecord::image_url_for("https://example.test/", "PS1"),
        };

        assert_eq!(record.install_instructions(), "1. Disconnect power\n2. Remove old part");
        assert_eq!(record.image_url, "https://example.test/images/part/PS1.jpg");
        assert_eq!(
            record.missing_fields(),
            vec!["display_name", "price", "description", "compatible_models", "symptoms_fixed"]
        );
    }
}
