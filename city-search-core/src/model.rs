use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::CoordinatesError;

/// One entry of the dropdown list.
///
/// `value` holds `"<latitude> <longitude>"`, `label` holds `"<name>, <countryCode>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectableOption {
    pub value: String,
    pub label: String,
}

impl SelectableOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }

    pub fn from_city(
        latitude: impl Display,
        longitude: impl Display,
        name: &str,
        country_code: &str,
    ) -> Self {
        Self {
            value: format!("{latitude} {longitude}"),
            label: format!("{name}, {country_code}"),
        }
    }

    /// Parse `value` back into a coordinate pair.
    pub fn coordinates(&self) -> Result<Coordinates, CoordinatesError> {
        let mut parts = self.value.split_whitespace();

        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoordinatesError::Shape(self.value.clone()));
        };

        let parse = |raw: &str| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CoordinatesError::NotANumber(raw.to_string()))
        };

        Ok(Coordinates { latitude: parse(lat)?, longitude: parse(lon)? })
    }
}

impl Display for SelectableOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single, complete batch of options. There is never a continuation cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPage {
    pub options: Vec<SelectableOption>,
}

impl OptionPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectableOption> {
        self.options.iter()
    }
}

impl FromIterator<SelectableOption> for OptionPage {
    fn from_iter<I: IntoIterator<Item = SelectableOption>>(iter: I) -> Self {
        Self { options: iter.into_iter().collect() }
    }
}

impl IntoIterator for OptionPage {
    type Item = SelectableOption;
    type IntoIter = std::vec::IntoIter<SelectableOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.into_iter()
    }
}
