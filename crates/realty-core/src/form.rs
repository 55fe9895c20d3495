//! Property form inputs for create and update requests.
//!
//! Clients send the same logical field in several encodings: multipart text
//! parts, repeated multipart parts, or JSON values of varying types. Each
//! encoding is captured by a small untagged enum ([`ListInput`],
//! [`FlagInput`], [`NumberInput`]) so a [`PropertyForm`] is validated once
//! at the boundary.
//!
//! Update merge policy (see [`PropertyForm::merge_into`]):
//!
//! - absent fields keep their stored value
//! - list fields accept a JSON list string, a comma-delimited string, or a
//!   native list; an unparsable list keeps the stored value
//! - flags accept booleans or the strings `"true"`/`"false"`; anything else
//!   keeps the stored value
//! - numbers are parsed only when present; malformed or negative numbers are
//!   rejected

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Address, PropertyFields, PropertyType};
use crate::search::split_delimited;

// =============================================================================
// FIELD ENCODINGS
// =============================================================================

/// A list-valued field as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    /// Native list (JSON array or repeated multipart part).
    List(Vec<String>),
    /// JSON-encoded list string or comma-delimited string.
    Text(String),
    /// Any other JSON value, e.g. a list with non-string elements.
    Other(serde_json::Value),
}

/// Outcome of parsing a [`ListInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListParse {
    Items(Vec<String>),
    Empty,
    /// Input could not be read as a list; callers fall back to the stored value.
    Invalid(String),
}

impl ListParse {
    /// Resolve against the stored value for update requests.
    pub fn or_previous(self, field: &str, previous: &[String]) -> Vec<String> {
        match self {
            ListParse::Items(items) => items,
            ListParse::Empty => Vec::new(),
            ListParse::Invalid(reason) => {
                warn!(
                    subsystem = "api",
                    component = "property_form",
                    field,
                    reason = %reason,
                    "Unparsable list field, keeping stored value"
                );
                previous.to_vec()
            }
        }
    }

    /// Resolve for create requests, where there is nothing to fall back to.
    pub fn required(self, field: &str) -> Result<Vec<String>> {
        match self {
            ListParse::Items(items) => Ok(items),
            ListParse::Empty => Ok(Vec::new()),
            ListParse::Invalid(reason) => Err(Error::InvalidInput(format!(
                "{} is not a valid list: {}",
                field, reason
            ))),
        }
    }
}

fn normalize_items<I, S>(items: I) -> ListParse
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        ListParse::Empty
    } else {
        ListParse::Items(items)
    }
}

/// Parse any of the three list encodings into a normalized list.
///
/// `["WiFi","Pool"]`, `"WiFi,Pool"` and `List(["WiFi", "Pool"])` all yield
/// `Items(["WiFi", "Pool"])`.
pub fn parse_list_field(input: &ListInput) -> ListParse {
    match input {
        ListInput::List(items) => normalize_items(items),
        ListInput::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(value) => parse_json_list(&value),
                    Err(e) => ListParse::Invalid(e.to_string()),
                }
            } else {
                normalize_items(split_delimited(trimmed))
            }
        }
        ListInput::Other(value) => parse_json_list(value),
    }
}

fn parse_json_list(value: &serde_json::Value) -> ListParse {
    let serde_json::Value::Array(values) = value else {
        return ListParse::Invalid(format!("expected a list, got {}", value));
    };
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        match value {
            serde_json::Value::String(s) => items.push(s.as_str()),
            other => return ListParse::Invalid(format!("non-string list element {}", other)),
        }
    }
    normalize_items(items)
}

/// A boolean-like field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Bool(bool),
    Text(String),
    Other(serde_json::Value),
}

/// `Some` only for real booleans and the exact literals `"true"`/`"false"`;
/// numbers, nulls and objects are `None`.
pub fn parse_flag(input: &FlagInput) -> Option<bool> {
    match input {
        FlagInput::Bool(b) => Some(*b),
        FlagInput::Text(s) if s == "true" => Some(true),
        FlagInput::Text(s) if s == "false" => Some(false),
        FlagInput::Text(_) | FlagInput::Other(_) => None,
    }
}

/// A numeric field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

/// Parse a non-negative number. Blank text counts as absent.
pub fn parse_number(field: &str, input: &NumberInput) -> Result<Option<f64>> {
    let value = match input {
        NumberInput::Number(n) => *n,
        NumberInput::Text(s) if s.trim().is_empty() => return Ok(None),
        NumberInput::Text(s) => s.trim().parse::<f64>().map_err(|_| {
            Error::InvalidInput(format!("{} must be a number, got '{}'", field, s))
        })?,
    };
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidInput(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(Some(value))
}

/// Parse a non-negative whole number.
pub fn parse_count(field: &str, input: &NumberInput) -> Result<Option<i32>> {
    match parse_number(field, input)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && n <= i32::MAX as f64 => Ok(Some(n as i32)),
        Some(_) => Err(Error::InvalidInput(format!(
            "{} must be a whole number",
            field
        ))),
    }
}

// =============================================================================
// PROPERTY FORM
// =============================================================================

/// Create/update payload for a property. Every field is optional at the wire
/// level; [`PropertyForm::into_new`] enforces what creation requires.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_per_month: Option<NumberInput>,
    pub security_deposit: Option<NumberInput>,
    pub application_fee: Option<NumberInput>,
    pub beds: Option<NumberInput>,
    pub baths: Option<NumberInput>,
    pub square_feet: Option<NumberInput>,
    pub is_pets_allowed: Option<FlagInput>,
    pub is_parking_included: Option<FlagInput>,
    pub amenities: Option<ListInput>,
    pub highlights: Option<ListInput>,
    pub images: Option<ListInput>,
    pub property_type: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub manager_cognito_id: Option<String>,
}

const LIST_FIELDS: [&str; 3] = ["amenities", "highlights", "images"];

impl PropertyForm {
    /// Build a form from multipart text parts.
    ///
    /// List fields sent more than once (or as `name[]`) become native lists;
    /// a single part stays text and goes through the string encodings. Unknown
    /// fields are ignored.
    pub fn from_text_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = PropertyForm::default();
        let mut lists: Vec<(&'static str, Vec<String>, bool)> = LIST_FIELDS
            .iter()
            .map(|name| (*name, Vec::new(), false))
            .collect();

        for (name, value) in fields {
            let (key, bracketed) = match name.strip_suffix("[]") {
                Some(base) => (base.to_string(), true),
                None => (name, false),
            };
            if let Some(entry) = lists.iter_mut().find(|(n, _, _)| *n == key) {
                entry.1.push(value);
                entry.2 |= bracketed;
                continue;
            }
            match key.as_str() {
                "name" => form.name = Some(value),
                "description" => form.description = Some(value),
                "pricePerMonth" => form.price_per_month = Some(NumberInput::Text(value)),
                "securityDeposit" => form.security_deposit = Some(NumberInput::Text(value)),
                "applicationFee" => form.application_fee = Some(NumberInput::Text(value)),
                "beds" => form.beds = Some(NumberInput::Text(value)),
                "baths" => form.baths = Some(NumberInput::Text(value)),
                "squareFeet" => form.square_feet = Some(NumberInput::Text(value)),
                "isPetsAllowed" => form.is_pets_allowed = Some(FlagInput::Text(value)),
                "isParkingIncluded" => form.is_parking_included = Some(FlagInput::Text(value)),
                "propertyType" => form.property_type = Some(value),
                "address" => form.address = Some(value),
                "city" => form.city = Some(value),
                "state" => form.state = Some(value),
                "country" => form.country = Some(value),
                "postalCode" => form.postal_code = Some(value),
                "managerCognitoId" => form.manager_cognito_id = Some(value),
                _ => {}
            }
        }

        for (name, mut values, bracketed) in lists {
            let input = match values.len() {
                0 => continue,
                1 if !bracketed => ListInput::Text(values.remove(0)),
                _ => ListInput::List(values),
            };
            match name {
                "amenities" => form.amenities = Some(input),
                "highlights" => form.highlights = Some(input),
                _ => form.images = Some(input),
            }
        }
        form
    }

    /// The address, when all five components are present.
    pub fn address(&self) -> Option<Address> {
        Address::from_parts(
            self.address.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.country.as_deref(),
            self.postal_code.as_deref(),
        )
    }

    fn property_type(&self) -> Result<Option<PropertyType>> {
        self.property_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<PropertyType>().map_err(Error::InvalidInput))
            .transpose()
    }

    /// Validate a create request into an address and property fields.
    ///
    /// Photo URLs are filled in by the caller after uploads complete.
    pub fn into_new(self) -> Result<(Address, PropertyFields)> {
        let address = self.address().ok_or_else(|| {
            Error::InvalidInput(
                "address, city, state, country and postalCode are required".to_string(),
            )
        })?;
        let property_type = self.property_type()?.unwrap_or_default();

        let number = |field: &str, input: &Option<NumberInput>| -> Result<f64> {
            input
                .as_ref()
                .map(|i| parse_number(field, i))
                .transpose()?
                .flatten()
                .ok_or_else(|| Error::InvalidInput(format!("{} is required", field)))
        };
        let count = |field: &str, input: &Option<NumberInput>| -> Result<i32> {
            input
                .as_ref()
                .map(|i| parse_count(field, i))
                .transpose()?
                .flatten()
                .ok_or_else(|| Error::InvalidInput(format!("{} is required", field)))
        };
        let list = |field: &str, input: &Option<ListInput>| -> Result<Vec<String>> {
            match input {
                Some(i) => parse_list_field(i).required(field),
                None => Ok(Vec::new()),
            }
        };
        let flag = |input: &Option<FlagInput>| input.as_ref().and_then(parse_flag) == Some(true);

        let fields = PropertyFields {
            name: required_text("name", &self.name)?,
            description: required_text("description", &self.description)?,
            price_per_month: number("pricePerMonth", &self.price_per_month)?,
            security_deposit: number("securityDeposit", &self.security_deposit)?,
            application_fee: number("applicationFee", &self.application_fee)?,
            photo_urls: Vec::new(),
            images: list("images", &self.images)?,
            amenities: list("amenities", &self.amenities)?,
            highlights: list("highlights", &self.highlights)?,
            is_pets_allowed: flag(&self.is_pets_allowed),
            is_parking_included: flag(&self.is_parking_included),
            beds: count("beds", &self.beds)?,
            baths: number("baths", &self.baths)?,
            square_feet: count("squareFeet", &self.square_feet)?,
            property_type,
        };
        Ok((address, fields))
    }

    /// Merge an update request over the stored fields.
    ///
    /// Photo URLs are left untouched; uploads are appended by the caller.
    pub fn merge_into(&self, current: &PropertyFields) -> Result<PropertyFields> {
        let text = |input: &Option<String>, previous: &str| {
            input
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| previous.to_string())
        };
        let number = |field: &str, input: &Option<NumberInput>, previous: f64| -> Result<f64> {
            Ok(match input {
                Some(i) => parse_number(field, i)?.unwrap_or(previous),
                None => previous,
            })
        };
        let count = |field: &str, input: &Option<NumberInput>, previous: i32| -> Result<i32> {
            Ok(match input {
                Some(i) => parse_count(field, i)?.unwrap_or(previous),
                None => previous,
            })
        };
        let list = |field: &str, input: &Option<ListInput>, previous: &[String]| match input {
            Some(i) => parse_list_field(i).or_previous(field, previous),
            None => previous.to_vec(),
        };
        let flag = |input: &Option<FlagInput>, previous: bool| {
            input.as_ref().and_then(parse_flag).unwrap_or(previous)
        };

        Ok(PropertyFields {
            name: text(&self.name, &current.name),
            description: text(&self.description, &current.description),
            price_per_month: number(
                "pricePerMonth",
                &self.price_per_month,
                current.price_per_month,
            )?,
            security_deposit: number(
                "securityDeposit",
                &self.security_deposit,
                current.security_deposit,
            )?,
            application_fee: number(
                "applicationFee",
                &self.application_fee,
                current.application_fee,
            )?,
            photo_urls: current.photo_urls.clone(),
            images: list("images", &self.images, &current.images),
            amenities: list("amenities", &self.amenities, &current.amenities),
            highlights: list("highlights", &self.highlights, &current.highlights),
            is_pets_allowed: flag(&self.is_pets_allowed, current.is_pets_allowed),
            is_parking_included: flag(&self.is_parking_included, current.is_parking_included),
            beds: count("beds", &self.beds, current.beds)?,
            baths: number("baths", &self.baths, current.baths)?,
            square_feet: count("squareFeet", &self.square_feet, current.square_feet)?,
            property_type: self.property_type()?.unwrap_or(current.property_type),
        })
    }
}

fn required_text(field: &str, value: &Option<String>) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("{} is required", field)))
}
