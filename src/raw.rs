//! Shapes of the search response as the API sends them.
//!
//! Almost everything is optional: the API omits fields it has no data for and
//! wraps many scalars in small `{"value": ..}` maps.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One search response. Entities stay untyped so a bad record fails alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<Value>,
}

impl Page {
    /// Identifier of an untyped entity, if it carries one.
    pub fn entity_uuid(entity: &Value) -> Option<&str> {
        entity.get("uuid").and_then(Value::as_str).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Properties,
}

/// `{"value": "2022-08-03", "precision": "day"}`; only the value is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateValue {
    pub value: Option<String>,
}

/// `{"value": "https://..."}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextValue {
    pub value: Option<String>,
}

/// `{"uuid": .., "value": "Name", "entity_def_id": "organization", "permalink": ..}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentifierValue {
    pub value: Option<String>,
    pub entity_def_id: Option<String>,
}

/// `{"value": 1000, "currency": "USD", "value_usd": 1000}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Money {
    pub value_usd: Option<i64>,
}

/// Founder or investor reference. Passed through to the output as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub uuid: String,
    pub entity_def_id: String,
    pub permalink: String,
    #[serde(rename = "value")]
    pub name: String,
}

/// Industry reference. Passed through to the output as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub uuid: String,
    pub entity_def_id: String,
    #[serde(rename = "value")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub uuid: String,
    pub location_type: String,
    #[serde(rename = "value")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Properties {
    pub identifier: Option<IdentifierValue>,
    pub founded_on: Option<DateValue>,
    pub website: Option<TextValue>,
    pub linkedin: Option<TextValue>,
    pub facebook: Option<TextValue>,
    pub twitter: Option<TextValue>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub operating_status: Option<String>,
    pub num_employees_enum: Option<String>,
    pub funding_stage: Option<String>,
    pub contact_email: Option<String>,
    pub num_founders: Option<i64>,
    pub num_investors: Option<i64>,
    pub num_funding_rounds: Option<i64>,
    pub num_articles: Option<i64>,
    pub funding_total: Option<Money>,
    pub last_funding_total: Option<Money>,
    pub last_funding_type: Option<String>,
    pub last_equity_funding_type: Option<String>,
    pub last_funding_at: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub founder_identifiers: Vec<Person>,
    #[serde(deserialize_with = "null_as_default")]
    pub investor_identifiers: Vec<Person>,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<Category>,
    #[serde(rename = "location_identifiers", deserialize_with = "null_as_default")]
    pub locations: Vec<Location>,
    #[serde(rename = "ipqwery_num_trademark_registered")]
    pub num_trademarks_registered: Option<i64>,
    #[serde(rename = "ipqwery_num_patent_granted")]
    pub num_patents_granted: Option<i64>,
    #[serde(rename = "builtwith_num_technologies_used")]
    pub num_technologies_used: Option<i64>,
    pub semrush_visits_latest_month: Option<i64>,
    pub semrush_visit_duration: Option<i64>,
    pub semrush_visit_pageviews: Option<f64>,
    pub semrush_bounce_rate: Option<f64>,
}

impl Properties {
    pub fn name(&self) -> Option<&str> {
        self.identifier.as_ref()?.value.as_deref()
    }

    pub fn entity_def_id(&self) -> Option<&str> {
        self.identifier.as_ref()?.entity_def_id.as_deref()
    }

    pub fn founded_on(&self) -> Option<&str> {
        self.founded_on.as_ref()?.value.as_deref()
    }

    pub fn website(&self) -> Option<&str> {
        text(&self.website)
    }

    pub fn linkedin(&self) -> Option<&str> {
        text(&self.linkedin)
    }

    pub fn facebook(&self) -> Option<&str> {
        text(&self.facebook)
    }

    pub fn twitter(&self) -> Option<&str> {
        text(&self.twitter)
    }
}

fn text(v: &Option<TextValue>) -> Option<&str> {
    v.as_ref()?.value.as_deref()
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
