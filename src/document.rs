use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::raw::{Category, Person};

/// Canonical organization record, one per API entity, keyed by `uuid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDocument {
    pub uuid: String,
    /// When the record was normalized, not when the API last changed it.
    pub timestamp: DateTime<Utc>,
    pub entity_def_id: String,
    pub organization_name: String,
    pub description: String,
    pub short_description: String,
    pub funding_stage: String,
    pub founded_on: Option<NaiveDate>,
    pub operating_status: String,
    pub website: String,
    pub linkedin: String,
    pub facebook: String,
    #[serde(default)]
    pub twitter: String,
    pub industries: Vec<Category>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contact_email: String,
    pub num_founders: i64,
    #[serde(rename = "num_employees_enum")]
    pub num_employees: String,
    pub founder_identifiers: Vec<Person>,
    pub num_of_tech_used: i64,
    pub num_articles: i64,
    pub num_trademark_reg: i64,
    pub num_patent_grant: i64,
    pub sem_rush: SemRush,
    pub num_investors: i64,
    pub funding_total: i64,
    pub num_funding_rounds: i64,
    pub last_equity_funding_type: String,
    pub last_funding_type: String,
    pub last_funding_total: i64,
    pub last_funding_at: Option<NaiveDate>,
    pub investor_identifiers: Vec<Person>,
}

/// Web traffic figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemRush {
    #[serde(rename = "sr_visits_latest_month")]
    pub visits_last_month: i64,
    #[serde(rename = "sr_visit_duration")]
    pub visit_duration: i64,
    #[serde(rename = "sr_bounce_rate")]
    pub bounce_rate: f64,
    #[serde(rename = "sr_visit_pageviews")]
    pub pageviews_per_visit: f64,
}
