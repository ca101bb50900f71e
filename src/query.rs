use serde_json::{json, Value};

/// Fields requested for every organization.
pub const FIELD_IDS: &[&str] = &[
    "identifier",
    "operating_status",
    "founded_on",
    "ipo_status",
    "diversity_spotlights",
    "location_identifiers",
    "categories",
    "description",
    "last_funding_type",
    "investor_identifiers",
    "last_funding_at",
    "funding_total",
    "funding_stage",
    "investor_type",
    "last_equity_funding_type",
    "last_funding_total",
    "num_funding_rounds",
    "num_lead_investors",
    "num_investors",
    "semrush_visits_latest_month",
    "semrush_visits_latest_6_months_avg",
    "semrush_visits_mom_pct",
    "semrush_visit_duration",
    "semrush_visit_duration_mom_pct",
    "semrush_visit_pageviews",
    "semrush_visit_pageview_mom_pct",
    "semrush_bounce_rate",
    "semrush_bounce_rate_mom_pct",
    "semrush_global_rank",
    "semrush_global_rank_mom",
    "semrush_global_rank_mom_pct",
    "apptopia_total_apps",
    "apptopia_total_downloads",
    "num_founders",
    "founder_identifiers",
    "num_employees_enum",
    "investor_stage",
    "website",
    "linkedin",
    "num_articles",
    "hub_tags",
    "twitter",
    "facebook",
    "short_description",
    "contact_email",
    "last_key_employee_change_date",
    "last_layoff_date",
    "num_event_appearances",
    "rank_org_company",
    "num_contacts",
    "num_private_contacts",
    "builtwith_num_technologies_used",
    "siftery_num_products",
    "ipqwery_num_patent_granted",
    "ipqwery_num_trademark_registered",
    "private_tags",
    "num_private_notes",
];

const FOUNDED_SINCE: &str = "2020";
// North America and Europe.
const LOCATION_IDS: &[&str] = &[
    "b25caef9-a1b8-3a5d-6232-93b2dfb6a1d1",
    "6106f5dc-823e-5da8-40d7-51612c0b2c4e",
];
const FUNDING_STAGES: &[&str] = &["seed", "early_stage_venture", "late_stage_venture"];
const COLLECTION_ID: &str = "organization.companies";

/// Body of one search request: the fixed query, a page size and the cursor.
pub fn search_body(after_id: &str, limit: usize) -> Value {
    json!({
        "field_ids": FIELD_IDS,
        "order": [{ "field_id": "founded_on", "sort": "desc" }],
        "query": [
            {
                "type": "predicate",
                "field_id": "founded_on",
                "operator_id": "gte",
                "include_nulls": false,
                "values": [FOUNDED_SINCE]
            },
            {
                "type": "predicate",
                "field_id": "operating_status",
                "operator_id": "includes",
                "include_nulls": false
            },
            {
                "type": "predicate",
                "field_id": "location_identifiers",
                "operator_id": "includes",
                "values": LOCATION_IDS
            },
            {
                "type": "predicate",
                "field_id": "funding_stage",
                "operator_id": "includes",
                "values": FUNDING_STAGES
            }
        ],
        "field_aggregators": [],
        "collection_id": COLLECTION_ID,
        "limit": limit,
        "after_id": after_id,
    })
}
