use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::document::{OrganizationDocument, SemRush};
use crate::error::ParseError;
use crate::raw::{Location, Money, RawEntity};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Employee-count buckets the API encodes as `c_<low>_<high>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeRange {
    UpTo10,
    UpTo50,
    UpTo100,
    UpTo250,
    UpTo500,
    UpTo1000,
    UpTo5000,
    UpTo10000,
    Over10000,
}

const EMPLOYEE_RANGES: [(&str, EmployeeRange); 9] = [
    ("c_00001_00010", EmployeeRange::UpTo10),
    ("c_00011_00050", EmployeeRange::UpTo50),
    ("c_00051_00100", EmployeeRange::UpTo100),
    ("c_00101_00250", EmployeeRange::UpTo250),
    ("c_00251_00500", EmployeeRange::UpTo500),
    ("c_00501_01000", EmployeeRange::UpTo1000),
    ("c_01001_05000", EmployeeRange::UpTo5000),
    ("c_05001_10000", EmployeeRange::UpTo10000),
    ("c_10001_max", EmployeeRange::Over10000),
];

impl EmployeeRange {
    pub fn from_code(code: &str) -> Option<Self> {
        EMPLOYEE_RANGES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, range)| *range)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo10 => "1-10",
            Self::UpTo50 => "11-50",
            Self::UpTo100 => "51-100",
            Self::UpTo250 => "101-250",
            Self::UpTo500 => "251-500",
            Self::UpTo1000 => "501-1000",
            Self::UpTo5000 => "1001-5000",
            Self::UpTo10000 => "5001-10000",
            Self::Over10000 => "10001+",
        }
    }
}

/// Human label for an employee code; unknown codes give `""`.
pub fn employee_label(code: &str) -> &'static str {
    EmployeeRange::from_code(code).map_or("", EmployeeRange::label)
}

/// Normalize one untyped entity from a search page, stamped with the current time.
pub fn parse(entity: &Value) -> Result<OrganizationDocument, ParseError> {
    let raw = RawEntity::deserialize(entity)?;
    normalize(&raw, Utc::now())
}

/// Normalize a typed entity. Pure apart from `stamped_at`.
pub fn normalize(raw: &RawEntity, stamped_at: DateTime<Utc>) -> Result<OrganizationDocument, ParseError> {
    if raw.uuid.is_empty() {
        return Err(ParseError::MissingUuid);
    }
    let p = &raw.properties;

    Ok(OrganizationDocument {
        uuid: raw.uuid.clone(),
        timestamp: stamped_at,
        entity_def_id: owned(p.entity_def_id()),
        organization_name: owned(p.name()),
        description: owned(p.description.as_deref()),
        short_description: owned(p.short_description.as_deref()),
        funding_stage: owned(p.funding_stage.as_deref()),
        founded_on: strict_date("founded_on", p.founded_on())?,
        operating_status: owned(p.operating_status.as_deref()),
        website: owned(p.website()),
        linkedin: owned(p.linkedin()),
        facebook: owned(p.facebook()),
        twitter: owned(p.twitter()),
        industries: p.categories.clone(),
        city: select_location(&p.locations, "city"),
        country: select_location(&p.locations, "country"),
        contact_email: owned(p.contact_email.as_deref()),
        num_founders: p.num_founders.unwrap_or_default(),
        num_employees: employee_label(p.num_employees_enum.as_deref().unwrap_or_default()).to_string(),
        founder_identifiers: p.founder_identifiers.clone(),
        num_of_tech_used: p.num_technologies_used.unwrap_or_default(),
        num_articles: p.num_articles.unwrap_or_default(),
        num_trademark_reg: p.num_trademarks_registered.unwrap_or_default(),
        num_patent_grant: p.num_patents_granted.unwrap_or_default(),
        sem_rush: SemRush {
            visits_last_month: p.semrush_visits_latest_month.unwrap_or_default(),
            visit_duration: p.semrush_visit_duration.unwrap_or_default(),
            bounce_rate: p.semrush_bounce_rate.unwrap_or_default(),
            pageviews_per_visit: p.semrush_visit_pageviews.unwrap_or_default(),
        },
        num_investors: p.num_investors.unwrap_or_default(),
        funding_total: usd(&p.funding_total),
        num_funding_rounds: p.num_funding_rounds.unwrap_or_default(),
        last_equity_funding_type: owned(p.last_equity_funding_type.as_deref()),
        last_funding_type: owned(p.last_funding_type.as_deref()),
        last_funding_total: usd(&p.last_funding_total),
        last_funding_at: strict_date("last_funding_at", p.last_funding_at.as_deref())?,
        investor_identifiers: p.investor_identifiers.clone(),
    })
}

/// First location of the given type, if any.
pub fn select_location(locations: &[Location], location_type: &str) -> Option<String> {
    locations
        .iter()
        .find(|l| l.location_type == location_type)
        .map(|l| l.name.clone())
}

/// Exactly `YYYY-MM-DD`. Absent or blank is `None`.
fn strict_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ParseError> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        // chrono accepts unpadded fields; reject anything that does not round-trip
        .filter(|d| d.format(DATE_FORMAT).to_string() == value)
        .map(Some)
        .ok_or_else(|| ParseError::Date {
            field,
            value: value.to_string(),
        })
}

fn owned(v: Option<&str>) -> String {
    v.unwrap_or_default().to_string()
}

fn usd(m: &Option<Money>) -> i64 {
    m.as_ref().and_then(|m| m.value_usd).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::raw::{Category, Page, Person};

    fn fixture_page() -> Page {
        let raw = std::fs::read_to_string("tests/fixtures/two_organizations.json").unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn full_record_matches_expected_document() {
        let page = fixture_page();
        let raw = RawEntity::deserialize(&page.entities[0]).unwrap();
        let doc = normalize(&raw, fixed_time()).unwrap();

        let expected = OrganizationDocument {
            uuid: "1a".into(),
            timestamp: fixed_time(),
            entity_def_id: "organization".into(),
            organization_name: "Blub.ai".into(),
            description: "long - blub1 does blub2".into(),
            short_description: "short - blub1 does blub2".into(),
            funding_stage: "seed".into(),
            founded_on: NaiveDate::from_ymd_opt(2022, 8, 3),
            operating_status: "active".into(),
            website: "www.blub1.ch".into(),
            linkedin: "https://www.linkedin.com/company/blub/".into(),
            facebook: "https://www.facebook.com/company/blub/".into(),
            twitter: String::new(),
            industries: vec![
                Category {
                    uuid: "2a".into(),
                    entity_def_id: "category".into(),
                    name: "Machine Learning".into(),
                },
                Category {
                    uuid: "2b".into(),
                    entity_def_id: "category".into(),
                    name: "Online Grocery".into(),
                },
            ],
            city: Some("Basel".into()),
            country: Some("Switzerland".into()),
            contact_email: "hello@blub.ch".into(),
            num_founders: 2,
            num_employees: "1-10".into(),
            founder_identifiers: vec![
                Person {
                    uuid: "1a".into(),
                    entity_def_id: "person".into(),
                    permalink: "linus-torvald".into(),
                    name: "Linus Torvald".into(),
                },
                Person {
                    uuid: "2a".into(),
                    entity_def_id: "person".into(),
                    permalink: "james-bond".into(),
                    name: "James Bond".into(),
                },
            ],
            num_of_tech_used: 3,
            num_articles: 4,
            num_trademark_reg: 1,
            num_patent_grant: 2,
            sem_rush: SemRush {
                visits_last_month: 69,
                visit_duration: 420,
                bounce_rate: 1.2,
                pageviews_per_visit: 1.4,
            },
            num_investors: 1,
            funding_total: 1000,
            num_funding_rounds: 1,
            last_equity_funding_type: "seed".into(),
            last_funding_type: "seed".into(),
            last_funding_total: 1000,
            last_funding_at: NaiveDate::from_ymd_opt(2022, 1, 21),
            investor_identifiers: raw.properties.investor_identifiers.clone(),
        };
        assert_eq!(doc, expected);
        assert_eq!(doc.investor_identifiers[1].name, "Steve Jobs");
    }

    #[test]
    fn deterministic_apart_from_timestamp() {
        let page = fixture_page();
        let mut a = parse(&page.entities[1]).unwrap();
        let b = parse(&page.entities[1]).unwrap();
        a.timestamp = b.timestamp;
        assert_eq!(a, b);
    }

    #[test]
    fn two_entity_page_decodes() {
        let page = fixture_page();
        assert_eq!(page.count, 2);
        let docs: Vec<_> = page.entities.iter().map(|e| parse(e).unwrap()).collect();
        assert_eq!(docs.len(), 2);
        for doc in &docs {
            assert_eq!(doc.num_employees, "1-10");
            assert_eq!(doc.city.as_deref(), Some("Basel"));
            assert_eq!(doc.country.as_deref(), Some("Switzerland"));
            assert_eq!(doc.industries.len(), 2);
            assert_eq!(doc.founded_on, NaiveDate::from_ymd_opt(2022, 8, 3));
        }
        assert_eq!(docs[1].uuid, "2a");
    }

    #[test]
    fn timestamp_is_wall_clock() {
        let before = Utc::now();
        let doc = parse(&json!({"uuid": "x"})).unwrap();
        assert!(doc.timestamp >= before && doc.timestamp <= Utc::now());
    }

    #[test]
    fn employee_table() {
        assert_eq!(employee_label("c_00001_00010"), "1-10");
        assert_eq!(employee_label("c_00501_01000"), "501-1000");
        assert_eq!(employee_label("c_10001_max"), "10001+");
        for (code, range) in EMPLOYEE_RANGES {
            assert_eq!(employee_label(code), range.label());
            assert_eq!(employee_label(code), employee_label(code));
        }
    }

    #[test]
    fn unknown_employee_code_is_empty_label() {
        for code in ["", "c_99999_max", "C_00001_00010", "1-10"] {
            assert_eq!(employee_label(code), "");
        }
        let doc = parse(&json!({
            "uuid": "x",
            "properties": {"num_employees_enum": "c_bogus"}
        }))
        .unwrap();
        assert_eq!(doc.num_employees, "");
    }

    #[test]
    fn missing_city_or_country_is_none() {
        let doc = parse(&json!({
            "uuid": "x",
            "properties": {
                "location_identifiers": [
                    {"uuid": "r", "location_type": "region", "value": "Bavaria"},
                    {"uuid": "c", "location_type": "country", "value": "Germany"}
                ]
            }
        }))
        .unwrap();
        assert_eq!(doc.city, None);
        assert_eq!(doc.country.as_deref(), Some("Germany"));

        let bare = parse(&json!({"uuid": "y", "properties": {}})).unwrap();
        assert_eq!(bare.city, None);
        assert_eq!(bare.country, None);
    }

    #[test]
    fn first_matching_location_wins() {
        let locations = vec![
            Location {
                uuid: "1".into(),
                location_type: "city".into(),
                name: "Zurich".into(),
            },
            Location {
                uuid: "2".into(),
                location_type: "city".into(),
                name: "Winterthur".into(),
            },
        ];
        assert_eq!(select_location(&locations, "city").as_deref(), Some("Zurich"));
        assert_eq!(select_location(&locations, "country"), None);
    }

    #[test]
    fn malformed_dates_rejected() {
        for bad in ["2022-8-3", "03.08.2022", "2022-02-30", "2022", "2022-08-03T00:00:00Z", " 2022-08-03 ", "2022-08-03\n"] {
            let err = parse(&json!({
                "uuid": "x",
                "properties": {"founded_on": {"value": bad, "precision": "day"}}
            }))
            .unwrap_err();
            assert!(
                matches!(err, ParseError::Date { field: "founded_on", .. }),
                "{} should be rejected",
                bad
            );
        }

        let err = parse(&json!({"uuid": "x", "properties": {"last_funding_at": "Jan 2022"}})).unwrap_err();
        assert!(matches!(err, ParseError::Date { field: "last_funding_at", .. }));
    }

    #[test]
    fn absent_dates_are_none() {
        let doc = parse(&json!({"uuid": "x", "properties": {"founded_on": {"precision": "year"}}})).unwrap();
        assert_eq!(doc.founded_on, None);

        let blank = parse(&json!({"uuid": "x", "properties": {"last_funding_at": "  "}})).unwrap();
        assert_eq!(blank.last_funding_at, None);
        assert_eq!(doc.last_funding_at, None);
    }

    #[test]
    fn bad_shape_and_missing_uuid() {
        assert!(matches!(parse(&json!(42)), Err(ParseError::Shape(_))));
        assert!(matches!(
            parse(&json!({"uuid": "x", "properties": {"num_founders": "two"}})),
            Err(ParseError::Shape(_))
        ));
        assert!(matches!(parse(&json!({"properties": {}})), Err(ParseError::MissingUuid)));
    }

    #[test]
    fn output_uses_document_field_names() {
        let page = fixture_page();
        let doc = normalize(&RawEntity::deserialize(&page.entities[0]).unwrap(), fixed_time()).unwrap();
        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["organizationName"], "Blub.ai");
        assert_eq!(out["num_employees_enum"], "1-10");
        assert_eq!(out["foundedOn"], "2022-08-03");
        assert_eq!(out["semRush"]["sr_visit_duration"], 420);
        assert_eq!(out["industries"][0]["value"], "Machine Learning");
        assert_eq!(out["founderIdentifiers"][1]["permalink"], "james-bond");
    }
}
