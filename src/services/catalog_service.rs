use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::vacancy::Vacancy;
use crate::utils::delimited;

pub const UNTITLED_ROLE: &str = "Untitled role";
pub const DEFAULT_JOB_TYPE: &str = "Full-time";

/// Source format of an organizer's import file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// JSON when the content type or file name says so, CSV otherwise.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Self {
        let json_type = content_type.is_some_and(|ct| ct.contains("json"));
        if json_type || filename.to_ascii_lowercase().ends_with(".json") {
            Self::Json
        } else {
            Self::Csv
        }
    }
}

fn text(raw: &Map<String, JsonValue>, key: &str) -> String {
    match raw.get(key) {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn list(raw: &Map<String, JsonValue>, key: &str, split: fn(&str) -> Vec<String>) -> Vec<String> {
    match raw.get(key) {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(JsonValue::String(s)) => split(s),
        _ => Vec::new(),
    }
}

pub fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits on either `;` or a line break.
pub fn split_lines(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Coerces a loosely-typed vacancy into the canonical shape. Never fails:
/// anything unusable falls back to its default.
pub fn normalize(raw: &JsonValue) -> Vacancy {
    let empty = Map::new();
    let raw = raw.as_object().unwrap_or(&empty);

    let id = text(raw, "id");
    let title = text(raw, "title");
    let job_type = text(raw, "type");
    let apply_link = match text(raw, "applyLink") {
        link if link.is_empty() => text(raw, "apply_link"),
        link => link,
    };

    Vacancy {
        id: if id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            id
        },
        title: if title.is_empty() {
            UNTITLED_ROLE.to_string()
        } else {
            title
        },
        company: text(raw, "company"),
        location: text(raw, "location"),
        job_type: if job_type.is_empty() {
            DEFAULT_JOB_TYPE.to_string()
        } else {
            job_type
        },
        tags: list(raw, "tags", split_tags),
        description: match raw.get("description") {
            Some(JsonValue::String(s)) => s.clone(),
            _ => String::new(),
        },
        responsibilities: list(raw, "responsibilities", split_lines),
        requirements: list(raw, "requirements", split_lines),
        apply_link: Some(apply_link).filter(|l| !l.is_empty()),
    }
}

pub fn normalize_row(row: &delimited::Row) -> Vacancy {
    let object: Map<String, JsonValue> = row
        .iter()
        .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
        .collect();
    normalize(&JsonValue::Object(object))
}

/// Parses a whole import file. Either every item is accepted or the import fails.
pub fn import_vacancies(text: &str, format: ImportFormat) -> Result<Vec<Vacancy>> {
    let vacancies: Vec<Vacancy> = match format {
        ImportFormat::Json => {
            let parsed: JsonValue = serde_json::from_str(text).map_err(|e| {
                tracing::warn!(error = %e, "Rejected vacancy import");
                Error::Parse("Could not import the file. Please check format.".into())
            })?;
            let items = match parsed {
                JsonValue::Array(items) => items,
                JsonValue::Object(mut obj) => match obj.remove("jobs") {
                    Some(JsonValue::Array(items)) => items,
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            items.iter().map(normalize).collect()
        }
        ImportFormat::Csv => delimited::parse(text).iter().map(normalize_row).collect(),
    };

    if vacancies.is_empty() {
        return Err(Error::Parse("No valid jobs found in file.".into()));
    }
    tracing::info!(count = vacancies.len(), "Imported vacancies");
    Ok(vacancies)
}

/// Fetches a published CSV (e.g. a sheet shared as CSV) and normalizes its rows.
pub async fn load_from_sheet(client: &Client, url: &str) -> Result<Vec<Vacancy>> {
    let fetch = async {
        let resp = client.get(url).send().await?.error_for_status()?;
        resp.text().await
    };
    let text = fetch.await.map_err(|e| {
        tracing::warn!(url, error = %e, "Failed to fetch vacancy sheet");
        Error::Parse("Failed to load from the provided URL. Make sure it is a public CSV.".into())
    })?;

    let vacancies: Vec<Vacancy> = delimited::parse(&text).iter().map(normalize_row).collect();
    if vacancies.is_empty() {
        return Err(Error::Parse("No valid rows found.".into()));
    }
    Ok(vacancies)
}

/// Pretty JSON of the catalog with its suggested download name.
pub fn export_json(vacancies: &[Vacancy], today: DateTime<Utc>) -> Result<(String, String)> {
    let filename = format!(
        "job-fair-vacancies-{}.json",
        crate::utils::time::date_stamp(today)
    );
    Ok((filename, serde_json::to_string_pretty(vacancies)?))
}

/// Filters by type (`All` or empty keeps everything), then by a case-insensitive
/// match against title, company, location and tags.
pub fn search<'a>(vacancies: &'a [Vacancy], query: &str, job_type: &str) -> Vec<&'a Vacancy> {
    let query = query.trim().to_lowercase();
    vacancies
        .iter()
        .filter(|v| job_type.is_empty() || job_type == "All" || v.job_type == job_type)
        .filter(|v| {
            if query.is_empty() {
                return true;
            }
            format!("{} {} {} {}", v.title, v.company, v.location, v.tags.join(" "))
                .to_lowercase()
                .contains(&query)
        })
        .collect()
}
