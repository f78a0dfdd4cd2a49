use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Attributes ────────────────────────────────────────────────

/// Employee attributes that eligibility conditions can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Age,
    /// Whole completed years between join date and the evaluation date.
    ServicePeriod,
    JoinDate,
    Department,
    Location,
    Designation,
    Gender,
    EmployeeType,
    Corporate,
}

/// Declared value type of an attribute, which decides the legal operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Numeric,
    Date,
    Text,
}

impl Attribute {
    pub const ALL: [Attribute; 9] = [
        Attribute::Age,
        Attribute::ServicePeriod,
        Attribute::JoinDate,
        Attribute::Department,
        Attribute::Location,
        Attribute::Designation,
        Attribute::Gender,
        Attribute::EmployeeType,
        Attribute::Corporate,
    ];

    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Age | Attribute::ServicePeriod => AttributeKind::Numeric,
            Attribute::JoinDate => AttributeKind::Date,
            Attribute::Department
            | Attribute::Location
            | Attribute::Designation
            | Attribute::Gender
            | Attribute::EmployeeType
            | Attribute::Corporate => AttributeKind::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Age => "age",
            Attribute::ServicePeriod => "service_period",
            Attribute::JoinDate => "join_date",
            Attribute::Department => "department",
            Attribute::Location => "location",
            Attribute::Designation => "designation",
            Attribute::Gender => "gender",
            Attribute::EmployeeType => "employee_type",
            Attribute::Corporate => "corporate",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Numeric => write!(f, "numeric"),
            AttributeKind::Date => write!(f, "date"),
            AttributeKind::Text => write!(f, "text"),
        }
    }
}

// ── Scalar values ─────────────────────────────────────────────

/// A single attribute or condition value.
///
/// Deserialization is untagged: numbers become `Number`, ISO-8601 dates
/// (`2024-04-01`) become `Date`, everything else is `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Scalar {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Scalar::Number(_) => AttributeKind::Numeric,
            Scalar::Date(_) => AttributeKind::Date,
            Scalar::Text(_) => AttributeKind::Text,
        }
    }

    /// Convert this value to `kind` if a lossless reading exists.
    ///
    /// Numbers and dates read as text, and text reads as a number or date
    /// when it parses. Returns `None` otherwise.
    pub fn coerce_to(&self, kind: AttributeKind) -> Option<Scalar> {
        match (self, kind) {
            (s, k) if s.kind() == k => Some(s.clone()),
            (Scalar::Number(n), AttributeKind::Text) => Some(Scalar::Text(format_number(*n))),
            (Scalar::Date(d), AttributeKind::Text) => Some(Scalar::Text(d.to_string())),
            (Scalar::Text(s), AttributeKind::Numeric) => {
                s.trim().parse::<f64>().ok().map(Scalar::Number)
            }
            (Scalar::Text(s), AttributeKind::Date) => {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok().map(Scalar::Date)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => f.write_str(&format_number(*n)),
            Scalar::Date(d) => write!(f, "{}", d),
            Scalar::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Scalar::Date(value)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ── Employee profile ──────────────────────────────────────────

/// Snapshot of one employee's eligibility-relevant attributes.
///
/// Supplied by the HR/master-data side per evaluation. Every attribute
/// except `id` is optional; blank strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: String,
    #[serde(default)]
    pub corporate_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub employee_type: Option<String>,
}

impl EmployeeProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Completed years of service as of `as_of`; zero for future joiners.
    pub fn service_years(&self, as_of: NaiveDate) -> Option<u32> {
        self.join_date
            .map(|joined| as_of.years_since(joined).unwrap_or(0))
    }

    /// Look up an attribute value, or `None` when the profile lacks it.
    pub fn attribute(&self, attribute: Attribute, as_of: NaiveDate) -> Option<Scalar> {
        match attribute {
            Attribute::Age => self.age.map(|a| Scalar::Number(a as f64)),
            Attribute::ServicePeriod => self.service_years(as_of).map(|y| Scalar::Number(y as f64)),
            Attribute::JoinDate => self.join_date.map(Scalar::Date),
            Attribute::Department => text(&self.department),
            Attribute::Location => text(&self.location),
            Attribute::Designation => text(&self.designation),
            Attribute::Gender => text(&self.gender),
            Attribute::EmployeeType => text(&self.employee_type),
            Attribute::Corporate => text(&self.corporate_id),
        }
    }
}

fn text(value: &Option<String>) -> Option<Scalar> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Scalar::Text(s.to_string()))
}

// ── Roster loading ────────────────────────────────────────────

/// A roster entry that could not be read as an employee profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEntry {
    /// Position in the JSON array.
    pub index: usize,
    /// The entry's `id`, when it had a readable one.
    pub id: Option<String>,
    pub reason: String,
}

/// Employees read from a roster, plus the entries that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub employees: Vec<EmployeeProfile>,
    pub rejected: Vec<RejectedEntry>,
}

/// Load a roster of employee profiles from a JSON array file.
pub fn load_roster(path: &Path) -> Result<Roster> {
    let contents = std::fs::read_to_string(path)?;
    parse_roster(&contents)
}

/// Parse a JSON array of employee profiles.
///
/// Only a document that is not a JSON array fails as a whole. Each entry is
/// read on its own; an entry with a blank `id` or a badly typed field is
/// listed in [`Roster::rejected`] and the remaining entries still load.
pub fn parse_roster(json: &str) -> Result<Roster> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut roster = Roster::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let id = entry
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let reason = match serde_json::from_value::<EmployeeProfile>(entry) {
            Ok(profile) if profile.id.trim().is_empty() => "empty id".to_string(),
            Ok(profile) => {
                roster.employees.push(profile);
                continue;
            }
            Err(e) => e.to_string(),
        };
        tracing::warn!(index, id = ?id, %reason, "skipping roster entry");
        roster.rejected.push(RejectedEntry { index, id, reason });
    }

    tracing::debug!(
        employees = roster.employees.len(),
        rejected = roster.rejected.len(),
        "parsed roster"
    );
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn service_years_counts_completed_years() {
        let mut emp = EmployeeProfile::new("E1");
        emp.join_date = Some(date("2020-06-15"));

        assert_eq!(emp.service_years(date("2023-06-14")), Some(2));
        assert_eq!(emp.service_years(date("2023-06-15")), Some(3));
        assert_eq!(emp.service_years(date("2019-01-01")), Some(0));
    }

    #[test]
    fn blank_text_is_missing() {
        let mut emp = EmployeeProfile::new("E1");
        emp.designation = Some("   ".to_string());
        emp.department = Some(" Engineering ".to_string());

        let as_of = date("2024-01-01");
        assert_eq!(emp.attribute(Attribute::Designation, as_of), None);
        assert_eq!(
            emp.attribute(Attribute::Department, as_of),
            Some(Scalar::Text("Engineering".to_string()))
        );
        assert_eq!(emp.attribute(Attribute::Age, as_of), None);
    }

    #[test]
    fn scalar_deserializes_untagged() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[42, "2024-04-01", "Pune"]"#).unwrap();
        assert_eq!(values[0], Scalar::Number(42.0));
        assert_eq!(values[1], Scalar::Date(date("2024-04-01")));
        assert_eq!(values[2], Scalar::Text("Pune".to_string()));
    }

    #[test]
    fn coercion_between_kinds() {
        assert_eq!(
            Scalar::Number(1001.0).coerce_to(AttributeKind::Text),
            Some(Scalar::Text("1001".to_string()))
        );
        assert_eq!(
            Scalar::Text("2021-01-31".to_string()).coerce_to(AttributeKind::Date),
            Some(Scalar::Date(date("2021-01-31")))
        );
        assert_eq!(Scalar::Text("abc".to_string()).coerce_to(AttributeKind::Numeric), None);
        assert_eq!(Scalar::Date(date("2021-01-31")).coerce_to(AttributeKind::Numeric), None);
    }

    #[test]
    fn bad_roster_entries_are_skipped_one_by_one() {
        let roster = parse_roster(
            r#"[
                {"id": "E1"},
                {"id": " "},
                {"id": "E3", "age": -4},
                {"department": "Sales"},
                {"id": "E5", "age": 40}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = roster.employees.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E5"]);

        let rejected: Vec<_> = roster.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, vec![1, 2, 3]);
        assert_eq!(roster.rejected[0].reason, "empty id");
        assert_eq!(roster.rejected[1].id.as_deref(), Some("E3"));
        assert_eq!(roster.rejected[2].id, None);
    }

    #[test]
    fn roster_that_is_not_an_array_fails() {
        let err = parse_roster(r#"{"id": "E1"}"#).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn roster_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"[{"id": "E1", "department": "Finance", "age": 31, "join_date": "2019-07-01"}]"#,
        )
        .unwrap();

        let roster = load_roster(&path).unwrap().employees;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].age, Some(31));
        assert_eq!(roster[0].department.as_deref(), Some("Finance"));
    }
}
