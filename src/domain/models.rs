use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One persisted production stop. A spreadsheet row only becomes one of
/// these when both the start date and the machine name could be recovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionStop {
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub mo_key: Option<String>,
    pub ws_key: Option<String>,
    pub stop_type: Option<String>,
    pub wo_key: Option<String>,
    pub wo_name: Option<String>,
    /// Intervention type.
    pub code1: Option<String>,
    /// Cause.
    pub code2: Option<String>,
    /// Affected component.
    pub code3: Option<String>,
    pub machine_name: String,
    pub machine_group: Option<String>,
    /// Stop duration in hours.
    pub stop_duration: Option<f64>,
}

/// Per-row extraction result, before the required-field gate.
#[derive(Debug, Clone, Default)]
pub struct StopCandidate {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub mo_key: Option<String>,
    pub ws_key: Option<String>,
    pub stop_type: Option<String>,
    pub wo_key: Option<String>,
    pub wo_name: Option<String>,
    pub code1: Option<String>,
    pub code2: Option<String>,
    pub code3: Option<String>,
    pub machine_name: Option<String>,
    pub machine_group: Option<String>,
    pub stop_duration: Option<f64>,
}

impl StopCandidate {
    /// A candidate is persistable only with both `from_date` and
    /// `machine_name` present; anything else is discarded whole.
    pub fn into_record(self) -> Option<ProductionStop> {
        let from_date = self.from_date?;
        let machine_name = self.machine_name?;
        Some(ProductionStop {
            from_date,
            to_date: self.to_date,
            mo_key: self.mo_key,
            ws_key: self.ws_key,
            stop_type: self.stop_type,
            wo_key: self.wo_key,
            wo_name: self.wo_name,
            code1: self.code1,
            code2: self.code2,
            code3: self.code3,
            machine_name,
            machine_group: self.machine_group,
            stop_duration: self.stop_duration,
        })
    }
}

/// Raw cell as produced by a tabular reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(t) => t.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Numeric reading. Delimited-text sources carry numbers as text, so
    /// numeric-looking text counts as a number here.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(t) => t.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        }
    }

    /// Free-text label reading for the plain record fields.
    pub fn to_label(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(t) => {
                let trimmed = t.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
        }
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// Conjunctive filters shared by all statistics queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub machine: Option<String>,
    pub machine_group: Option<String>,
    pub code1: Option<String>,
    pub code2: Option<String>,
    pub code3: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Aggregate line for one group-by label. The label is `None` for records
/// that carry no value in the grouped column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub label: Option<String>,
    pub total_duration: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_duration: f64,
}

/// Everything the dashboard landing page needs in one round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStatistics {
    pub total_stop_time: f64,
    pub by_machine: Vec<GroupTotal>,
    pub by_code1: Vec<GroupTotal>,
    pub by_code2: Vec<GroupTotal>,
    pub by_code3: Vec<GroupTotal>,
    pub by_machine_group: Vec<GroupTotal>,
    pub trend: Vec<DailyTotal>,
}

/// Distinct values available for dashboard filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub years: Vec<i32>,
    pub machines: Vec<String>,
    pub machine_groups: Vec<String>,
    pub code1_values: Vec<String>,
    pub code2_values: Vec<String>,
    pub code3_values: Vec<String>,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

/// One line of the import history report, grouped by the creation date the
/// store assigned at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHistoryEntry {
    pub import_date: NaiveDate,
    pub record_count: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
