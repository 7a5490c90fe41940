use std::fmt;

use crate::application::{
    date_normalizer::normalize_date,
    duration_resolver::resolve_duration,
    header_resolver::ColumnMap,
    machine_classifier::{MachineGroupMap, MachinePatterns},
};
use crate::domain::{
    error::BackendError,
    models::{CellValue, StopCandidate},
};

/// Why a row produced no candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyRow,
    MissingRequiredFields,
    Extraction(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyRow => write!(f, "empty row"),
            SkipReason::MissingRequiredFields => {
                write!(f, "missing from date or machine name")
            }
            SkipReason::Extraction(message) => write!(f, "extraction failed: {}", message),
        }
    }
}

/// Outcome of normalizing one data row.
#[derive(Debug)]
pub enum RowOutcome {
    Candidate(StopCandidate),
    Skipped(SkipReason),
}

/// Turns one raw row into a stop candidate using the resolved column map and
/// the pattern rules. Row-level failures stay inside this boundary: whatever
/// goes wrong while extracting a single row becomes a skip, never an abort.
pub struct RowNormalizer<'a> {
    columns: &'a ColumnMap,
    patterns: &'a MachinePatterns,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(columns: &'a ColumnMap, patterns: &'a MachinePatterns) -> Self {
        Self { columns, patterns }
    }

    pub fn normalize(&self, row: &[CellValue], groups: &mut MachineGroupMap) -> RowOutcome {
        if row.is_empty() || row.iter().all(CellValue::is_blank) {
            return RowOutcome::Skipped(SkipReason::EmptyRow);
        }

        match self.extract(row, groups) {
            Ok(candidate) => RowOutcome::Candidate(candidate),
            Err(e) => RowOutcome::Skipped(SkipReason::Extraction(e.to_string())),
        }
    }

    fn extract(
        &self,
        row: &[CellValue],
        groups: &mut MachineGroupMap,
    ) -> Result<StopCandidate, BackendError> {
        let (machine_name, machine_group) = self.patterns.classify_row(row, groups);

        let cell = |index: Option<usize>| index.and_then(|i| row.get(i));
        let label = |index: Option<usize>| cell(index).and_then(CellValue::to_label);

        Ok(StopCandidate {
            from_date: cell(self.columns.from_date).and_then(normalize_date),
            to_date: cell(self.columns.to_date).and_then(normalize_date),
            mo_key: label(self.columns.mo_key),
            ws_key: label(self.columns.ws_key),
            stop_type: label(self.columns.stop_type),
            wo_key: label(self.columns.wo_key),
            wo_name: label(self.columns.wo_name),
            code1: label(self.columns.code1),
            code2: label(self.columns.code2),
            code3: label(self.columns.code3),
            machine_name,
            machine_group,
            stop_duration: resolve_duration(row, self.columns.stop_duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|c| {
                if c.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(c.to_string())
                }
            })
            .collect()
    }

    fn columns_for(header: &[&str]) -> ColumnMap {
        let header: Vec<CellValue> =
            header.iter().map(|c| CellValue::Text(c.to_string())).collect();
        ColumnMap::resolve(&header)
    }

    #[test]
    fn empty_rows_are_skipped_without_extraction() {
        let columns = columns_for(&["from date", "machine", "duration"]);
        let patterns = MachinePatterns::default();
        let normalizer = RowNormalizer::new(&columns, &patterns);
        let mut groups = MachineGroupMap::new();

        for row in [vec![], text_row(&["", "", ""])] {
            match normalizer.normalize(&row, &mut groups) {
                RowOutcome::Skipped(SkipReason::EmptyRow) => {}
                other => panic!("expected empty-row skip, got {:?}", other),
            }
        }
    }

    #[test]
    fn full_row_produces_a_persistable_candidate() {
        let columns = columns_for(&["from date", "machine", "duration"]);
        let patterns = MachinePatterns::default();
        let normalizer = RowNormalizer::new(&columns, &patterns);
        let mut groups = MachineGroupMap::new();

        let row = text_row(&["2024-01-01", "ALPHA 63", "2.5"]);
        let RowOutcome::Candidate(candidate) = normalizer.normalize(&row, &mut groups) else {
            panic!("expected a candidate");
        };
        let record = candidate.into_record().expect("both required fields present");
        assert_eq!(record.from_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(record.machine_name, "ALPHA 63");
        assert_eq!(record.stop_duration, Some(2.5));
    }

    #[test]
    fn unparseable_duration_does_not_fail_the_row() {
        let columns = columns_for(&["from date", "machine", "duration"]);
        let patterns = MachinePatterns::default();
        let normalizer = RowNormalizer::new(&columns, &patterns);
        let mut groups = MachineGroupMap::new();

        let row = text_row(&["2024-01-02", "ALPHA 19", "bad"]);
        let RowOutcome::Candidate(candidate) = normalizer.normalize(&row, &mut groups) else {
            panic!("expected a candidate");
        };
        let record = candidate.into_record().expect("duration is optional");
        assert_eq!(record.stop_duration, None);
    }

    #[test]
    fn candidate_without_required_fields_never_becomes_a_record() {
        let columns = columns_for(&["from date", "machine", "duration"]);
        let patterns = MachinePatterns::default();
        let normalizer = RowNormalizer::new(&columns, &patterns);
        let mut groups = MachineGroupMap::new();

        // A real machine but no parseable date.
        let row = text_row(&["soon", "ALPHA 63", "1.0"]);
        let RowOutcome::Candidate(candidate) = normalizer.normalize(&row, &mut groups) else {
            panic!("expected a candidate");
        };
        assert!(candidate.into_record().is_none());

        // A date but no machine anywhere in the row.
        let row = text_row(&["2024-01-01", "press shop", "1.0"]);
        let RowOutcome::Candidate(candidate) = normalizer.normalize(&row, &mut groups) else {
            panic!("expected a candidate");
        };
        assert!(candidate.into_record().is_none());
    }

    #[test]
    fn absent_columns_leave_fields_unset() {
        // Narrow header: positional defaults point past the end of the row.
        let columns = columns_for(&["from date"]);
        let patterns = MachinePatterns::default();
        let normalizer = RowNormalizer::new(&columns, &patterns);
        let mut groups = MachineGroupMap::new();

        let row = text_row(&["2024-03-05", "ALPHA 7"]);
        let RowOutcome::Candidate(candidate) = normalizer.normalize(&row, &mut groups) else {
            panic!("expected a candidate");
        };
        assert_eq!(candidate.mo_key, None);
        assert_eq!(candidate.code3, None);
        assert_eq!(candidate.machine_name.as_deref(), Some("ALPHA 7"));
    }

    #[test]
    fn group_association_survives_even_when_the_row_is_gated_out() {
        let columns = columns_for(&["from date", "machine", "group"]);
        let patterns = MachinePatterns::default();
        let normalizer = RowNormalizer::new(&columns, &patterns);
        let mut groups = MachineGroupMap::new();

        // No usable date, so this row will not persist, but its association
        // must still feed later rows.
        let row = text_row(&["", "ALPHA 63", "Komax Alpha 355"]);
        normalizer.normalize(&row, &mut groups);

        let row = text_row(&["2024-01-02", "ALPHA 63", ""]);
        let RowOutcome::Candidate(candidate) = normalizer.normalize(&row, &mut groups) else {
            panic!("expected a candidate");
        };
        assert_eq!(candidate.machine_group.as_deref(), Some("Komax Alpha 355"));
    }
}
