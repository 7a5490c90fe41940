use crate::domain::models::CellValue;

/// Durations are hours. A fallback hit outside this open window is assumed
/// to be some other numeric field (a code, an id, a date serial).
const PLAUSIBLE_MIN: f64 = 0.0;
const PLAUSIBLE_MAX: f64 = 100.0;

/// The mapped duration column wins when its cell is numeric. Otherwise the
/// row is scanned in order for the first numeric value strictly inside
/// (0, 100); no hit means no duration, which is not an error.
pub fn resolve_duration(row: &[CellValue], duration_column: Option<usize>) -> Option<f64> {
    if let Some(index) = duration_column {
        if let Some(value) = row.get(index).and_then(CellValue::as_number) {
            return Some(value);
        }
    }

    row.iter()
        .filter_map(CellValue::as_number)
        .find(|v| *v > PLAUSIBLE_MIN && *v < PLAUSIBLE_MAX)
}
