use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::domain::models::CellValue;

/// Plain date formats tried in order. ISO first; slashed dates read
/// month-first before day-first, matching how the source files have been
/// interpreted historically.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
];

/// Date-time formats whose date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Spreadsheet 1900 date system: day 1 is 1900-01-01, and serials of 60 and
/// above are shifted one day to absorb the fictitious 1900-02-29.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let days = serial.trunc() as i64;
    if days <= 0 {
        return None;
    }
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_days(Days::new(days as u64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    None
}

/// Best-effort date reading: blank cells yield nothing, numeric cells are
/// spreadsheet date serials, text cells go through the format ladder.
/// Failures are warnings, never fatal.
pub fn normalize_date(cell: &CellValue) -> Option<NaiveDate> {
    if cell.is_blank() {
        return None;
    }

    if let Some(serial) = cell.as_number() {
        let date = serial_to_date(serial);
        if date.is_none() {
            warn!("Cell value {} is not a valid date serial", serial);
        }
        return date;
    }

    let text = cell.as_text()?;
    let date = parse_date_text(text);
    if date.is_none() {
        warn!("Failed to parse date text '{}'", text);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn blank_cells_have_no_date() {
        assert_eq!(normalize_date(&CellValue::Empty), None);
        assert_eq!(normalize_date(&CellValue::Text("   ".to_string())), None);
    }

    #[test]
    fn serial_for_2024_01_15_converts() {
        let parsed = normalize_date(&CellValue::Number(45306.0));
        assert_eq!(parsed, Some(date(2024, 1, 15)));
    }

    #[test]
    fn serial_day_one_is_1900_01_01() {
        assert_eq!(serial_to_date(1.0), Some(date(1900, 1, 1)));
    }

    #[test]
    fn serials_skip_the_fictitious_1900_leap_day() {
        assert_eq!(serial_to_date(59.0), Some(date(1900, 2, 28)));
        assert_eq!(serial_to_date(61.0), Some(date(1900, 3, 1)));
    }

    #[test]
    fn fractional_serials_keep_the_date_part() {
        assert_eq!(serial_to_date(45306.75), Some(date(2024, 1, 15)));
    }

    #[test]
    fn non_positive_serials_are_unparseable() {
        assert_eq!(normalize_date(&CellValue::Number(0.0)), None);
        assert_eq!(normalize_date(&CellValue::Number(-3.0)), None);
    }

    #[test]
    fn numeric_text_is_treated_as_a_serial() {
        let parsed = normalize_date(&CellValue::Text("45306".to_string()));
        assert_eq!(parsed, Some(date(2024, 1, 15)));
    }

    #[test]
    fn common_text_formats_parse() {
        for (text, expected) in [
            ("2024-01-15", date(2024, 1, 15)),
            ("2024/01/15", date(2024, 1, 15)),
            ("01/15/2024", date(2024, 1, 15)),
            ("31/12/2024", date(2024, 12, 31)),
            ("15.01.2024", date(2024, 1, 15)),
            ("2024-01-15 08:30:00", date(2024, 1, 15)),
            (" 2024-01-15 ", date(2024, 1, 15)),
        ] {
            let parsed = normalize_date(&CellValue::Text(text.to_string()));
            assert_eq!(parsed, Some(expected), "input {:?}", text);
        }
    }

    #[test]
    fn garbage_text_yields_none() {
        assert_eq!(normalize_date(&CellValue::Text("not a date".to_string())), None);
        assert_eq!(normalize_date(&CellValue::Text("ALPHA 63".to_string())), None);
    }
}
