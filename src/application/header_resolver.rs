use tracing::debug;

use crate::domain::models::CellValue;

/// One logical record field: header synonyms in priority order, plus the
/// positional fallback used when a file carries no recognizable header.
struct FieldRule {
    synonyms: &'static [&'static str],
    default_index: Option<usize>,
}

const FROM_DATE: FieldRule = FieldRule {
    synonyms: &["from date", "from_date", "date"],
    default_index: Some(0),
};
const TO_DATE: FieldRule = FieldRule {
    synonyms: &["to date", "to_date", "end date"],
    default_index: Some(1),
};
const MO_KEY: FieldRule = FieldRule {
    synonyms: &["mo key", "mo_key", "maintenance object"],
    default_index: Some(2),
};
const WS_KEY: FieldRule = FieldRule {
    synonyms: &["ws key", "ws_key", "workstation"],
    default_index: Some(3),
};
const STOP_TYPE: FieldRule = FieldRule {
    synonyms: &["stop t", "stop_t", "stop type"],
    default_index: Some(4),
};
const WO_KEY: FieldRule = FieldRule {
    synonyms: &["wo key", "wo_key", "work order key"],
    default_index: Some(5),
};
const WO_NAME: FieldRule = FieldRule {
    synonyms: &["wo name", "wo_name", "work order name"],
    default_index: Some(6),
};
const CODE1: FieldRule = FieldRule {
    synonyms: &["code1 key", "code1_key", "type"],
    default_index: Some(7),
};
const CODE2: FieldRule = FieldRule {
    synonyms: &["code2 key", "code2_key", "cause"],
    default_index: Some(8),
};
const CODE3: FieldRule = FieldRule {
    synonyms: &["code3 key", "code3_key", "component"],
    default_index: Some(9),
};
const STOP_DURATION: FieldRule = FieldRule {
    synonyms: &["stop duration", "stop_duration", "duration"],
    default_index: Some(10),
};

/// Synonyms are tried in priority order; each is compared against every
/// header cell with case-insensitive whole-cell equality. A field with no
/// matching synonym falls back to its fixed positional default.
fn resolve_column(header: &[CellValue], rule: &FieldRule) -> Option<usize> {
    for synonym in rule.synonyms {
        for (index, cell) in header.iter().enumerate() {
            if let Some(text) = cell.as_text() {
                if text.eq_ignore_ascii_case(synonym) {
                    return Some(index);
                }
            }
        }
    }
    rule.default_index
}

/// Column indices for every logical field, resolved once per import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub from_date: Option<usize>,
    pub to_date: Option<usize>,
    pub mo_key: Option<usize>,
    pub ws_key: Option<usize>,
    pub stop_type: Option<usize>,
    pub wo_key: Option<usize>,
    pub wo_name: Option<usize>,
    pub code1: Option<usize>,
    pub code2: Option<usize>,
    pub code3: Option<usize>,
    pub stop_duration: Option<usize>,
}

impl ColumnMap {
    pub fn resolve(header: &[CellValue]) -> Self {
        let map = Self {
            from_date: resolve_column(header, &FROM_DATE),
            to_date: resolve_column(header, &TO_DATE),
            mo_key: resolve_column(header, &MO_KEY),
            ws_key: resolve_column(header, &WS_KEY),
            stop_type: resolve_column(header, &STOP_TYPE),
            wo_key: resolve_column(header, &WO_KEY),
            wo_name: resolve_column(header, &WO_NAME),
            code1: resolve_column(header, &CODE1),
            code2: resolve_column(header, &CODE2),
            code3: resolve_column(header, &CODE3),
            stop_duration: resolve_column(header, &STOP_DURATION),
        };
        debug!("Resolved header columns: {:?}", map);
        map
    }
}
