use std::collections::HashMap;

use regex::Regex;

use crate::domain::{error::BackendError, models::CellValue};

/// One site's naming convention: individual machines like "ALPHA 63",
/// machine families like "Komax Alpha 355". Other sites inject their own.
pub const DEFAULT_MACHINE_PATTERN: &str = r"ALPHA\s+\d+";
pub const DEFAULT_GROUP_PATTERN: &str = r"Komax\s+Alpha\s+\d+";

/// How many leading cells the loose rescue scan looks at when no cell
/// matched the machine pattern in full.
const RESCUE_SCAN_CELLS: usize = 5;

/// Pattern rules for recognizing machine names and machine groups embedded
/// in free-text cells.
pub struct MachinePatterns {
    machine_exact: Regex,
    machine_loose: Regex,
    group: Regex,
}

impl MachinePatterns {
    pub fn new(machine_pattern: &str, group_pattern: &str) -> Result<Self, BackendError> {
        let compile = |p: &str| Regex::new(p).map_err(|e| BackendError::Pattern(e.to_string()));
        Ok(Self {
            machine_exact: compile(&format!("(?i)^(?:{})$", machine_pattern))?,
            machine_loose: compile(&format!("(?i){}", machine_pattern))?,
            group: compile(&format!("(?i){}", group_pattern))?,
        })
    }

    /// Determine `(machine_name, machine_group)` for one data row and record
    /// any machine-to-group association observed along the way.
    ///
    /// Full scan first: a text cell equal to the machine pattern is a machine
    /// name (last match wins), a text cell containing the group pattern is a
    /// group (the whole cell is taken). If no cell matched the machine
    /// pattern in full, the first cells are re-scanned for a substring match.
    /// A row without its own group text inherits the group previously seen
    /// for the same machine in this run.
    pub fn classify_row(
        &self,
        row: &[CellValue],
        groups: &mut MachineGroupMap,
    ) -> (Option<String>, Option<String>) {
        let mut machine_name: Option<String> = None;
        let mut machine_group: Option<String> = None;

        for cell in row {
            let Some(text) = cell.as_text() else { continue };
            if self.machine_exact.is_match(text) {
                machine_name = Some(text.to_string());
            } else if self.group.is_match(text) {
                machine_group = Some(text.to_string());
                if let Some(machine) = &machine_name {
                    groups.associate(machine, text);
                }
            }
        }

        if machine_name.is_none() {
            for cell in row.iter().take(RESCUE_SCAN_CELLS) {
                if let Some(found) = cell.as_text().and_then(|t| self.machine_loose.find(t)) {
                    machine_name = Some(found.as_str().to_string());
                    break;
                }
            }
        }

        if machine_group.is_none() {
            if let Some(machine) = &machine_name {
                machine_group = groups.group_for(machine).map(str::to_string);
            }
        }

        (machine_name, machine_group)
    }
}

impl Default for MachinePatterns {
    fn default() -> Self {
        Self::new(DEFAULT_MACHINE_PATTERN, DEFAULT_GROUP_PATTERN)
            .expect("built-in patterns compile")
    }
}

/// Machine-to-group associations observed so far in one import run. Built
/// fresh per run and discarded with it.
#[derive(Debug, Default)]
pub struct MachineGroupMap(HashMap<String, String>);

impl MachineGroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn associate(&mut self, machine: &str, group: &str) {
        self.0.insert(machine.to_string(), group.to_string());
    }

    fn group_for(&self, machine: &str) -> Option<&str> {
        self.0.get(machine).map(String::as_str)
    }
}
