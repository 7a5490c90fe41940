use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, Transaction};
use tracing::{debug, info};

use crate::domain::{
    error::BackendError,
    models::{
        DailyTotal, DashboardStatistics, FilterOptions, GroupTotal, ImportHistoryEntry,
        ProductionStop, StopFilter,
    },
    ports::StopRepository,
};

const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Dates are TEXT in `%Y-%m-%d`; range filters and strftime() operate on
/// them directly. `created_at` is assigned here, at commit time.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS production_stops (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_date TEXT NOT NULL,
    to_date TEXT,
    mo_key TEXT,
    ws_key TEXT,
    stop_type TEXT,
    wo_key TEXT,
    wo_name TEXT,
    code1 TEXT,
    code2 TEXT,
    code3 TEXT,
    machine_name TEXT NOT NULL,
    machine_group TEXT,
    stop_duration REAL CHECK (stop_duration IS NULL OR stop_duration >= 0.0),
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_production_stops_from_date ON production_stops (from_date);
CREATE INDEX IF NOT EXISTS idx_production_stops_machine_name ON production_stops (machine_name);
"#;

/// Columns the statistics queries may group by.
#[derive(Clone, Copy)]
enum GroupColumn {
    MachineName,
    MachineGroup,
    Code1,
    Code2,
    Code3,
}

impl GroupColumn {
    fn as_str(self) -> &'static str {
        match self {
            GroupColumn::MachineName => "machine_name",
            GroupColumn::MachineGroup => "machine_group",
            GroupColumn::Code1 => "code1",
            GroupColumn::Code2 => "code2",
            GroupColumn::Code3 => "code3",
        }
    }
}

fn db_err(e: rusqlite::Error) -> BackendError {
    BackendError::Database(e.to_string())
}

/// SQLite-backed stop store. Each import run commits through a single
/// transaction, so readers never observe a half-finished load.
pub struct SqliteStopRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStopRepository {
    pub fn new(db_path: &str) -> Result<Self, BackendError> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        Self::init(conn)
    }

    /// Private in-memory store, used by tests.
    pub fn in_memory() -> Result<Self, BackendError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, BackendError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, BackendError> {
        self.conn
            .lock()
            .map_err(|e| BackendError::Database(format!("connection lock poisoned: {}", e)))
    }

    fn insert_stops_tx(
        tx: &Transaction,
        stops: &[ProductionStop],
        created_at: &str,
    ) -> rusqlite::Result<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO production_stops (
                from_date, to_date, mo_key, ws_key, stop_type, wo_key, wo_name,
                code1, code2, code3, machine_name, machine_group, stop_duration,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )?;

        let mut count = 0;
        for stop in stops {
            stmt.execute(params![
                stop.from_date,
                stop.to_date,
                stop.mo_key,
                stop.ws_key,
                stop.stop_type,
                stop.wo_key,
                stop.wo_name,
                stop.code1,
                stop.code2,
                stop.code3,
                stop.machine_name,
                stop.machine_group,
                stop.stop_duration,
                created_at,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    /// Conjunctive WHERE clause for a filter. All parameters bind as TEXT;
    /// the date column format makes that sound for every comparison here.
    fn filter_clause(filter: &StopFilter) -> (String, Vec<String>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(year) = filter.year {
            clauses.push("strftime('%Y', from_date) = ?");
            values.push(format!("{:04}", year));
        }
        if let Some(month) = filter.month {
            clauses.push("strftime('%m', from_date) = ?");
            values.push(format!("{:02}", month));
        }
        if let Some(machine) = &filter.machine {
            clauses.push("machine_name = ?");
            values.push(machine.clone());
        }
        if let Some(group) = &filter.machine_group {
            clauses.push("machine_group = ?");
            values.push(group.clone());
        }
        if let Some(code1) = &filter.code1 {
            clauses.push("code1 = ?");
            values.push(code1.clone());
        }
        if let Some(code2) = &filter.code2 {
            clauses.push("code2 = ?");
            values.push(code2.clone());
        }
        if let Some(code3) = &filter.code3 {
            clauses.push("code3 = ?");
            values.push(code3.clone());
        }
        if let Some(from) = filter.from_date {
            clauses.push("from_date >= ?");
            values.push(from.to_string());
        }
        if let Some(to) = filter.to_date {
            clauses.push("from_date <= ?");
            values.push(to.to_string());
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }

    fn and_clause(where_sql: &str, extra: &str) -> String {
        if where_sql.is_empty() {
            format!(" WHERE {}", extra)
        } else {
            format!("{} AND {}", where_sql, extra)
        }
    }

    fn group_totals(
        conn: &Connection,
        column: GroupColumn,
        where_sql: &str,
        values: &[String],
    ) -> rusqlite::Result<Vec<GroupTotal>> {
        // Grouping by machine group only makes sense over records that have
        // one; the other dimensions keep their unlabeled bucket.
        let where_sql = match column {
            GroupColumn::MachineGroup => {
                Self::and_clause(where_sql, "machine_group IS NOT NULL")
            }
            _ => where_sql.to_string(),
        };
        let sql = format!(
            "SELECT {col}, IFNULL(SUM(stop_duration), 0.0) AS total_duration, COUNT(*) AS count \
             FROM production_stops{where_sql} \
             GROUP BY {col} \
             ORDER BY total_duration DESC",
            col = column.as_str(),
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(GroupTotal {
                label: row.get(0)?,
                total_duration: row.get(1)?,
                count: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    fn daily_trend(
        conn: &Connection,
        where_sql: &str,
        values: &[String],
    ) -> rusqlite::Result<Vec<DailyTotal>> {
        let sql = format!(
            "SELECT from_date, IFNULL(SUM(stop_duration), 0.0) \
             FROM production_stops{where_sql} \
             GROUP BY from_date \
             ORDER BY from_date",
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(DailyTotal {
                date: row.get(0)?,
                total_duration: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    fn distinct_strings(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect()
    }
}

#[async_trait]
impl StopRepository for SqliteStopRepository {
    async fn replace_stops(
        &self,
        stops: Vec<ProductionStop>,
        delete_existing: bool,
    ) -> Result<usize, BackendError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db_err)?;

        if delete_existing {
            let deleted = tx
                .execute("DELETE FROM production_stops", [])
                .map_err(db_err)?;
            debug!("Purged {} existing stops", deleted);
        }

        let created_at = Utc::now().to_rfc3339();
        let count = Self::insert_stops_tx(&tx, &stops, &created_at).map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        info!("Committed {} stops", count);
        Ok(count)
    }

    async fn fetch_statistics(
        &self,
        filter: &StopFilter,
    ) -> Result<DashboardStatistics, BackendError> {
        let conn = self.lock()?;
        let (where_sql, values) = Self::filter_clause(filter);

        let total_stop_time: f64 = conn
            .query_row(
                &format!(
                    "SELECT IFNULL(SUM(stop_duration), 0.0) FROM production_stops{}",
                    where_sql
                ),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(db_err)?;

        let by_machine =
            Self::group_totals(&conn, GroupColumn::MachineName, &where_sql, &values)
                .map_err(db_err)?;
        let by_code1 = Self::group_totals(&conn, GroupColumn::Code1, &where_sql, &values)
            .map_err(db_err)?;
        let by_code2 = Self::group_totals(&conn, GroupColumn::Code2, &where_sql, &values)
            .map_err(db_err)?;
        let by_code3 = Self::group_totals(&conn, GroupColumn::Code3, &where_sql, &values)
            .map_err(db_err)?;
        let by_machine_group =
            Self::group_totals(&conn, GroupColumn::MachineGroup, &where_sql, &values)
                .map_err(db_err)?;
        let trend = Self::daily_trend(&conn, &where_sql, &values).map_err(db_err)?;

        Ok(DashboardStatistics {
            total_stop_time,
            by_machine,
            by_code1,
            by_code2,
            by_code3,
            by_machine_group,
            trend,
        })
    }

    async fn fetch_filter_options(&self) -> Result<FilterOptions, BackendError> {
        let conn = self.lock()?;

        let years = Self::distinct_strings(
            &conn,
            "SELECT DISTINCT strftime('%Y', from_date) FROM production_stops ORDER BY 1",
        )
        .map_err(db_err)?
        .into_iter()
        .filter_map(|y| y.parse::<i32>().ok())
        .collect();

        let machines = Self::distinct_strings(
            &conn,
            "SELECT DISTINCT machine_name FROM production_stops ORDER BY machine_name",
        )
        .map_err(db_err)?;
        let machine_groups = Self::distinct_strings(
            &conn,
            "SELECT DISTINCT machine_group FROM production_stops \
             WHERE machine_group IS NOT NULL ORDER BY machine_group",
        )
        .map_err(db_err)?;
        let code1_values = Self::distinct_strings(
            &conn,
            "SELECT DISTINCT code1 FROM production_stops WHERE code1 IS NOT NULL ORDER BY code1",
        )
        .map_err(db_err)?;
        let code2_values = Self::distinct_strings(
            &conn,
            "SELECT DISTINCT code2 FROM production_stops WHERE code2 IS NOT NULL ORDER BY code2",
        )
        .map_err(db_err)?;
        let code3_values = Self::distinct_strings(
            &conn,
            "SELECT DISTINCT code3 FROM production_stops WHERE code3 IS NOT NULL ORDER BY code3",
        )
        .map_err(db_err)?;

        let (date_min, date_max) = conn
            .query_row(
                "SELECT MIN(from_date), MAX(to_date) FROM production_stops",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<NaiveDate>>(0)?,
                        row.get::<_, Option<NaiveDate>>(1)?,
                    ))
                },
            )
            .map_err(db_err)?;

        Ok(FilterOptions {
            years,
            machines,
            machine_groups,
            code1_values,
            code2_values,
            code3_values,
            date_min,
            date_max,
        })
    }

    async fn list_stops(
        &self,
        filter: &StopFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductionStop>, BackendError> {
        let conn = self.lock()?;
        let (where_sql, values) = Self::filter_clause(filter);
        let sql = format!(
            "SELECT from_date, to_date, mo_key, ws_key, stop_type, wo_key, wo_name, \
                    code1, code2, code3, machine_name, machine_group, stop_duration \
             FROM production_stops{} \
             ORDER BY from_date DESC \
             LIMIT {} OFFSET {}",
            where_sql,
            limit.max(0),
            offset.max(0),
        );

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(ProductionStop {
                    from_date: row.get(0)?,
                    to_date: row.get(1)?,
                    mo_key: row.get(2)?,
                    ws_key: row.get(3)?,
                    stop_type: row.get(4)?,
                    wo_key: row.get(5)?,
                    wo_name: row.get(6)?,
                    code1: row.get(7)?,
                    code2: row.get(8)?,
                    code3: row.get(9)?,
                    machine_name: row.get(10)?,
                    machine_group: row.get(11)?,
                    stop_duration: row.get(12)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    async fn import_history(&self) -> Result<Vec<ImportHistoryEntry>, BackendError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT DATE(created_at) AS import_date, COUNT(*) AS record_count, \
                        MIN(from_date) AS start_date, MAX(to_date) AS end_date \
                 FROM production_stops \
                 GROUP BY import_date \
                 ORDER BY import_date DESC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ImportHistoryEntry {
                    import_date: row.get(0)?,
                    record_count: row.get(1)?,
                    start_date: row.get(2)?,
                    end_date: row.get(3)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    async fn delete_range(&self, from: NaiveDate, to: NaiveDate) -> Result<usize, BackendError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM production_stops WHERE from_date BETWEEN ?1 AND ?2",
                params![from, to],
            )
            .map_err(db_err)?;
        info!("Deleted {} stops between {} and {}", deleted, from, to);
        Ok(deleted)
    }
}
