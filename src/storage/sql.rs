//! SQL-backed row sink.
//!
//! Binds a [`CanonicalRecord`] to the `user_logins` insert statement and
//! decodes selected rows back. The connection itself sits behind
//! [`SqlExecutor`], which the application provides at startup.

use std::time::Duration;

use chrono::NaiveDate;

use super::models::CanonicalRecord;
use super::queries::{build_login_insert, build_login_select, get_login_columns};
use super::sink::{RowReader, RowSink, SinkError};
use crate::config::PipelineConfig;
use crate::security::masking::is_masked_digest;

/// A bound parameter or selected column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Int(i32),
    Date(NaiveDate),
    Null,
}

/// A database connection able to run one statement per transaction.
pub trait SqlExecutor {
    /// Run a single statement in its own transaction, returning rows affected.
    ///
    /// A statement still running at `timeout` is cancelled and rolled back,
    /// reported as [`SinkError::Timeout`].
    fn execute(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        timeout: Duration,
    ) -> Result<u64, SinkError>;

    fn query(&self, sql: &str) -> Result<Vec<Vec<SqlValue>>, SinkError>;
}

/// [`RowSink`] and [`RowReader`] over a SQL connection.
pub struct SqlRowSink<E: SqlExecutor> {
    executor: E,
    insert_sql: String,
    select_sql: String,
    write_timeout: Duration,
}

impl<E: SqlExecutor> SqlRowSink<E> {
    pub fn new(executor: E, table: &str, write_timeout: Duration) -> Self {
        Self {
            executor,
            insert_sql: build_login_insert(table),
            select_sql: build_login_select(table),
            write_timeout,
        }
    }

    pub fn from_config(executor: E, config: &PipelineConfig) -> Self {
        Self::new(executor, &config.table_name, config.sink_write_timeout())
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: SqlExecutor> RowSink for SqlRowSink<E> {
    fn insert(&mut self, record: &CanonicalRecord) -> Result<(), SinkError> {
        let params = bind_record(record);
        let affected = self
            .executor
            .execute(&self.insert_sql, &params, self.write_timeout)?;

        if affected != 1 {
            return Err(SinkError::WriteFailed(format!(
                "expected 1 row affected, got {}",
                affected
            )));
        }
        Ok(())
    }
}

impl<E: SqlExecutor> RowReader for SqlRowSink<E> {
    fn list_committed(&self) -> Result<Vec<CanonicalRecord>, SinkError> {
        self.executor
            .query(&self.select_sql)?
            .iter()
            .map(|row| decode_row(row))
            .collect()
    }
}

/// Bind a record's fields in column order.
pub fn bind_record(record: &CanonicalRecord) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(record.user_id.clone()),
        SqlValue::Text(record.device_type.clone()),
        SqlValue::Text(record.masked_ip.clone()),
        SqlValue::Text(record.masked_device_id.clone()),
        SqlValue::Text(record.locale.clone()),
        SqlValue::Int(record.app_version),
        record
            .create_date
            .map(SqlValue::Date)
            .unwrap_or(SqlValue::Null),
    ]
}

/// Decode one selected row, columns in insert order.
pub fn decode_row(row: &[SqlValue]) -> Result<CanonicalRecord, SinkError> {
    let expected = get_login_columns().len();
    if row.len() != expected {
        return Err(SinkError::Decode(format!(
            "expected {} columns, got {}",
            expected,
            row.len()
        )));
    }

    let masked_ip = text_column(row, 2, "masked_ip")?;
    let masked_device_id = text_column(row, 3, "masked_device_id")?;
    for (column, value) in [("masked_ip", &masked_ip), ("masked_device_id", &masked_device_id)] {
        if !is_masked_digest(value) {
            return Err(SinkError::Decode(format!("{} is not a masked digest", column)));
        }
    }

    let app_version = match &row[5] {
        SqlValue::Int(v) => *v,
        other => {
            return Err(SinkError::Decode(format!(
                "app_version: expected integer, got {:?}",
                other
            )))
        }
    };

    let create_date = match &row[6] {
        SqlValue::Date(d) => Some(*d),
        SqlValue::Null => None,
        other => {
            return Err(SinkError::Decode(format!(
                "create_date: expected date or null, got {:?}",
                other
            )))
        }
    };

    Ok(CanonicalRecord {
        user_id: text_column(row, 0, "user_id")?,
        device_type: text_column(row, 1, "device_type")?,
        masked_ip,
        masked_device_id,
        locale: text_column(row, 4, "locale")?,
        app_version,
        create_date,
    })
}

fn text_column(row: &[SqlValue], index: usize, name: &str) -> Result<String, SinkError> {
    match &row[index] {
        SqlValue::Text(s) => Ok(s.clone()),
        other => Err(SinkError::Decode(format!(
            "{}: expected text, got {:?}",
            name, other
        ))),
    }
}
