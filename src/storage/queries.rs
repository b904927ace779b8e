//! SQL query builders.
//!
//! Generates SQL statements for login storage.
//! Actual execution is handled by a [`SqlExecutor`](super::sql::SqlExecutor).

/// Default target table.
pub const DEFAULT_TABLE: &str = "user_logins";

/// Get the list of columns for the logins table, in insert order.
///
/// Returns tuples of (column_name, parameter_placeholder).
pub fn get_login_columns() -> Vec<(&'static str, &'static str)> {
    vec![
        ("user_id", "$1"),
        ("device_type", "$2"),
        ("masked_ip", "$3"),
        ("masked_device_id", "$4"),
        ("locale", "$5"),
        ("app_version", "$6"),
        ("create_date", "$7"),
    ]
}

/// Build INSERT query for the logins table.
///
/// No `ON CONFLICT` clause: redelivered messages produce duplicate rows.
pub fn build_login_insert(table: &str) -> String {
    let columns = get_login_columns();
    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<&str> = columns.iter().map(|(_, ph)| *ph).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        col_names.join(", "),
        placeholders.join(", ")
    )
}

/// Build SELECT query returning every committed row, columns in insert order.
pub fn build_login_select(table: &str) -> String {
    let col_names: Vec<&str> = get_login_columns().iter().map(|(name, _)| *name).collect();
    format!("SELECT {} FROM {}", col_names.join(", "), table)
}
