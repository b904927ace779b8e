//! Storage module.
//!
//! The canonical row, SQL statements for the `user_logins` table, and the
//! row sink/reader seams. Connection setup is the caller's concern; this
//! module only builds statements, binds parameters and decodes rows.

pub mod models;
pub mod queries;
pub mod sink;
pub mod sql;

pub use models::*;
pub use queries::*;
pub use sink::*;
pub use sql::*;
