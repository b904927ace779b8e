//! Read-only data viewer.
//!
//! Prints pending raw messages or committed rows. No transformation or
//! masking happens here; it shows whatever the source and reader return.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::queue::source::{MessageSource, SourceError};
use crate::storage::models::CanonicalRecord;
use crate::storage::sink::{RowReader, SinkError};

/// Receive one batch of pending messages and parse their bodies.
///
/// Messages are not deleted; they become visible again once the source's
/// visibility timeout runs out. Bodies that are not JSON are skipped.
pub fn list_pending_raw<S>(source: &mut S, config: &PipelineConfig) -> Result<Vec<Value>, SourceError>
where
    S: MessageSource + ?Sized,
{
    let messages = source.receive(config.batch_size, config.wait_time())?;

    Ok(messages
        .iter()
        .filter_map(|message| match serde_json::from_str::<Value>(&message.body) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!(
                    "VIEWER_SKIPPED_UNPARSEABLE message_id={} error={}",
                    message.message_id,
                    e
                );
                None
            }
        })
        .collect())
}

/// Every committed row.
pub fn list_committed<R>(reader: &R) -> Result<Vec<CanonicalRecord>, SinkError>
where
    R: RowReader + ?Sized,
{
    reader.list_committed()
}

/// Write a title line followed by one JSON line per record.
pub fn print_records<W, T>(out: &mut W, title: &str, records: &[T]) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    writeln!(out, "{}", title)?;
    for record in records {
        let line = serde_json::to_string(record).map_err(io::Error::from)?;
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// A menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChoice {
    Raw,
    Transformed,
    Exit,
}

impl ViewChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(ViewChoice::Raw),
            "2" => Some(ViewChoice::Transformed),
            "3" => Some(ViewChoice::Exit),
            _ => None,
        }
    }
}

const MENU: &str = "Choose data to display:\n1. Raw Data\n2. Transformed Data\n3. Exit";

/// Interactive menu: raw messages, committed rows, or exit.
///
/// Ends on `3` or end of input. Fetch failures are logged and shown as an
/// empty listing.
pub fn run_menu<I, O, S, R>(
    input: &mut I,
    output: &mut O,
    source: &mut S,
    reader: &R,
    config: &PipelineConfig,
) -> Result<()>
where
    I: BufRead,
    O: Write,
    S: MessageSource + ?Sized,
    R: RowReader + ?Sized,
{
    let mut line = String::new();
    loop {
        writeln!(output, "{}", MENU)?;
        write!(output, "Enter your choice (1/2/3): ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        match ViewChoice::parse(&line) {
            Some(ViewChoice::Raw) => {
                let raw = list_pending_raw(source, config).unwrap_or_else(|e| {
                    log::error!("VIEWER_RAW_FETCH_FAILED error={}", e);
                    Vec::new()
                });
                print_records(output, "Raw Data:", &raw)?;
            }
            Some(ViewChoice::Transformed) => {
                let rows = list_committed(reader).unwrap_or_else(|e| {
                    log::error!("VIEWER_ROWS_FETCH_FAILED error={}", e);
                    Vec::new()
                });
                print_records(output, "Transformed Data:", &rows)?;
            }
            Some(ViewChoice::Exit) => {
                writeln!(output, "Exiting program.")?;
                return Ok(());
            }
            None => {
                writeln!(output, "Invalid choice. Please enter 1, 2, or 3.")?;
            }
        }
    }
}
