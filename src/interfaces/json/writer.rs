use crate::domain::port::PortId;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use chrono_tz::Tz;
use serde::Serialize;
use std::io::Write;

/// Writes one JSON document per line.
pub struct JsonWriter<W: Write> {
    writer: W,
    timezone: Option<Tz>,
}

#[derive(Serialize)]
struct PortEntry {
    id: u8,
    name: &'static str,
}

/// A transaction with its timestamps rendered in the configured timezone.
#[derive(Serialize)]
struct TransactionView<'a> {
    #[serde(flatten)]
    transaction: &'a Transaction,
    created_at_local: Option<String>,
    updated_at_local: Option<String>,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_ports(&mut self, ports: &[PortId]) -> Result<()> {
        let entries: Vec<PortEntry> = ports
            .iter()
            .map(|port| PortEntry {
                id: port.0,
                name: port.name().unwrap_or("UNKNOWN"),
            })
            .collect();
        self.write(&entries)
    }

    pub fn write_transaction(&mut self, transaction: &Transaction) -> Result<()> {
        let local = |at: chrono::DateTime<chrono::Utc>| {
            self.timezone
                .map(|tz| at.with_timezone(&tz).to_rfc3339())
        };
        let view = TransactionView {
            transaction,
            created_at_local: local(transaction.created_at),
            updated_at_local: local(transaction.updated_at),
        };
        self.write(&view)
    }
}
