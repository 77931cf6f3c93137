use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::format::{DisplayFormat, grouped_hex};
use super::types::RawCells;
use crate::error::{Error, Result};
use crate::schema::TableSchema;
use crate::snmp::{BulkWalker, Value, VarBind};

/// Сборщик таблиц: одна таблица за вызов, один bulk walk.
pub struct TableCollector;

impl TableCollector {
    /// Walk the table rooted at `schema.root_oid` and decode every value.
    ///
    /// Nothing is returned when `cancel` fires before the walk completes.
    pub async fn collect<W: BulkWalker>(
        session: &mut W,
        schema: &TableSchema,
        cancel: &CancellationToken,
    ) -> Result<RawCells> {
        let target = session.target().to_string();
        let root = schema.root_oid.clone();

        let walk = async {
            let mut cells = RawCells::new();
            session
                .bulk_walk(&root, |vb| Self::store(&mut cells, schema, &target, vb))
                .await?;
            Ok(cells)
        };

        let cells = cancellable(&target, cancel, walk).await?;
        info!(
            target: "snmp_table::collector",
            %target,
            root = %schema.root_oid,
            values = cells.len(),
            "table collected"
        );
        Ok(cells)
    }

    fn store(cells: &mut RawCells, schema: &TableSchema, target: &str, vb: VarBind) -> Result<()> {
        let VarBind { oid, value } = vb;
        let Some(decoded) = decode(schema, &oid, &value) else {
            debug!(
                target: "snmp_table::collector",
                %oid,
                kind = value.type_name(),
                "value skipped"
            );
            return Ok(());
        };

        if !cells.insert_unique(oid.clone(), decoded) {
            return Err(Error::collection(
                target,
                format!("agent returned {oid} more than once"),
            ));
        }
        Ok(())
    }
}

/// Race `work` against `cancel`.
pub async fn cancellable<T, F>(target: &str, cancel: &CancellationToken, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled { target: target.to_string() }),
        result = work => result,
    }
}

/// Render a returned value as a cell string.
///
/// Byte strings follow the DISPLAY-HINT of the column the OID falls under;
/// integers and counters are rendered in base 10. Exceptions yield `None`.
pub fn decode(schema: &TableSchema, oid: &crate::snmp::Oid, value: &Value) -> Option<String> {
    match value {
        Value::OctetString(bytes) => {
            let format = match schema.column_for(oid) {
                Some(column) => DisplayFormat::from_hint(&column.name, column.format_hint.as_deref())
                    .unwrap_or_else(|e| {
                        debug!(target: "snmp_table::collector", %oid, error = %e, "falling back to text");
                        DisplayFormat::Text
                    }),
                None => DisplayFormat::Text,
            };
            Some(format.render(bytes))
        }
        Value::Opaque(bytes) => Some(grouped_hex(bytes)),
        Value::IpAddress(_) => value.as_ip().map(|ip| ip.to_string()),
        Value::ObjectIdentifier(target) => Some(target.to_string()),
        Value::Null => Some(String::new()),
        v if v.is_exception() => None,
        Value::Other(_) => None,
        v => v.as_decimal(),
    }
}
