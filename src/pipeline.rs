//! One poll cycle: resolve, collect, reconstruct, derive.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::collector::{TableCollector, cancellable};
use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics::{DerivedMetrics, MetricSpec, derive};
use crate::mib::{MibLibrary, MibSource};
use crate::schema::{TableSchema, resolve_table};
use crate::snmp::{BulkWalker, SnmpClientV2c};
use crate::table::ReconstructedTable;

/// Результат одного успешного цикла опроса.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub table: ReconstructedTable,
    pub metrics: DerivedMetrics,
}

/// Run a full cycle against an open session.
pub async fn run_cycle<M, W>(
    mib: &M,
    session: &mut W,
    table: &str,
    specs: &[MetricSpec],
    cancel: &CancellationToken,
) -> Result<CycleOutput>
where
    M: MibSource,
    W: BulkWalker,
{
    let schema = resolve_table(mib, table)?;
    collect_and_derive(session, schema, specs, cancel).await
}

/// Cycle stages after schema resolution.
pub async fn collect_and_derive<W: BulkWalker>(
    session: &mut W,
    schema: TableSchema,
    specs: &[MetricSpec],
    cancel: &CancellationToken,
) -> Result<CycleOutput> {
    let cells = TableCollector::collect(session, &schema, cancel).await?;
    let table = ReconstructedTable::build(schema, cells)?;
    let metrics = derive(&table, specs)?;
    Ok(CycleOutput { table, metrics })
}

/// Опрашивает настроенный агент один раз.
///
/// The MIB library lives for this call only. The schema is resolved before
/// any packet is sent, so a bad table identifier never touches the network.
pub async fn poll(config: &AppConfig, cancel: &CancellationToken) -> Result<CycleOutput> {
    let mib = MibLibrary::open(&config.mib.modules, &config.mib.directory)?;
    let schema = resolve_table(&mib, &config.target.oid)?;
    info!(
        target: "snmp_table::pipeline",
        table = %config.target.oid,
        root = %schema.root_oid,
        columns = schema.columns.len(),
        "schema resolved"
    );

    let address = config.target.address();
    let community = config.community();
    let mut session = cancellable(
        &address,
        cancel,
        SnmpClientV2c::connect(&address, &community, config.target.session_options()),
    )
    .await?;

    collect_and_derive(&mut session, schema, &config.metrics, cancel).await
}
