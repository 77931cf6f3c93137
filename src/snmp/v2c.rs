use std::time::Duration;

use snmp2::AsyncSession;
use tracing::{debug, trace};

use super::{BulkWalker, Oid, Value, VarBind};
use crate::error::{Error, Result};

/// Параметры запросов community-сессии.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Wait for the first transmission of a request. Doubles on every
    /// retransmission.
    pub timeout: Duration,
    /// Retransmissions per request after the first attempt.
    pub retries: u32,
    pub max_repetitions: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 3,
            max_repetitions: 10,
        }
    }
}

/// SNMPv2c сессия поверх UDP.
pub struct SnmpClientV2c {
    session: Box<AsyncSession>,
    target: String,
    community: Vec<u8>,
    options: SessionOptions,
}

/// Why a GETBULK attempt produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    Timeout,
    /// A reply to an earlier request was read instead.
    StaleResponse,
}

impl Miss {
    fn as_str(self) -> &'static str {
        match self {
            Miss::Timeout => "timed out",
            Miss::StaleResponse => "kept receiving stale responses",
        }
    }
}

impl SnmpClientV2c {
    /// Открыть сессию к `target` (`host:port`).
    pub async fn connect(target: &str, community: &[u8], options: SessionOptions) -> Result<Self> {
        let session = open_session(target, community, options.timeout).await?;
        debug!(target: "snmp_table::snmp", %target, ?options, "session opened");

        Ok(Self {
            session,
            target: target.to_string(),
            community: community.to_vec(),
            options,
        })
    }

    /// One GETBULK, retransmitted on timeout.
    ///
    /// A reply carrying another request id means an earlier transmission was
    /// answered late. The request is then reissued from a fresh socket, so
    /// replies still in flight to the old one are never read.
    async fn get_bulk(&mut self, from: &Oid) -> Result<Vec<VarBind>> {
        let name = to_wire_oid(from).map_err(|e| Error::collection(&self.target, e))?;
        let names = [&name];
        let mut wait = self.options.timeout;
        let mut attempt = 0;

        loop {
            let request = self
                .session
                .getbulk(&names, 0, self.options.max_repetitions);

            let miss = match tokio::time::timeout(wait, request).await {
                Ok(Ok(pdu)) => {
                    return pdu
                        .varbinds
                        .map(|(oid, value)| {
                            let oid = Oid::parse(&oid.to_string())
                                .map_err(|e| Error::collection(&self.target, e))?;
                            Ok(VarBind::new(oid, from_wire_value(value)))
                        })
                        .collect();
                }
                Ok(Err(snmp2::Error::RequestIdMismatch)) => Miss::StaleResponse,
                Ok(Err(e)) => {
                    return Err(Error::collection(
                        &self.target,
                        format!("GETBULK {from} failed: {e:?}"),
                    ));
                }
                Err(_) => Miss::Timeout,
            };

            if attempt >= self.options.retries {
                return Err(Error::collection(
                    &self.target,
                    format!(
                        "GETBULK {from} {} after {} retransmissions",
                        miss.as_str(),
                        self.options.retries
                    ),
                ));
            }
            attempt += 1;

            match miss {
                Miss::Timeout => {
                    wait *= 2;
                    debug!(
                        target: "snmp_table::snmp",
                        oid = %from,
                        attempt,
                        ?wait,
                        "GETBULK timed out, retransmitting"
                    );
                }
                Miss::StaleResponse => {
                    debug!(
                        target: "snmp_table::snmp",
                        oid = %from,
                        attempt,
                        "stale response, retransmitting from a new socket"
                    );
                    self.session = open_session(&self.target, &self.community, self.options.timeout).await?;
                }
            }
        }
    }
}

async fn open_session(target: &str, community: &[u8], timeout: Duration) -> Result<Box<AsyncSession>> {
    let session = tokio::time::timeout(timeout, AsyncSession::new_v2c(target, community, 1))
        .await
        .map_err(|_| Error::collection(target, "Таймаут при создании SNMP сессии"))?
        .map_err(|e| Error::collection(target, format!("Не удалось создать SNMP сессию: {e}")))?;
    Ok(Box::new(session))
}

impl BulkWalker for SnmpClientV2c {
    fn target(&self) -> &str {
        &self.target
    }

    async fn bulk_walk<F>(&mut self, root: &Oid, mut on_each: F) -> Result<()>
    where
        F: FnMut(VarBind) -> Result<()>,
    {
        let mut cursor = root.clone();

        loop {
            let batch = self.get_bulk(&cursor).await?;
            if batch.is_empty() {
                return Ok(());
            }

            let mut last = None;
            for vb in batch {
                if matches!(vb.value, Value::EndOfMibView) || !vb.oid.starts_with(root) {
                    return Ok(());
                }
                last = Some(vb.oid.clone());
                trace!(target: "snmp_table::snmp", oid = %vb.oid, kind = vb.value.type_name(), "varbind");
                on_each(vb)?;
            }

            // Without progress the next GETBULK would return the same batch forever.
            match last {
                Some(next) if next > cursor => cursor = next,
                Some(next) => {
                    return Err(Error::collection(
                        &self.target,
                        format!("agent returned non-increasing OID {next} after {cursor}"),
                    ));
                }
                None => return Ok(()),
            }
        }
    }
}

fn to_wire_oid(oid: &Oid) -> std::result::Result<snmp2::Oid<'static>, String> {
    let parts: Vec<u64> = oid.arcs().iter().map(|&arc| u64::from(arc)).collect();
    snmp2::Oid::from(parts.as_slice()).map_err(|e| format!("cannot encode OID {oid}: {e:?}"))
}

fn from_wire_value(value: snmp2::Value<'_>) -> Value {
    use snmp2::Value as Wire;

    match value {
        Wire::Integer(v) => Value::Integer(v),
        Wire::OctetString(bytes) => Value::OctetString(bytes.to_vec()),
        Wire::Null => Value::Null,
        Wire::ObjectIdentifier(oid) => match Oid::parse(&oid.to_string()) {
            Ok(oid) => Value::ObjectIdentifier(oid),
            Err(_) => Value::Other("OBJECT IDENTIFIER"),
        },
        Wire::IpAddress(octets) => Value::IpAddress(octets),
        Wire::Counter32(v) => Value::Counter32(v),
        Wire::Unsigned32(v) => Value::Unsigned32(v),
        Wire::Timeticks(v) => Value::TimeTicks(v),
        Wire::Opaque(bytes) => Value::Opaque(bytes.to_vec()),
        Wire::Counter64(v) => Value::Counter64(v),
        Wire::NoSuchObject => Value::NoSuchObject,
        Wire::NoSuchInstance => Value::NoSuchInstance,
        Wire::EndOfMibView => Value::EndOfMibView,
        Wire::Boolean(_) => Value::Other("BOOLEAN"),
        _ => Value::Other("constructed"),
    }
}
