//! SNMPv2c agent on a real UDP socket, answering GETBULK from a fixed view.
//!
//! Just enough BER to parse a GetBulkRequest and build a Response.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use snmp_table::snmp::{Oid, Value, VarBind};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Misbehaviour injected by [`FakeAgent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fault {
    #[default]
    None,
    /// Ignore the first N datagrams.
    DropFirst(usize),
    /// Send the reply to the first datagram twice.
    DuplicateFirst,
    /// Answer every request with the requested OID itself.
    Stuck,
}

pub struct FakeAgent {
    addr: String,
    received: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl FakeAgent {
    pub async fn start(view: Vec<VarBind>, fault: Fault) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap().to_string();
        let view: BTreeMap<Oid, Value> = view.into_iter().map(|vb| (vb.oid, vb.value)).collect();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65_535];
            loop {
                let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                    continue;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if matches!(fault, Fault::DropFirst(k) if n <= k) {
                    continue;
                }
                let Some(request) = GetBulk::parse(&buf[..len]) else {
                    continue;
                };
                let reply = request.respond(&view, fault);
                let copies = if fault == Fault::DuplicateFirst && n == 1 { 2 } else { 1 };
                for _ in 0..copies {
                    let _ = socket.send_to(&reply, from).await;
                }
            }
        });

        Self { addr, received, task }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Datagrams seen so far, dropped ones included.
    pub fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct GetBulk {
    community: Vec<u8>,
    request_id: i64,
    max_repetitions: usize,
    oid: Oid,
}

impl GetBulk {
    fn parse(msg: &[u8]) -> Option<Self> {
        let (0x30, message, _) = tlv(msg)? else {
            return None;
        };
        let (_, _version, rest) = tlv(message)?;
        let (_, community, rest) = tlv(rest)?;
        let (0xa5, pdu, _) = tlv(rest)? else {
            return None;
        };
        let (_, request_id, rest) = tlv(pdu)?;
        let (_, _non_repeaters, rest) = tlv(rest)?;
        let (_, max_repetitions, rest) = tlv(rest)?;
        let (_, varbinds, _) = tlv(rest)?;
        let (_, varbind, _) = tlv(varbinds)?;
        let (0x06, oid, _) = tlv(varbind)? else {
            return None;
        };

        Some(Self {
            community: community.to_vec(),
            request_id: int(request_id),
            max_repetitions: int(max_repetitions).max(1) as usize,
            oid: decode_oid(oid)?,
        })
    }

    fn respond(&self, view: &BTreeMap<Oid, Value>, fault: Fault) -> Vec<u8> {
        let varbinds: Vec<(Oid, Value)> = if fault == Fault::Stuck {
            vec![(self.oid.clone(), Value::Integer(1))]
        } else {
            let mut next: Vec<(Oid, Value)> = view
                .range((Bound::Excluded(&self.oid), Bound::Unbounded))
                .take(self.max_repetitions)
                .map(|(oid, value)| (oid.clone(), value.clone()))
                .collect();
            if next.len() < self.max_repetitions {
                let last = next.last().map_or_else(|| self.oid.clone(), |(oid, _)| oid.clone());
                next.push((last, Value::EndOfMibView));
            }
            next
        };

        let mut list = Vec::new();
        for (oid, value) in &varbinds {
            list.extend(tagged(0x30, &[encode_oid(oid), encode_value(value)].concat()));
        }
        let pdu = [
            encode_int(0x02, self.request_id),
            encode_int(0x02, 0),
            encode_int(0x02, 0),
            tagged(0x30, &list),
        ]
        .concat();
        let message = [encode_int(0x02, 1), tagged(0x04, &self.community), tagged(0xa2, &pdu)].concat();
        tagged(0x30, &message)
    }
}

fn tlv(data: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = data.split_first()?;
    let (&first, mut rest) = rest.split_first()?;
    let len = if first < 0x80 {
        usize::from(first)
    } else {
        let n = usize::from(first & 0x7f);
        if n > 4 || rest.len() < n {
            return None;
        }
        let len = rest[..n].iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        rest = &rest[n..];
        len
    };
    if rest.len() < len {
        return None;
    }
    Some((tag, &rest[..len], &rest[len..]))
}

fn int(bytes: &[u8]) -> i64 {
    let init = if bytes.first().is_some_and(|b| b & 0x80 != 0) { -1 } else { 0 };
    bytes.iter().fold(init, |acc, &b| (acc << 8) | i64::from(b))
}

fn decode_oid(bytes: &[u8]) -> Option<Oid> {
    let mut subids = Vec::new();
    let mut acc = 0u32;
    for &b in bytes {
        acc = (acc << 7) | u32::from(b & 0x7f);
        if b & 0x80 == 0 {
            subids.push(acc);
            acc = 0;
        }
    }
    let (&first, rest) = subids.split_first()?;
    let head = (first / 40).min(2);
    let mut arcs = vec![head, first - head * 40];
    arcs.extend_from_slice(rest);
    Some(Oid::from_slice(&arcs))
}

fn tagged(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    match content.len() {
        len @ 0..=0x7f => out.push(len as u8),
        len @ 0x80..=0xff => out.extend([0x81, len as u8]),
        len => out.extend([0x82, (len >> 8) as u8, len as u8]),
    }
    out.extend_from_slice(content);
    out
}

fn encode_int(tag: u8, value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7
        && ((bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0))
    {
        start += 1;
    }
    tagged(tag, &bytes[start..])
}

fn encode_uint(tag: u8, value: u64) -> Vec<u8> {
    let mut content: Vec<u8> = value.to_be_bytes().into_iter().skip_while(|&b| b == 0).collect();
    if content.first().is_none_or(|b| b & 0x80 != 0) {
        content.insert(0, 0);
    }
    tagged(tag, &content)
}

fn encode_oid(oid: &Oid) -> Vec<u8> {
    let arcs = oid.arcs();
    let mut content = Vec::new();
    let (first, rest) = match arcs {
        [a, b, rest @ ..] => (a * 40 + b, rest),
        [a] => (a * 40, &[][..]),
        [] => (0, &[][..]),
    };
    for &arc in std::iter::once(&first).chain(rest) {
        let mut group = vec![(arc & 0x7f) as u8];
        let mut v = arc >> 7;
        while v > 0 {
            group.push((v & 0x7f) as u8 | 0x80);
            v >>= 7;
        }
        group.reverse();
        content.extend(group);
    }
    tagged(0x06, &content)
}

fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::Integer(v) => encode_int(0x02, *v),
        Value::OctetString(bytes) => tagged(0x04, bytes),
        Value::ObjectIdentifier(oid) => encode_oid(oid),
        Value::IpAddress(octets) => tagged(0x40, octets),
        Value::Counter32(v) => encode_uint(0x41, u64::from(*v)),
        Value::Unsigned32(v) => encode_uint(0x42, u64::from(*v)),
        Value::TimeTicks(v) => encode_uint(0x43, u64::from(*v)),
        Value::Opaque(bytes) => tagged(0x44, bytes),
        Value::Counter64(v) => encode_uint(0x46, *v),
        Value::NoSuchObject => vec![0x80, 0x00],
        Value::NoSuchInstance => vec![0x81, 0x00],
        Value::EndOfMibView => vec![0x82, 0x00],
        Value::Null | Value::Other(_) => vec![0x05, 0x00],
    }
}
