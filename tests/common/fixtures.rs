//! IF-MIB schema and a two-interface agent.

use snmp_table::metrics::{MetricSpec, MetricValueSpec};
use snmp_table::mib::MibLibrary;
use snmp_table::mib::library::ModuleDump;
use snmp_table::snmp::{Oid, Value, VarBind};

const IF_MIB: &str = include_str!("../../mibs/IF-MIB.yaml");

pub fn if_mib() -> MibLibrary {
    let mut library = MibLibrary::default();
    library.insert(ModuleDump::from_yaml(IF_MIB).unwrap());
    library
}

fn if_entry(column: u32, row: u32) -> Oid {
    Oid::from([1, 3, 6, 1, 2, 1, 2, 2, 1, column, row])
}

/// Full ifTable of an agent with `eth0` (row 1) and `eth1` (row 2),
/// returned column by column the way an agent walks it.
pub fn if_table_varbinds() -> Vec<VarBind> {
    let rows: [(u32, &str, [u8; 6], u32, u32); 2] = [
        (1, "eth0", [0x00, 0x1b, 0x21, 0x3c, 0x4d, 0x5e], 12345, 678),
        (2, "eth1", [0x00, 0x1b, 0x21, 0x3c, 0x4d, 0x5f], 99, 4_294_967_295),
    ];

    let mut out = Vec::new();
    for column in 1..=22 {
        for &(row, descr, mac, in_octets, out_octets) in &rows {
            let value = match column {
                1 => Value::Integer(row as i64),
                2 => Value::OctetString(descr.as_bytes().to_vec()),
                3 => Value::Integer(6),
                4 => Value::Integer(1500),
                5 => Value::Unsigned32(1_000_000_000),
                6 => Value::OctetString(mac.to_vec()),
                7 | 8 => Value::Integer(1),
                9 => Value::TimeTicks(4200),
                10 => Value::Counter32(in_octets),
                16 => Value::Counter32(out_octets),
                22 => Value::ObjectIdentifier(Oid::from([0, 0])),
                _ => Value::Counter32(0),
            };
            out.push(VarBind::new(if_entry(column, row), value));
        }
    }
    out
}

pub fn interface_specs() -> Vec<MetricSpec> {
    let value = |name: &str, label: &str| MetricValueSpec {
        name: name.to_string(),
        label: label.to_string(),
        unit: Some("bytes/sec".to_string()),
        is_counter: true,
    };
    vec![MetricSpec {
        prefix: "interface.{{.MetricValue}}".to_string(),
        key: "{{.ifDescr}}".to_string(),
        values: vec![value("ifInOctets", "In"), value("ifOutOctets", "Out")],
    }]
}
