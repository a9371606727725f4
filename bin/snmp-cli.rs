// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use snmp_client_rs::{
    cfg::{
        cli::resolve_config_path,
        config::{Config, SecurityConfig},
        logger::init_logger,
    },
    client::{discover_engine_id, walk::WalkErrors, Client},
    oid::ObjectIdentifier,
    transport::UdpTransport,
    value::Value,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "snmp-cli", about = "Manual SNMP client exerciser")]
struct Cli {
    /// Path to the YAML target/security config file.
    #[arg(long, default_value = "config/target.yaml")]
    config: String,

    /// Path to the YAML logger config file.
    #[arg(long, default_value = "config/logger.yaml")]
    log_config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetches a single scalar value.
    Get { oid: String },
    /// Fetches the lexicographic successor of an OID.
    GetNext { oid: String },
    /// Sets a single OID to a typed value.
    Set { oid: String, kind: String, value: String },
    /// Walks one or more subtrees using plain GetNext requests.
    Walk { oids: Vec<String> },
    /// Walks one or more subtrees using GetBulk batches.
    BulkWalk {
        #[arg(long, default_value_t = 10)]
        max_repetitions: u32,
        oids: Vec<String>,
    },
    /// Assembles a conceptual table rooted at a base OID.
    Table { base: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = match resolve_config_path(&cli.log_config).and_then(|p| init_logger(p.to_str().context("non-utf8 log config path")?)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: structured logging disabled: {e:#}");
            None
        },
    };

    let cfg_path = resolve_config_path(&cli.config).context("failed to resolve config path")?;
    let cfg = Config::load_from_file(&cfg_path).context("failed to load config")?;
    let endpoint = cfg.endpoint()?;
    let transport = UdpTransport::new();

    let engine_id = match &cfg.security {
        SecurityConfig::V3 { .. } => match cfg.configured_engine_id()? {
            Some(id) => id,
            None => {
                info!(%endpoint, "discovering authoritative engine id");
                discover_engine_id(&transport, endpoint, cfg.runtime.timeout, cfg.runtime.retries).await?
            },
        },
        _ => Vec::new(),
    };

    let client_config = cfg.to_client_config(&engine_id)?;
    let client = Client::new(transport, endpoint, client_config);

    match cli.command {
        Command::Get { oid } => {
            let value = client.get(parse_oid(&oid)?).await?;
            println!("{} = {}", oid, format_value(&value));
        },
        Command::GetNext { oid } => {
            let vb = client.getnext(parse_oid(&oid)?).await?;
            println!("{} = {}", vb.oid, format_value(&vb.value));
        },
        Command::Set { oid, kind, value } => {
            let parsed = parse_value(&kind, &value)?;
            let result = client.set(parse_oid(&oid)?, parsed).await?;
            println!("{} = {}", oid, format_value(&result));
        },
        Command::Walk { oids } => {
            let roots = oids.iter().map(|o| parse_oid(o)).collect::<Result<Vec<_>>>()?;
            let mut stream = Box::pin(client.walk(roots, WalkErrors::Warn, CancellationToken::new()));
            while let Some(item) = stream.next().await {
                let vb = item?;
                println!("{} = {}", vb.oid, format_value(&vb.value));
            }
        },
        Command::BulkWalk { max_repetitions, oids } => {
            let roots = oids.iter().map(|o| parse_oid(o)).collect::<Result<Vec<_>>>()?;
            let mut stream = Box::pin(client.bulkwalk(roots, max_repetitions, WalkErrors::Warn, CancellationToken::new()));
            while let Some(item) = stream.next().await {
                let vb = item?;
                println!("{} = {}", vb.oid, format_value(&vb.value));
            }
        },
        Command::Table { base } => {
            let table = client.table(parse_oid(&base)?).await?;
            for row in table.rows {
                let index = match row.get("0") {
                    Some(Value::OctetString(s)) => String::from_utf8_lossy(s).into_owned(),
                    _ => String::new(),
                };
                let mut cols: Vec<_> = row.into_iter().filter(|(c, _)| c != "0").collect();
                cols.sort_by_key(|(c, _)| c.parse::<u32>().unwrap_or(u32::MAX));
                for (column, value) in cols {
                    println!("[{index}].{column} = {}", format_value(&value));
                }
            }
        },
    }

    Ok(())
}

fn parse_oid(s: &str) -> Result<ObjectIdentifier> {
    ObjectIdentifier::from_str_dotted(s).with_context(|| format!("'{s}' is not a dotted OID"))
}

fn parse_value(kind: &str, raw: &str) -> Result<Value> {
    Ok(match kind {
        "int" | "integer" => Value::Integer(raw.parse().context("invalid integer")?),
        "str" | "string" | "octetstring" => Value::OctetString(raw.as_bytes().to_vec()),
        "oid" => Value::ObjectIdentifier(parse_oid(raw)?),
        "ipaddress" => {
            let octets: Vec<u8> = raw.split('.').map(|p| p.parse().context("invalid IPv4 octet")).collect::<Result<_>>()?;
            let array: [u8; 4] = octets.try_into().map_err(|_| anyhow::anyhow!("ipaddress must have exactly 4 octets"))?;
            Value::IpAddress(array)
        },
        "counter32" => Value::Counter32(raw.parse().context("invalid counter32")?),
        "gauge32" => Value::Gauge32(raw.parse().context("invalid gauge32")?),
        "timeticks" => Value::TimeTicks(raw.parse().context("invalid timeticks")?),
        "counter64" => Value::Counter64(raw.parse().context("invalid counter64")?),
        other => bail!("unsupported set value type '{other}' (expected int, str, oid, ipaddress, counter32, gauge32, timeticks, counter64)"),
    })
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::OctetString(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => format!("0x{}", hex::encode(bytes)),
        },
        Value::Null => "NULL".to_string(),
        Value::ObjectIdentifier(oid) => oid.to_string(),
        Value::IpAddress(octets) => octets.iter().map(u8::to_string).collect::<Vec<_>>().join("."),
        Value::Counter32(v) => format!("Counter32: {v}"),
        Value::Gauge32(v) => format!("Gauge32: {v}"),
        Value::TimeTicks(v) => format!("Timeticks: {v}"),
        Value::Opaque(bytes) => format!("Opaque: 0x{}", hex::encode(bytes)),
        Value::Counter64(v) => format!("Counter64: {v}"),
        Value::NoSuchObject => "No Such Object available on this agent".to_string(),
        Value::NoSuchInstance => "No Such Instance currently exists".to_string(),
        Value::EndOfMibView => "End of MIB view".to_string(),
    }
}
