// Safeguard — CLI Command Handlers
//
// Each function handles one CLI subcommand against a shared Session and
// writes human-readable (or JSON) output. Secrets are printed only by
// `get --reveal`.

use std::io::Write;

use crate::error::SafeguardError;
use crate::session::{Session, StoreConfig, StoreLocation};
use crate::store::{Record, RecordFields, RecordPatch, RecordSummary};

use super::{Cli, Commands};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), SafeguardError> {
    let config = match cli.db {
        Some(path) => StoreConfig::at(path),
        None => StoreConfig::default(),
    };
    let session = Session::new(config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&session, cli.command, &mut out).await
}

async fn run(
    session: &Session,
    command: Commands,
    out: &mut impl Write,
) -> Result<(), SafeguardError> {
    match command {
        Commands::Add {
            service,
            username,
            secret,
        } => cmd_add(session, RecordFields::new(service, username, secret), out).await,
        Commands::List { json } => cmd_list(session, json, out).await,
        Commands::Search { query, json } => cmd_search(session, &query, json, out).await,
        Commands::Get { id, reveal } => cmd_get(session, &id, reveal, out).await,
        Commands::Update {
            id,
            service,
            username,
            secret,
        } => {
            let patch = RecordPatch {
                service,
                username,
                secret,
            };
            cmd_update(session, &id, patch, out).await
        }
        Commands::Delete { id } => cmd_delete(session, &id, out).await,
        Commands::Path => cmd_path(session, out),
    }
}

// ─── Add ─────────────────────────────────────────────────────────────────────

async fn cmd_add(
    session: &Session,
    fields: RecordFields,
    out: &mut impl Write,
) -> Result<(), SafeguardError> {
    let record = session.add(fields).await?;

    writeln!(out, "✓ Record stored")?;
    writeln!(out, "  ID:       {}", record.id)?;
    writeln!(out, "  Service:  {}", record.service)?;
    Ok(())
}

// ─── List / Search ───────────────────────────────────────────────────────────

async fn cmd_list(session: &Session, json: bool, out: &mut impl Write) -> Result<(), SafeguardError> {
    let records = session.list_all().await?;

    if records.is_empty() && !json {
        writeln!(out, "No records stored yet.")?;
        writeln!(
            out,
            "Add one with: safeguard add --service <name> --username <user> --secret <value>"
        )?;
        return Ok(());
    }

    print_records(&records, json, out)
}

async fn cmd_search(
    session: &Session,
    query: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<(), SafeguardError> {
    let records = session.search(query).await?;

    if records.is_empty() && !json {
        writeln!(out, "No records match '{}'.", query)?;
        return Ok(());
    }

    print_records(&records, json, out)
}

fn print_records(records: &[Record], json: bool, out: &mut impl Write) -> Result<(), SafeguardError> {
    if json {
        let summaries: Vec<RecordSummary> = records.iter().map(Record::summary).collect();
        serde_json::to_writer_pretty(&mut *out, &summaries)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Records ({}):\n", records.len())?;
    for record in records {
        writeln!(
            out,
            "  {} │ {:20} │ {:24} │ {}",
            record.id,
            record.service,
            record.username,
            record.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )?;
    }
    Ok(())
}

// ─── Get ─────────────────────────────────────────────────────────────────────

async fn cmd_get(
    session: &Session,
    id: &str,
    reveal: bool,
    out: &mut impl Write,
) -> Result<(), SafeguardError> {
    match session.get(id).await? {
        Some(record) => {
            writeln!(out, "Record details:\n")?;
            writeln!(out, "  ID:        {}", record.id)?;
            writeln!(out, "  Service:   {}", record.service)?;
            writeln!(out, "  Username:  {}", record.username)?;
            if reveal {
                writeln!(out, "  Secret:    {}", record.secret())?;
            } else {
                writeln!(out, "  Secret:    [REDACTED] (use --reveal)")?;
            }
            writeln!(out, "  Created:   {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
            writeln!(out, "  Updated:   {}", record.updated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        None => {
            writeln!(out, "Record not found: {}", id)?;
        }
    }

    Ok(())
}

// ─── Update ──────────────────────────────────────────────────────────────────

async fn cmd_update(
    session: &Session,
    id: &str,
    patch: RecordPatch,
    out: &mut impl Write,
) -> Result<(), SafeguardError> {
    if patch.is_empty() {
        return Err(SafeguardError::Other(
            "Nothing to update: pass --service, --username or --secret".to_string(),
        ));
    }

    match session.update(id, patch).await? {
        Some(record) => writeln!(out, "✓ Record {} updated", record.id)?,
        None => writeln!(out, "Record not found: {}", id)?,
    }

    Ok(())
}

// ─── Delete ──────────────────────────────────────────────────────────────────

async fn cmd_delete(session: &Session, id: &str, out: &mut impl Write) -> Result<(), SafeguardError> {
    if session.delete(id).await? {
        writeln!(out, "✓ Record {} deleted", id)?;
    } else {
        writeln!(out, "Record not found: {}", id)?;
    }

    Ok(())
}

// ─── Path ────────────────────────────────────────────────────────────────────

fn cmd_path(session: &Session, out: &mut impl Write) -> Result<(), SafeguardError> {
    match &session.config().location {
        StoreLocation::File(path) => writeln!(out, "{}", path.display())?,
        StoreLocation::Memory => writeln!(out, ":memory:")?,
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
