// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use sfsync_core::{Database, MappedObject, RemoteId};

use crate::cli::{LinksCommand, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::schema::{LinkJson, LinksOutputJson};

use super::{open_db, print_json};

pub fn run(config: &Config, cmd: LinksCommand) -> Result<()> {
    let db = open_db(config)?;
    match cmd {
        LinksCommand::List { mapping, failed, output } => {
            output_links(&list(&db, mapping.as_deref(), failed)?, output)
        }
        LinksCommand::Show { id, output } => {
            let link = db.get_mapped_object(id)?;
            match output {
                OutputFormat::Json => print_json(&LinkJson::from(&link)),
                OutputFormat::Text => {
                    for line in detail_lines(&link) {
                        println!("{line}");
                    }
                    Ok(())
                }
            }
        }
        LinksCommand::Find { salesforce_id, output } => output_links(&find(&db, &salesforce_id)?, output),
        LinksCommand::ForcePull { id, clear } => {
            set_force_pull(&db, id, !clear)?;
            if clear {
                println!("Cleared force pull on mapped object {id}");
            } else {
                println!("Mapped object {id} will be pulled on the next run regardless of timestamps");
            }
            Ok(())
        }
        LinksCommand::Delete { id } => {
            let link = delete(&db, id)?;
            println!(
                "Deleted mapped object {id} ({} {} <-> {})",
                link.entity_type_id, link.entity_id, link.salesforce_id
            );
            Ok(())
        }
    }
}

pub(crate) fn list(db: &Database, mapping: Option<&str>, failed_only: bool) -> Result<Vec<MappedObject>> {
    let mut links = db.list_mapped_objects(mapping)?;
    if failed_only {
        links.retain(|l| !l.last_sync_status);
    }
    Ok(links)
}

/// Links for a remote id in either its 15- or 18-character form.
pub(crate) fn find(db: &Database, salesforce_id: &str) -> Result<Vec<MappedObject>> {
    let id = RemoteId::parse(salesforce_id)?;
    Ok(db.find_mapped_objects_by_salesforce_id(&id)?)
}

pub(crate) fn set_force_pull(db: &Database, id: i64, force_pull: bool) -> Result<()> {
    db.set_force_pull(id, force_pull)?;
    tracing::info!(id, force_pull, "updated mapped object");
    Ok(())
}

/// Remove a link, returning it. Neither the local entity nor the remote
/// record is touched.
pub(crate) fn delete(db: &Database, id: i64) -> Result<MappedObject> {
    let link = db.get_mapped_object(id)?;
    db.delete_mapped_object(id)?;
    tracing::info!(id, mapping = %link.salesforce_mapping, sfid = %link.salesforce_id, "deleted mapped object");
    Ok(link)
}

pub(crate) fn format_link(link: &MappedObject) -> String {
    let status = if link.last_sync_status { "ok" } else { "failed" };
    let mut line = format!(
        "{:>6}  {} {} <-> {} ({}, last {} {})",
        link.id,
        link.entity_type_id,
        link.entity_id,
        link.salesforce_id,
        link.salesforce_mapping,
        link.last_sync_action,
        status
    );
    if link.force_pull {
        line.push_str(" [force pull]");
    }
    line
}

fn output_links(links: &[MappedObject], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(&LinksOutputJson {
            links: links.iter().map(LinkJson::from).collect(),
        }),
        OutputFormat::Text => {
            if links.is_empty() {
                println!("No mapped objects");
            }
            for link in links {
                println!("{}", format_link(link));
            }
            Ok(())
        }
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
}

pub(crate) fn detail_lines(link: &MappedObject) -> Vec<String> {
    let mut lines = vec![
        format!("[{}] {} {}", link.id, link.entity_type_id, link.entity_id),
        format!("Remote: {} (short {})", link.salesforce_id, link.salesforce_id.short()),
        format!("Mapping: {}", link.salesforce_mapping),
        format!("Created: {}", link.created_at.to_rfc3339()),
        format!("Entity updated: {}", timestamp(link.entity_updated)),
        format!(
            "Last sync: {} {} {}",
            timestamp(link.last_sync),
            link.last_sync_action,
            if link.last_sync_status { "ok" } else { "failed" }
        ),
    ];
    if let Some(message) = &link.revision_log_message {
        lines.push(format!("Error: {message}"));
    }
    if link.force_pull {
        lines.push("Force pull: yes".to_string());
    }
    lines
}

#[cfg(test)]
#[path = "links_tests.rs"]
mod tests;
