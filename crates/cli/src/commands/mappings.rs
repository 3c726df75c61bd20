// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::str::FromStr;

use sfsync_core::{Error as CoreError, Mapping, MappingSet, RestProcessor, SyncTrigger};

use crate::cli::{MappingsCommand, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::schema::{MappingJson, MappingsOutputJson};

use super::{open_mappings, print_json};

pub fn run(config: &Config, cmd: MappingsCommand) -> Result<()> {
    match cmd {
        MappingsCommand::List { output } => list(&open_mappings(config)?, output),
        MappingsCommand::Show { id, output } => show(&open_mappings(config)?, &id, output),
        MappingsCommand::Check => {
            let mappings = open_mappings(config)?;
            for line in check_report(&mappings, &config.mappings_path()) {
                println!("{line}");
            }
            Ok(())
        }
        MappingsCommand::Triggers { id, enable, disable } => {
            let mapping = set_triggers(&config.mappings_path(), &id, &enable, &disable)?;
            println!("{}: {}", mapping.id, trigger_names(&mapping));
            Ok(())
        }
    }
}

fn trigger_names(mapping: &Mapping) -> String {
    if mapping.sync_triggers.is_empty() {
        "no triggers".to_string()
    } else {
        mapping.sync_triggers.to_string()
    }
}

fn summary_line(mapping: &Mapping) -> String {
    format!(
        "{}: {}/{} -> {} [{}]",
        mapping.id,
        mapping.drupal_entity_type,
        mapping.drupal_bundle,
        mapping.salesforce_object_type,
        trigger_names(mapping)
    )
}

fn list(mappings: &MappingSet, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(&MappingsOutputJson {
            mappings: mappings.iter().map(MappingJson::from).collect(),
        }),
        OutputFormat::Text => {
            if mappings.is_empty() {
                println!("No mappings");
            }
            for mapping in mappings.iter() {
                println!("{}", summary_line(mapping));
            }
            Ok(())
        }
    }
}

fn find<'a>(mappings: &'a MappingSet, id: &str) -> Result<&'a Mapping> {
    mappings.get(id).ok_or_else(|| CoreError::MappingNotFound(id.to_string()).into())
}

fn show(mappings: &MappingSet, id: &str, output: OutputFormat) -> Result<()> {
    let mapping = find(mappings, id)?;
    match output {
        OutputFormat::Json => print_json(&MappingJson::from(mapping)),
        OutputFormat::Text => {
            for line in detail_lines(mapping) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

pub(crate) fn detail_lines(mapping: &Mapping) -> Vec<String> {
    let mut lines = vec![
        format!("[{}] {}", mapping.id, mapping.label),
        format!("Local: {}/{}", mapping.drupal_entity_type, mapping.drupal_bundle),
        format!("Remote: {}", mapping.salesforce_object_type),
        format!("Triggers: {}", trigger_names(mapping)),
    ];
    if let Some(record_type) = &mapping.salesforce_record_type {
        lines.push(format!("Record type: {record_type}"));
    }
    if let Some(key) = &mapping.key {
        lines.push(format!("Key: {key}"));
    }
    if mapping.does_push() {
        lines.push(format!(
            "Push: processor {}, weight {}, limit {}, retries {}, every {}s{}{}",
            mapping.push_processor,
            mapping.weight,
            mapping.push_limit,
            mapping.push_retries,
            mapping.push_frequency,
            if mapping.is_async { ", async" } else { "" },
            if mapping.push_standalone { ", standalone" } else { "" },
        ));
    }
    if mapping.does_pull() {
        lines.push(format!("Pull: by {}, every {}s", mapping.pull_trigger_date, mapping.pull_frequency));
        if let Some(clause) = &mapping.pull_where_clause {
            lines.push(format!("Pull where: {clause}"));
        }
    }
    if !mapping.field_mappings.is_empty() {
        lines.push(String::new());
        lines.push("Fields:".to_string());
        for field in &mapping.field_mappings {
            let direction = match (field.push(), field.pull()) {
                (true, true) => "<->",
                (true, false) => "->",
                (false, true) => "<-",
                (false, false) => "--",
            };
            lines.push(format!("  {} {direction} {}", field.field_type(), field.salesforce_field()));
        }
    }
    lines
}

/// Lines describing a mapping set that loaded and validated.
pub(crate) fn check_report(mappings: &MappingSet, path: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for mapping in mappings.iter() {
        if mapping.does_push() && mapping.push_processor != RestProcessor::NAME {
            lines.push(format!(
                "warning: mapping {} uses push processor '{}'; it must be registered by the runner",
                mapping.id, mapping.push_processor
            ));
        }
        if mapping.sync_triggers.is_empty() {
            lines.push(format!("warning: mapping {} has no sync triggers", mapping.id));
        }
    }
    lines.push(format!("ok: {} mapping(s) in {}", mappings.len(), path.display()));
    lines
}

fn parse_triggers(names: &[String]) -> Result<Vec<SyncTrigger>> {
    names.iter().map(|n| SyncTrigger::from_str(n.trim()).map_err(Error::from)).collect()
}

/// Load the file, replace one mapping's triggers and save the new version.
pub(crate) fn set_triggers(path: &Path, id: &str, enable: &[String], disable: &[String]) -> Result<Mapping> {
    let enable = parse_triggers(enable)?;
    let disable = parse_triggers(disable)?;
    if let Some(both) = enable.iter().find(|t| disable.contains(t)) {
        return Err(CoreError::InvalidInput(format!("trigger {both} is both enabled and disabled")).into());
    }
    if !path.is_file() {
        return Err(Error::MappingsNotFound(path.display().to_string()));
    }

    let mappings = MappingSet::load(path)?;
    let mapping = find(&mappings, id)?;
    let mut triggers = mapping.sync_triggers;
    for trigger in enable {
        triggers.insert(trigger);
    }
    for trigger in disable {
        triggers.remove(trigger);
    }

    let updated = mapping.clone().with_triggers(triggers);
    mappings.with_mapping(updated.clone())?.save(path)?;
    tracing::info!(mapping = %updated.id, triggers = %updated.sync_triggers, "updated sync triggers");
    Ok(updated)
}

#[cfg(test)]
#[path = "mappings_tests.rs"]
mod tests;
