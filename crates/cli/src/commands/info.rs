//! `info` command implementation.

use anyhow::Result;
use contracts::{BaselineSource, MergeBlueprint, MergeConfig};
use ingestion::{prescan_baseline, ChannelCatalog, CsvSourceReader};
use serde::Serialize;
use tracing::{info, warn};

use super::{delimiter_byte, load_blueprint};
use crate::cli::InfoArgs;

/// Session info for JSON output
#[derive(Serialize)]
struct SessionInfo {
    files: Vec<FileInfo>,
    selected: Vec<ChannelInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    time_channels: Vec<ChannelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline_candidate: Option<CandidateInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    all_channels: Vec<ChannelInfo>,
}

#[derive(Serialize)]
struct FileInfo {
    path: String,
    readable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ChannelInfo {
    name: String,
    /// Number of readable files containing the channel
    files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_seen_in: Option<String>,
}

#[derive(Serialize)]
struct CandidateInfo {
    source_kind: BaselineSource,
    raw_value: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading session info");
    let blueprint = load_blueprint(&args.config)?;
    let reader = CsvSourceReader::with_delimiter(delimiter_byte(blueprint.inputs.delimiter)?);

    let session = build_session_info(&blueprint, &reader, args.all_channels);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_session_info(&session);
    }
    Ok(())
}

fn build_session_info(
    blueprint: &MergeBlueprint,
    reader: &CsvSourceReader,
    all_channels: bool,
) -> SessionInfo {
    let merge = blueprint.to_merge_config();
    let files = &blueprint.inputs.files;
    let catalog = ChannelCatalog::scan(reader, files);

    let file_info = files
        .iter()
        .map(|path| {
            let error = catalog
                .failed()
                .iter()
                .find(|(failed, _)| failed == path)
                .map(|(_, reason)| reason.clone());
            FileInfo {
                path: path.display().to_string(),
                readable: error.is_none(),
                error,
            }
        })
        .collect();

    let time_channels = merge
        .timestamp_channel
        .iter()
        .chain(merge.tick_channel.iter())
        .map(|name| channel_info(&catalog, name))
        .collect();

    SessionInfo {
        files: file_info,
        selected: merge
            .selected_channels
            .iter()
            .map(|name| channel_info(&catalog, name))
            .collect(),
        time_channels,
        baseline_candidate: candidate_info(reader, blueprint, &merge),
        all_channels: if all_channels {
            catalog
                .entries()
                .iter()
                .map(|e| channel_info(&catalog, &e.name))
                .collect()
        } else {
            Vec::new()
        },
    }
}

fn channel_info(catalog: &ChannelCatalog, name: &str) -> ChannelInfo {
    let entry = catalog.get(name);
    ChannelInfo {
        name: name.to_string(),
        files: entry.map_or(0, |e| e.file_count),
        first_seen_in: entry.map(|e| e.first_seen_in.clone()),
    }
}

/// Pre-scan the first input file, the same way a run does
fn candidate_info(
    reader: &CsvSourceReader,
    blueprint: &MergeBlueprint,
    merge: &MergeConfig,
) -> Option<CandidateInfo> {
    let first = blueprint.inputs.files.first()?;
    match prescan_baseline(reader, first, merge) {
        Ok(candidate) => candidate.map(|c| CandidateInfo {
            source_kind: c.source_kind,
            raw_value: c.raw_value.to_string(),
        }),
        Err(e) => {
            warn!(path = %first.display(), error = %e, "pre-scan failed");
            None
        }
    }
}

fn print_session_info(session: &SessionInfo) {
    println!("=== Session ===");
    println!("\nFiles ({}):", session.files.len());
    for file in &session.files {
        match &file.error {
            None => println!("  ✓ {}", file.path),
            Some(error) => println!("  ✗ {} ({error})", file.path),
        }
    }

    let readable = session.files.iter().filter(|f| f.readable).count();
    println!("\nSelected channels:");
    for channel in &session.selected {
        print_channel(channel, readable);
    }

    if !session.time_channels.is_empty() {
        println!("\nTime channels:");
        for channel in &session.time_channels {
            print_channel(channel, readable);
        }
    }

    match &session.baseline_candidate {
        Some(c) => println!("\nBaseline candidate: {} ({:?})", c.raw_value, c.source_kind),
        None => println!("\nBaseline candidate: none"),
    }

    if !session.all_channels.is_empty() {
        println!("\nAll channels ({}):", session.all_channels.len());
        for channel in &session.all_channels {
            print_channel(channel, readable);
        }
    }
}

fn print_channel(channel: &ChannelInfo, readable: usize) {
    if channel.files == 0 {
        println!("  ✗ {} (missing)", channel.name);
    } else {
        println!("  ✓ {} ({}/{} files)", channel.name, channel.files, readable);
    }
}
