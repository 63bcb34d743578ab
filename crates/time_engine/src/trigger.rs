//! Trigger location and trigger-channel lookup.

use serde::Serialize;
use tracing::{debug, info};

/// How the trigger index was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Previous sample at or below threshold, current strictly above
    RisingEdge,
    /// No edge anywhere; first sample strictly above threshold
    AboveThreshold,
}

/// Trigger position in the combined record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriggerHit {
    pub index: usize,
    pub kind: TriggerKind,
}

/// Find the trigger index in a numeric sequence.
///
/// The first row's previous value is seeded at `threshold - 1`, so a record that starts
/// above threshold has a rising edge at index 0. NaN never satisfies a comparison.
pub fn locate_trigger(values: &[f64], threshold: f64) -> Option<TriggerHit> {
    let seed = threshold - 1.0;

    let edge = values.iter().enumerate().find_map(|(i, &current)| {
        let previous = if i == 0 { seed } else { values[i - 1] };
        (previous <= threshold && current > threshold).then_some(i)
    });

    if let Some(index) = edge {
        return Some(TriggerHit {
            index,
            kind: TriggerKind::RisingEdge,
        });
    }

    values
        .iter()
        .position(|&v| v > threshold)
        .map(|index| TriggerHit {
            index,
            kind: TriggerKind::AboveThreshold,
        })
}

/// Rank of a channel-name match, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRank {
    Exact,
    Suffix,
    Substring,
}

/// Resolved channel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMatch {
    pub name: String,
    pub rank: MatchRank,
}

/// Ranked lookup of `wanted` among `known`: exact, then suffix, then substring.
///
/// Suffix and substring comparisons ignore case; within a rank the first known name wins.
pub fn resolve_channel<S: AsRef<str>>(wanted: &str, known: &[S]) -> Option<ChannelMatch> {
    let found = find_ranked(wanted, known);

    match &found {
        Some(m) if m.rank == MatchRank::Exact => {
            debug!(wanted, channel = %m.name, "channel matched exactly");
        }
        Some(m) => {
            info!(wanted, channel = %m.name, rank = ?m.rank, "channel resolved by fuzzy match");
        }
        None => debug!(wanted, "channel not found"),
    }
    found
}

fn find_ranked<S: AsRef<str>>(wanted: &str, known: &[S]) -> Option<ChannelMatch> {
    if wanted.is_empty() {
        return None;
    }

    let names = || known.iter().map(|n| n.as_ref());
    let hit = |name: &str, rank: MatchRank| ChannelMatch {
        name: name.to_string(),
        rank,
    };

    if let Some(name) = names().find(|n| *n == wanted) {
        return Some(hit(name, MatchRank::Exact));
    }

    let needle = wanted.to_lowercase();
    if let Some(name) = names().find(|n| n.to_lowercase().ends_with(&needle)) {
        return Some(hit(name, MatchRank::Suffix));
    }

    names()
        .find(|n| n.to_lowercase().contains(&needle))
        .map(|name| hit(name, MatchRank::Substring))
}
