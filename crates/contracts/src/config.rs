//! Merge engine configuration contracts that can be shared across crates.

use crate::BaselineCandidate;

/// Engine-facing run configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeConfig {
    /// Trigger channel name (resolved by ranked lookup)
    pub trigger_channel: Option<String>,

    /// Trigger threshold (strictly-above counts as triggered)
    pub trigger_threshold: Option<f64>,

    /// Output frequency in Hz (None = no resampling)
    pub output_frequency: Option<f64>,

    /// Timestamp channel (any representation)
    pub timestamp_channel: Option<String>,

    /// Millisecond tick channel
    pub tick_channel: Option<String>,

    /// Output channels, in output order
    pub selected_channels: Vec<String>,

    /// Zero-reference captured by the pre-scan
    pub baseline_candidate: Option<BaselineCandidate>,

    /// Write each file immediately instead of holding the whole run
    pub streaming: bool,
}

impl MergeConfig {
    pub fn new<I, S>(selected_channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_channels: selected_channels.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, channel: impl Into<String>) -> Self {
        self.timestamp_channel = Some(channel.into());
        self
    }

    pub fn with_tick(mut self, channel: impl Into<String>) -> Self {
        self.tick_channel = Some(channel.into());
        self
    }

    pub fn with_trigger(mut self, channel: impl Into<String>, threshold: f64) -> Self {
        self.trigger_channel = Some(channel.into());
        self.trigger_threshold = Some(threshold);
        self
    }

    pub fn with_frequency(mut self, hz: f64) -> Self {
        self.output_frequency = Some(hz);
        self
    }

    pub fn with_candidate(mut self, candidate: BaselineCandidate) -> Self {
        self.baseline_candidate = Some(candidate);
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Trigger channel and threshold, when both are configured
    pub fn trigger(&self) -> Option<(&str, f64)> {
        match (&self.trigger_channel, self.trigger_threshold) {
            (Some(channel), Some(threshold)) => Some((channel.as_str(), threshold)),
            _ => None,
        }
    }

    /// Channel names that make up a file's reference frame
    pub fn reference_channels(&self) -> Vec<&str> {
        [
            self.timestamp_channel.as_deref(),
            self.tick_channel.as_deref(),
            self.trigger_channel.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Whether any time channel is configured
    pub fn has_time_channel(&self) -> bool {
        self.timestamp_channel.is_some() || self.tick_channel.is_some()
    }
}
