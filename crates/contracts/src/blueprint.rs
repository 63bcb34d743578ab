//! MergeBlueprint - Config Loader 输出
//!
//! 描述一次合并运行的完整配置：输入文件、通道选择、触发、输出、基准时间。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{
    clean_channel_name, dedupe_channels, BaselineCandidate, BaselineSource, CellValue, MergeConfig,
};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的合并运行配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MergeBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 输入文件
    #[validate(nested)]
    pub inputs: InputsConfig,

    /// 通道选择
    #[validate(nested)]
    pub channels: ChannelsConfig,

    /// 触发配置 (可选)
    #[serde(default)]
    #[validate(nested)]
    pub trigger: Option<TriggerConfig>,

    /// 输出配置
    #[validate(nested)]
    pub output: OutputConfig,

    /// 显式基准时间 (可选，通常由预扫描得到)
    #[serde(default)]
    pub baseline: Option<BaselineConfig>,
}

/// 输入文件配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InputsConfig {
    /// 按顺序合并的源文件
    #[validate(length(min = 1, message = "at least one input file is required"))]
    pub files: Vec<PathBuf>,

    /// 源文件分隔符
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// 通道选择
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChannelsConfig {
    /// 输出通道 (按输出顺序)
    #[validate(length(min = 1, message = "at least one channel must be selected"))]
    pub selected: Vec<String>,

    /// 时间戳通道
    #[serde(default)]
    pub timestamp: Option<String>,

    /// 毫秒计数通道
    #[serde(default)]
    pub tick: Option<String>,
}

/// 触发配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TriggerConfig {
    /// 触发通道名 (精确 → 后缀 → 子串 匹配)
    #[validate(length(min = 1, message = "trigger channel cannot be empty"))]
    pub channel: String,

    /// 触发阈值 (严格大于)
    pub threshold: f64,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputConfig {
    /// 输出文件路径
    pub path: PathBuf,

    /// 重采样频率 (Hz)，必须 > 0
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "frequency_hz must be > 0"))]
    pub frequency_hz: Option<f64>,

    /// 流式写出 (逐文件写入，不保留整次运行)
    #[serde(default)]
    pub streaming: bool,

    /// 输出分隔符
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// 显式基准值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// 原始值 (数字或文本)
    pub raw_value: ConfigValue,

    /// 来源通道类型
    #[serde(default)]
    pub source_kind: BaselineSource,
}

/// 配置文件中的原始值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
}

impl From<&ConfigValue> for CellValue {
    fn from(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Number(v) => CellValue::Number(*v),
            ConfigValue::Text(s) => CellValue::infer(s),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

impl MergeBlueprint {
    /// Build the engine-facing `MergeConfig`; channel names are cleaned the same way
    /// readers clean file channel names.
    pub fn to_merge_config(&self) -> MergeConfig {
        let selected = dedupe_channels(
            self.channels
                .selected
                .iter()
                .map(|name| clean_channel_name(name)),
        );

        MergeConfig {
            trigger_channel: self
                .trigger
                .as_ref()
                .map(|t| clean_channel_name(&t.channel)),
            trigger_threshold: self.trigger.as_ref().map(|t| t.threshold),
            output_frequency: self.output.frequency_hz,
            timestamp_channel: self
                .channels
                .timestamp
                .as_deref()
                .map(clean_channel_name),
            tick_channel: self.channels.tick.as_deref().map(clean_channel_name),
            selected_channels: selected,
            baseline_candidate: self.baseline.as_ref().map(|b| {
                BaselineCandidate::new(CellValue::from(&b.raw_value), b.source_kind)
            }),
            streaming: self.output.streaming,
        }
    }
}
