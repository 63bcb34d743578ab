//! # Time Engine
//!
//! 多文件会话合并的时间统一引擎。
//!
//! 负责：
//! - 时间列单位识别 (datetime / duration / epoch ns / days / seconds / 时钟字符串)
//! - 触发点定位 (上升沿优先) 与触发通道模糊查找
//! - 全程唯一基准时间 (trigger → pre-scanned → first file → first row)
//! - 按文件顺序拼接参考帧与输出帧，长度不一致时截断
//! - 相对时间与固定频率最近邻重采样
//!
//! ## 使用示例
//!
//! ```ignore
//! use time_engine::MergeEngine;
//!
//! let engine = MergeEngine::new(config);
//! let segments = tables.iter().map(|t| engine.segment(t)).collect();
//! let outcome = engine.merge(segments);
//! for warning in outcome.warnings.iter() {
//!     // degraded, not fatal
//! }
//! ```

mod align;
mod baseline;
mod engine;
mod relative;
mod resample;
mod trigger;
mod unit;

// Re-exports
pub use align::{align_segments, build_segment, reconcile, AlignedRecord};
pub use baseline::{
    resolve_baseline, resolve_file_baseline, resolve_with_axis, BaselineInputs, TimeAxis,
};
pub use engine::{
    time_axes, time_axis, MergeEngine, MergeOutcome, RunWarnings, StreamChunk, StreamingMerger,
};
pub use relative::{derive_relative, fill_time_columns};
pub use resample::{select_nearest, select_on_grid};
pub use trigger::{locate_trigger, resolve_channel, ChannelMatch, MatchRank, TriggerHit, TriggerKind};
pub use unit::{candidate_seconds, detect_units, epoch_seconds, parse_clock, tick_seconds};

// Re-export contracts types
pub use contracts::{MergeConfig, ResolvedBaseline, SecondsSeries, UnitTag};
