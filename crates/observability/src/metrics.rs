//! 合并运行指标
//!
//! `record_*` 函数写入全局 `metrics` recorder（安装 Prometheus 后可抓取）；
//! `RunMetricsAggregator` 在内存中汇总同一次运行，结束时输出摘要。

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use contracts::{BaselineOrigin, ResolvedBaseline};
use metrics::{counter, gauge, histogram};

/// 记录一个文件已读入并进入合并
pub fn record_file_processed(rows_read: usize) {
    counter!("session_merge_files_processed_total").increment(1);
    counter!("session_merge_rows_read_total").increment(rows_read as u64);
    histogram!("session_merge_file_rows").record(rows_read as f64);
}

/// 记录一个被跳过的文件（读取失败）
pub fn record_file_skipped(file: &str) {
    counter!("session_merge_files_skipped_total", "file" => file.to_string()).increment(1);
}

/// 记录写出的行数
pub fn record_rows_written(rows: usize) {
    counter!("session_merge_rows_written_total").increment(rows as u64);
}

/// 记录本次运行的基线
pub fn record_baseline(baseline: &ResolvedBaseline) {
    gauge!("session_merge_baseline_seconds").set(baseline.absolute_seconds);
    counter!(
        "session_merge_baseline_resolved_total",
        "origin" => baseline.origin.to_string()
    )
    .increment(1);
}

/// 记录运行结束
pub fn record_run_finished(status: RunStatus, elapsed: Duration) {
    counter!("session_merge_runs_total", "status" => status.as_str()).increment(1);
    histogram!("session_merge_run_duration_seconds").record(elapsed.as_secs_f64());
}

/// 运行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 运行指标聚合器
///
/// 在内存中聚合一次合并运行的指标，便于结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    /// 已合并文件数
    pub files_processed: u64,

    /// 跳过的文件（按顺序）
    pub files_skipped: Vec<String>,

    /// 读入行数
    pub rows_read: u64,

    /// 写出行数
    pub rows_written: u64,

    /// 每个文件的读入行数统计
    pub file_rows: RunningStats,

    /// 降级情况计数（按类型）
    pub degradations: BTreeMap<String, u64>,

    /// 本次运行的基线
    pub baseline: Option<ResolvedBaseline>,

    /// 运行状态
    pub status: RunStatus,

    /// 运行耗时
    pub elapsed: Option<Duration>,
}

impl RunMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 一个文件已读入
    pub fn on_file_read(&mut self, file: &str, rows_read: usize) {
        tracing::debug!(file, rows_read, "file read");
        self.files_processed += 1;
        self.rows_read += rows_read as u64;
        self.file_rows.push(rows_read as f64);
        record_file_processed(rows_read);
    }

    /// 流式模式每个文件上报一次，整体模式在结束时上报一次
    pub fn on_rows_written(&mut self, rows: usize) {
        self.rows_written += rows as u64;
        record_rows_written(rows);
    }

    pub fn on_file_skipped(&mut self, file: &str) {
        self.files_skipped.push(file.to_string());
        record_file_skipped(file);
    }

    /// 降级计数；`merge_degraded_total` 由引擎自行上报，这里只做内存汇总
    pub fn on_degradation(&mut self, kind: &str) {
        *self.degradations.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn on_baseline(&mut self, baseline: &ResolvedBaseline) {
        if self.baseline.is_none() {
            record_baseline(baseline);
        }
        self.baseline = Some(*baseline);
    }

    pub fn finish(&mut self, status: RunStatus, elapsed: Duration) {
        self.status = status;
        self.elapsed = Some(elapsed);
        record_run_finished(status, elapsed);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            status: self.status,
            files_processed: self.files_processed,
            files_skipped: self.files_skipped.clone(),
            rows_read: self.rows_read,
            rows_written: self.rows_written,
            file_rows: StatsSummary::from(&self.file_rows),
            degradations: self.degradations.clone(),
            baseline_seconds: self.baseline.map(|b| b.absolute_seconds),
            baseline_origin: self.baseline.map(|b| b.origin),
            elapsed: self.elapsed,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 运行摘要
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub status: RunStatus,
    pub files_processed: u64,
    pub files_skipped: Vec<String>,
    pub rows_read: u64,
    pub rows_written: u64,
    pub file_rows: StatsSummary,
    pub degradations: BTreeMap<String, u64>,
    pub baseline_seconds: Option<f64>,
    pub baseline_origin: Option<BaselineOrigin>,
    pub elapsed: Option<Duration>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Merge Summary ===")?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(
            f,
            "Files merged: {} (skipped: {})",
            self.files_processed,
            self.files_skipped.len()
        )?;
        writeln!(
            f,
            "Rows read: {}, rows written: {}",
            self.rows_read, self.rows_written
        )?;
        writeln!(f, "Rows per file: {}", self.file_rows)?;
        match (self.baseline_seconds, self.baseline_origin) {
            (Some(seconds), Some(origin)) => {
                writeln!(f, "Baseline: {seconds:.6} s ({origin})")?
            }
            _ => writeln!(f, "Baseline: unresolved")?,
        }
        if let Some(elapsed) = self.elapsed {
            writeln!(f, "Elapsed: {:.3} s", elapsed.as_secs_f64())?;
        }

        if !self.files_skipped.is_empty() {
            writeln!(f, "Skipped files:")?;
            for file in &self.files_skipped {
                writeln!(f, "  {file}")?;
            }
        }
        if !self.degradations.is_empty() {
            writeln!(f, "Degraded conditions:")?;
            for (kind, count) in &self.degradations {
                writeln!(f, "  {kind}: {count}")?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_tracks_run() {
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.on_file_read("a.csv", 100);
        aggregator.on_rows_written(10);
        aggregator.on_file_read("b.csv", 300);
        aggregator.on_rows_written(30);
        aggregator.on_file_skipped("c.csv");
        aggregator.on_degradation("alignment_length_mismatch");
        aggregator.on_degradation("alignment_length_mismatch");
        aggregator.on_baseline(&ResolvedBaseline::new(12.5, BaselineOrigin::PreScanned));
        aggregator.finish(RunStatus::Completed, Duration::from_millis(250));

        let summary = aggregator.summary();
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, vec!["c.csv"]);
        assert_eq!(summary.rows_read, 400);
        assert_eq!(summary.rows_written, 40);
        assert_eq!(summary.file_rows.count, 2);
        assert!((summary.file_rows.mean - 200.0).abs() < 1e-10);
        assert_eq!(summary.degradations.get("alignment_length_mismatch"), Some(&2));
        assert_eq!(summary.baseline_origin, Some(BaselineOrigin::PreScanned));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.on_file_read("a.csv", 100);
        aggregator.on_file_skipped("broken.csv");
        aggregator.finish(RunStatus::Cancelled, Duration::from_secs(1));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Status: cancelled"));
        assert!(output.contains("Files merged: 1 (skipped: 1)"));
        assert!(output.contains("Baseline: unresolved"));
        assert!(output.contains("  broken.csv"));
    }
}
