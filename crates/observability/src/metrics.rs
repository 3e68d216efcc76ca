//! 遥测链路指标收集模块
//!
//! 记录解码与分发阶段的运行指标 (接收阶段由 ingestion 直接上报)，并提供内存聚合用于退出时输出摘要。

use metrics::{counter, gauge, histogram};

/// 记录数据帧解码结果
pub fn record_frame_decoded(success: bool) {
    let status = if success { "applied" } else { "dropped" };
    counter!("efis_frames_decoded_total", "status" => status).increment(1);
}

/// 记录队列等待时间 (从接收到出队)
pub fn record_queue_latency_ms(latency_ms: f64) {
    histogram!("efis_queue_latency_ms").record(latency_ms);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("efis_queue_depth").set(depth as f64);
}

/// 记录总线参数分发
///
/// `bound = false` 表示参数名已知但没有绑定的仪表。
pub fn record_parameter_dispatched(parameter: &str, bound: bool) {
    let status = if bound { "applied" } else { "unbound" };
    counter!(
        "efis_parameters_dispatched_total",
        "parameter" => parameter.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录未知参数名 (被忽略)
pub fn record_parameter_ignored() {
    counter!("efis_parameters_ignored_total").increment(1);
}

/// 记录仪表当前值
pub fn record_instrument_value(instrument: &'static str, value: f64) {
    gauge!("efis_instrument_value", "instrument" => instrument).set(value);
}

/// 分发指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 成功应用的帧数
    pub frames_applied: u64,

    /// 解码失败被丢弃的帧数
    pub frames_dropped: u64,

    /// 应用的总线参数数
    pub parameters_applied: u64,

    /// 无绑定的总线参数数
    pub parameters_unbound: u64,

    /// 队列等待时间统计 (毫秒)
    pub queue_latency: RunningStats,

    /// 出队时的队列深度统计
    pub queue_depth: RunningStats,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一帧的处理结果
    pub fn record_frame(&mut self, applied: bool, latency_ms: f64, depth: usize) {
        if applied {
            self.frames_applied += 1;
        } else {
            self.frames_dropped += 1;
        }
        self.queue_latency.push(latency_ms);
        self.queue_depth.push(depth as f64);
    }

    /// 记录一个总线参数
    pub fn record_parameter(&mut self, bound: bool) {
        if bound {
            self.parameters_applied += 1;
        } else {
            self.parameters_unbound += 1;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total = self.frames_applied + self.frames_dropped;
        MetricsSummary {
            frames_applied: self.frames_applied,
            frames_dropped: self.frames_dropped,
            drop_rate: if total > 0 {
                self.frames_dropped as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            parameters_applied: self.parameters_applied,
            parameters_unbound: self.parameters_unbound,
            queue_latency_ms: StatsSummary::from(&self.queue_latency),
            queue_depth: StatsSummary::from(&self.queue_depth),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub frames_applied: u64,
    pub frames_dropped: u64,
    pub drop_rate: f64,
    pub parameters_applied: u64,
    pub parameters_unbound: u64,
    pub queue_latency_ms: StatsSummary,
    pub queue_depth: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Frames applied: {}", self.frames_applied)?;
        writeln!(
            f,
            "Frames dropped: {} ({:.2}%)",
            self.frames_dropped, self.drop_rate
        )?;
        writeln!(
            f,
            "Bus parameters: {} applied, {} unbound",
            self.parameters_applied, self.parameters_unbound
        )?;
        writeln!(f, "Queue latency (ms): {}", self.queue_latency_ms)?;
        writeln!(f, "Queue depth: {}", self.queue_depth)?;
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

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
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

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
