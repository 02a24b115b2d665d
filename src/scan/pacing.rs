//! 探测节奏控制
//! 以全局最小间隔闸门避免对目标站点造成压力或触发封禁；基于 tokio 时钟，测试中可暂停时间

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::PacingPolicy;

/// 节奏策略
#[async_trait]
pub trait Pacer: Send + Sync {
    /// 等待直到允许发起下一次探测
    async fn pace(&self);
}

/// 不限速
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pace(&self) {}
}

/// 全局最小间隔闸门：首个探测立即放行，其后相邻两次放行至少间隔 `interval`
#[derive(Debug)]
pub struct IntervalPacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl IntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // 预约下一个放行时刻
    async fn reserve(&self) -> Instant {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(at) if at > now => at,
            _ => now,
        };
        *next_slot = Some(slot + self.interval);
        slot
    }
}

#[async_trait]
impl Pacer for IntervalPacer {
    async fn pace(&self) {
        let slot = self.reserve().await;
        tokio::time::sleep_until(slot).await;
    }
}

/// 按配置创建节奏策略
pub fn pacer_for(policy: PacingPolicy) -> Arc<dyn Pacer> {
    match policy {
        PacingPolicy::None => Arc::new(NoPacing),
        PacingPolicy::MinInterval(interval) if interval.is_zero() => Arc::new(NoPacing),
        PacingPolicy::MinInterval(interval) => Arc::new(IntervalPacer::new(interval)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 暂停时钟下定时器按毫秒刻度对齐，允许 1 个刻度的误差
    fn assert_offsets(actual: &[Duration], expected_ms: &[u64]) {
        assert_eq!(actual.len(), expected_ms.len());
        for (got, want) in actual.iter().zip(expected_ms) {
            let want = Duration::from_millis(*want);
            assert!(
                *got >= want && *got <= want + Duration::from_millis(1),
                "offset {:?} not near {:?}",
                got,
                want
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_pacer_spaces_sequential_calls() {
        let pacer = IntervalPacer::new(Duration::from_millis(500));
        let start = Instant::now();
        let mut offsets = Vec::new();
        for _ in 0..3 {
            pacer.pace().await;
            offsets.push(start.elapsed());
        }
        assert_offsets(&offsets, &[0, 500, 1000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_pacer_is_shared_across_tasks() {
        let pacer = Arc::new(IntervalPacer::new(Duration::from_millis(200)));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pacer = Arc::clone(&pacer);
            handles.push(tokio::spawn(async move {
                pacer.pace().await;
                start.elapsed()
            }));
        }
        let mut offsets = Vec::new();
        for handle in handles {
            offsets.push(handle.await.unwrap());
        }
        offsets.sort();
        assert_offsets(&offsets, &[0, 200, 400, 600]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_does_not_accumulate_debt() {
        let pacer = IntervalPacer::new(Duration::from_millis(500));
        pacer.pace().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let before = Instant::now();
        pacer.pace().await;
        assert_offsets(&[before.elapsed()], &[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pacing_never_waits() {
        let pacer = pacer_for(PacingPolicy::None);
        let start = Instant::now();
        for _ in 0..5 {
            pacer.pace().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
