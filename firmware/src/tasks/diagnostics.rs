//! 診断タスク
//!
//! 1秒ごとに制御ループの健全性（処理時間、テレメトリ破棄数、
//! Hallエッジ数、エンコーダー折り返し数）をログ出力します。

use core::sync::atomic::Ordering;

use embassy_time::{Duration, Ticker};

use crate::config::DIAGNOSTICS_PERIOD_MS;
use crate::cycle_budget;
use crate::encoder_tim::ENCODER_WRAPS;
use crate::fmt::*;
use crate::hall_tim::HALL_EDGES;
use crate::state::{self, CONTROL_OUTPUT, MEASURED_SPEED, TARGET_SPEED};

/// 診断タスク - 制御ループの状態を定期的にログ出力
#[embassy_executor::task]
pub async fn diagnostics_task() {
    info!("Diagnostics task started");

    let mut ticker = Ticker::every(Duration::from_millis(DIAGNOSTICS_PERIOD_MS));
    let mut last_dropped = 0u32;

    loop {
        ticker.next().await;

        cycle_budget::report();

        let dropped = state::with_motor(|motor| motor.dropped_telemetry()).unwrap_or(0);
        if dropped != last_dropped {
            warn!(
                "Telemetry queue full: {} lines dropped",
                dropped.wrapping_sub(last_dropped)
            );
            last_dropped = dropped;
        }

        info!(
            "Speed: target={} rad/s, measured={} rad/s, u={}",
            TARGET_SPEED.load(),
            MEASURED_SPEED.load(),
            CONTROL_OUTPUT.load()
        );
        debug!(
            "Hall edges={}, encoder wraps={}",
            HALL_EDGES.load(Ordering::Relaxed),
            ENCODER_WRAPS.load(Ordering::Relaxed)
        );
    }
}
