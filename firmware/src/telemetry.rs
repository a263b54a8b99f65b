//! テレメトリ送信キュー
//!
//! 制御周期割り込みから`try_send`で行を積み、USART2送信タスクが
//! DMAで送り出します。キューが満杯なら行は破棄され、割り込みは待ちません。

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use lqg_bldc_control::{TelemetryError, TelemetryLine, TelemetrySink};

use crate::config::telemetry::QUEUE_DEPTH;

/// 割り込み→送信タスク間のキュー
pub static TELEMETRY_QUEUE: Channel<CriticalSectionRawMutex, TelemetryLine, QUEUE_DEPTH> =
    Channel::new();

/// `TELEMETRY_QUEUE`へ非ブロッキングで積むシンク
pub struct QueueTelemetry;

impl TelemetrySink for QueueTelemetry {
    #[inline(always)]
    fn enqueue(&mut self, line: TelemetryLine) -> Result<(), TelemetryError> {
        TELEMETRY_QUEUE
            .try_send(line)
            .map_err(|_| TelemetryError::QueueFull)
    }
}
