//! テレメトリ送信タスク
//!
//! 制御周期割り込みが積んだ行をUSART2（DMA）で送信します。

use embassy_stm32::{mode::Async, usart::UartTx};

use crate::fmt::*;
use crate::telemetry::TELEMETRY_QUEUE;

/// テレメトリ送信タスク - キューから1行ずつ取り出して送信
#[embassy_executor::task]
pub async fn telemetry_task(mut tx: UartTx<'static, Async>) {
    info!("Telemetry task started");

    loop {
        let line = TELEMETRY_QUEUE.receive().await;
        if let Err(_e) = tx.write(&line).await {
            warn!("Telemetry UART write failed");
        }
    }
}
