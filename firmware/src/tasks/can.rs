//! CAN通信タスク
//!
//! 速度指令・非常停止の受信とステータス送信を行います。

use embassy_stm32::can;
use embassy_time::{Duration, Ticker};
use embedded_can::{Id, StandardId};
use lqg_bldc_control::can_protocol::{can_ids, encode_status, parse_command, CanCommand, MotorStatus};

use crate::config::can::STATUS_PERIOD_MS;
use crate::fmt::*;
use crate::state::{CONTROL_OUTPUT, MEASURED_SPEED, TARGET_SPEED};

/// CAN通信タスク - 速度指令処理とステータス送信
#[embassy_executor::task]
pub async fn can_task(can: can::Can<'static>) {
    let (mut tx, mut rx, _properties) = can.split();

    info!("CAN motor control task started");

    // ステータス送信用タイマー（100ms周期）
    let mut status_ticker = Ticker::every(Duration::from_millis(STATUS_PERIOD_MS));

    loop {
        // CANフレーム受信とステータス送信を並行処理
        embassy_futures::select::select(
            async {
                match rx.read().await {
                    Ok(envelope) => {
                        let frame = envelope.frame;
                        let id_raw = match frame.header().id() {
                            Id::Standard(std_id) => std_id.as_raw() as u32,
                            Id::Extended(ext_id) => ext_id.as_raw(),
                        };

                        match parse_command(id_raw, frame.data()) {
                            Some(CanCommand::SetSpeed(speed)) => TARGET_SPEED.store(speed),
                            Some(CanCommand::EmergencyStop) => TARGET_SPEED.store(0.0),
                            None => {}
                        }
                    }
                    Err(_e) => {
                        // バスエラーは次のフレームで回復する
                    }
                }
            },
            async {
                status_ticker.next().await;

                // モーターステータス送信 (ID 0x200)
                let status = MotorStatus {
                    speed_rad_s: MEASURED_SPEED.load(),
                    control_output: CONTROL_OUTPUT.load(),
                };
                let data = encode_status(&status);

                if let Some(std_id) = StandardId::new(can_ids::STATUS as u16) {
                    let id = Id::Standard(std_id);
                    if let Ok(frame) = can::frame::Frame::new_data(id, &data) {
                        let _ = tx.write(&frame).await;
                    }
                }
            },
        )
        .await;
    }
}
