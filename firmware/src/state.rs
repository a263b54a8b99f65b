//! グローバル共有状態管理
//!
//! 割り込みハンドラーとタスク間で共有される状態を管理します。
//! 単一値はアトミックセル、制御コア本体はクリティカルセクションMutexで保護します。

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use lqg_bldc_control::{ControlCell, MotorCore};

use crate::config::control::INITIAL_TARGET_SPEED;
use crate::encoder_tim::EncoderCounter;
use crate::hall_tim::HallInputs;
use crate::leds::SectorLeds;
use crate::motor_driver::PhaseDriver;
use crate::telemetry::QueueTelemetry;

/// ボード上の制御コア
pub type Motor = MotorCore<
    'static,
    EncoderCounter,
    HallInputs,
    PhaseDriver,
    SectorLeds,
    QueueTelemetry,
>;

/// 目標速度 [rad/s]（CANタスクが書き込み、制御周期割り込みが読む）
pub static TARGET_SPEED: ControlCell = ControlCell::new(INITIAL_TARGET_SPEED);

/// 制御出力 u（制御周期割り込みだけが書き込む）
pub static CONTROL_OUTPUT: ControlCell = ControlCell::zero();

/// 最新の測定速度 [rad/s]（ステータス送信用）
pub static MEASURED_SPEED: ControlCell = ControlCell::zero();

/// 制御コア（初期化完了まではNone）
static MOTOR: Mutex<CriticalSectionRawMutex, RefCell<Option<Motor>>> =
    Mutex::new(RefCell::new(None));

/// 制御コアを登録
pub fn install_motor(motor: Motor) {
    MOTOR.lock(|cell| {
        cell.replace(Some(motor));
    });
}

/// 制御コアに排他的にアクセス
///
/// # Returns
/// * `Some(result)` - 登録済みの場合
/// * `None` - 未登録の場合
#[inline(always)]
pub fn with_motor<R>(f: impl FnOnce(&mut Motor) -> R) -> Option<R> {
    MOTOR.lock(|cell| cell.borrow_mut().as_mut().map(f))
}
