//! 制御ステップのサイクル計測
//!
//! DWTサイクルカウンタで制御周期割り込み1回分の処理時間を測り、
//! 最悪値を保持します。

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::control::CYCLE_BUDGET;
use crate::fmt::*;

/// 計測した最悪サイクル数（`take_worst`でリセット）
static WORST_CYCLES: AtomicU32 = AtomicU32::new(0);

/// DWTサイクルカウンタを有効化
///
/// # Safety
/// Cortex-Mペリフェラルへの直接アクセスを含む
pub unsafe fn enable_cycle_counter() {
    let mut cp = cortex_m::Peripherals::steal();
    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();
}

/// 1ステップ分のサイクル数を記録
#[inline(always)]
pub fn record(cycles: u32) {
    WORST_CYCLES.fetch_max(cycles, Ordering::Relaxed);
}

/// 最悪値を取り出してリセット
pub fn take_worst() -> u32 {
    WORST_CYCLES.swap(0, Ordering::Relaxed)
}

/// 最悪値を周期バジェットと比較してログ出力
pub fn report() {
    let worst = take_worst();
    // 使用率を0.1%単位で表示
    let load_permille = (worst as u64 * 1000 / CYCLE_BUDGET as u64) as u32;

    if worst > CYCLE_BUDGET {
        warn!(
            "Control step overran: {} cycles (budget {})",
            worst, CYCLE_BUDGET
        );
    } else {
        debug!(
            "Control step worst: {} cycles ({}.{}% of budget)",
            worst,
            load_permille / 10,
            load_permille % 10
        );
    }
}
