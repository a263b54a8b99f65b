//! TIM6による制御周期割り込み（3kHz）
//!
//! 周期ごとにエンコーダーをサンプリングし、LQGレギュレータを1ステップ進め、
//! 制御出力を公開してから転流とテレメトリ送信を行います。

use cortex_m::peripheral::DWT;
use embassy_stm32::pac;

use crate::config::control::{TIMER_PRESCALER, TIMER_RELOAD};
use crate::config::CONTROL_IRQ_PRIORITY;
use crate::cycle_budget;
use crate::state;

/// TIM6制御周期タイマーの初期化と開始
///
/// # Safety
/// PACを使用した直接的なレジスタ操作を含むため、unsafe
pub unsafe fn init_control_timer() {
    let rcc = pac::RCC;
    let tim6 = pac::TIM6;

    rcc.apb1enr1().modify(|w| w.set_tim6en(true));

    tim6.cr1().modify(|w| w.set_cen(false));
    tim6.psc().write_value(TIMER_PRESCALER);
    tim6.arr()
        .write_value(pac::timer::regs::ArrCore(TIMER_RELOAD as u32));
    tim6.egr().write(|w| w.set_ug(true)); // PSC/ARRを反映
    tim6.sr().write(|w| w.0 = 0);
    tim6.dier().modify(|w| w.set_uie(true));

    // Hallエッジ割り込み（TIM4）と同じ優先度
    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM6_DAC);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC
        .set_priority(pac::Interrupt::TIM6_DAC, CONTROL_IRQ_PRIORITY);

    tim6.cr1().modify(|w| {
        w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY);
        w.set_cen(true);
    });
}

/// TIM6割り込みハンドラー（Update）
///
/// # Safety
/// 割り込みコンテキストで実行される
#[inline(always)]
pub unsafe fn tim6_irq_handler() {
    let tim6 = pac::TIM6;

    if tim6.sr().read().uif() {
        tim6.sr().modify(|w| w.set_uif(false));

        let start = DWT::cycle_count();
        let target = state::TARGET_SPEED.load();
        if let Some(report) = state::with_motor(|motor| motor.update(target)) {
            state::MEASURED_SPEED.store(report.sample.speed_rad_s);
        }
        cycle_budget::record(DWT::cycle_count().wrapping_sub(start));
    }
}

/// TIM6割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM6_DAC() {
    tim6_irq_handler();
}
