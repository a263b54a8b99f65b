//! TIM3エンコーダーモードによる直交エンコーダーカウンター
//!
//! ## ハードウェア構成
//! - TIM3_CH1 (PB4, AF2): エンコーダーA相
//! - TIM3_CH2 (PB5, AF2): エンコーダーB相
//! - エンコーダーモード3（両チャネルの両エッジでカウント）
//!
//! カウンターはハードウェアで連続動作させ、制御周期ごとに前回値との差分を
//! 取ることで「読み出してクリア」と同じ結果を得ます。カウンターを書き換えないので
//! 読み出しとクリアの間にパルスを取りこぼすことがありません。

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_stm32::pac;
use lqg_bldc_control::PulseCounter;

/// カウンターのオーバーフロー/アンダーフロー回数（診断用）
pub static ENCODER_WRAPS: AtomicU32 = AtomicU32::new(0);

/// TIM3カウンターの差分読み出し
pub struct EncoderCounter {
    last: u16,
}

impl EncoderCounter {
    /// 現在のカウンター値を基準にして作成
    ///
    /// # Safety
    /// `init_encoder_timer()`でTIM3が設定済みであること
    pub unsafe fn new() -> Self {
        Self {
            last: read_counter(),
        }
    }
}

impl PulseCounter for EncoderCounter {
    #[inline(always)]
    fn take_displacement(&mut self) -> i16 {
        let now = read_counter();
        let displacement = now.wrapping_sub(self.last) as i16;
        self.last = now;
        displacement
    }
}

#[inline(always)]
fn read_counter() -> u16 {
    pac::TIM3.cnt().read().0 as u16
}

/// TIM3エンコーダーインターフェースの初期化
///
/// # Safety
/// PACを使用した直接的なレジスタ操作を含むため、unsafe
pub unsafe fn init_encoder_timer() {
    let rcc = pac::RCC;
    let tim3 = pac::TIM3;
    let gpiob = pac::GPIOB;

    // 1. クロック有効化
    rcc.ahb2enr().modify(|w| w.set_gpioben(true)); // GPIOB
    rcc.apb1enr1().modify(|w| w.set_tim3en(true)); // TIM3

    // 2. GPIO設定（PB4/PB5をAF2、プルアップ有効）
    for pin in [4usize, 5] {
        gpiob
            .moder()
            .modify(|w| w.set_moder(pin, pac::gpio::vals::Moder::ALTERNATE));
        gpiob
            .pupdr()
            .modify(|w| w.set_pupdr(pin, pac::gpio::vals::Pupdr::PULL_UP));
        gpiob.afr(0).modify(|w| w.set_afr(pin, 2));
    }

    // 3. TIM3設定（16ビットフルレンジ）
    tim3.cr1().modify(|w| w.set_cen(false));
    tim3.psc().write_value(0);
    tim3.arr().write_value(pac::timer::regs::ArrCore(0xFFFF));

    // 4. CH1/CH2をそれぞれTI1/TI2に入力（4サイクルフィルタ）
    tim3.ccmr_input(0).modify(|w| {
        w.set_ccs(0, pac::timer::vals::CcmrInputCcs::TI4); // CC1S = 01 (TI1にマップ)
        w.set_ccs(1, pac::timer::vals::CcmrInputCcs::TI4); // CC2S = 01 (TI2にマップ)
        w.set_icf(0, pac::timer::vals::FilterValue::FCK_INT_N4);
        w.set_icf(1, pac::timer::vals::FilterValue::FCK_INT_N4);
    });
    tim3.ccer().modify(|w| {
        w.set_ccp(0, false); // 非反転
        w.set_ccp(1, false);
    });

    // 5. エンコーダーモード3
    tim3.smcr()
        .modify(|w| w.set_sms(pac::timer::vals::Sms::ENCODER_MODE_3));

    // 6. 更新割り込み（カウンター折り返し）
    tim3.dier().modify(|w| w.set_uie(true));
    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM3);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC
        .set_priority(pac::Interrupt::TIM3, crate::config::ENCODER_IRQ_PRIORITY);

    // 7. カウンタをリセットしてタイマー開始
    tim3.cnt().write_value(pac::timer::regs::CntCore(0));
    tim3.egr().write(|w| w.set_ug(true));
    tim3.sr().write(|w| w.0 = 0);
    tim3.cr1().modify(|w| {
        w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY);
        w.set_cen(true);
    });
}

/// TIM3割り込みハンドラー（Update）
///
/// 速度は差分から求めるので、ここではフラグのクリアと回数の記録だけを行う
///
/// # Safety
/// 割り込みコンテキストで実行される
#[inline(always)]
pub unsafe fn tim3_irq_handler() {
    let tim3 = pac::TIM3;

    if tim3.sr().read().uif() {
        tim3.sr().modify(|w| w.set_uif(false));
        ENCODER_WRAPS.fetch_add(1, Ordering::Relaxed);
    }
}

/// TIM3割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM3() {
    tim3_irq_handler();
}
