//! TIM4ベースのHallセンサーインターフェース実装
//!
//! STM32のハードウェアHall Sensor Interface Mode（XORモード）を使用して、
//! 3つのHallセンサーのいずれかが変化するたびにCC1割り込みを発生させます。
//! 割り込みでは直前の制御出力を使って転流を行うだけで、推定器は進めません。
//!
//! ## ハードウェア構成
//! - TIM4_CH1 (PB6): Hall H1
//! - TIM4_CH2 (PB7): Hall H2
//! - TIM4_CH3 (PB8): Hall H3
//! - クロック: 170MHz (APB1)
//!
//! ## 動作原理
//! 1. 3つのHall入力がXORされてTI1に接続される（CR2.TI1S=1）
//! 2. TI1のエッジ検出がトリガーとして選択される（SMCR.TS=TI1F_ED）
//! 3. いずれかのHallエッジでTIM4_CCR1にキャプチャされ、CC1割り込みが発生
//! 4. 割り込みでHall状態を読み直し、転流テーブルに従ってPWMを更新

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_stm32::pac::{self, gpio::vals::Idr};
use lqg_bldc_control::{SectorCode, SectorSensor};

use crate::state;

/// Hallエッジ回数（診断用）
pub static HALL_EDGES: AtomicU32 = AtomicU32::new(0);

/// GPIOB直読みのHall入力
///
/// 読み出し時点のピン状態からセクターコードを作ります。
pub struct HallInputs {
    _private: (),
}

impl HallInputs {
    /// # Safety
    /// `init_hall_timer()`でPB6/PB7/PB8が設定済みであること
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl SectorSensor for HallInputs {
    #[inline(always)]
    fn read_sector(&mut self) -> SectorCode {
        let idr = pac::GPIOB.idr().read();
        SectorCode::from_halls(
            idr.idr(6) == Idr::HIGH, // PB6: H1
            idr.idr(7) == Idr::HIGH, // PB7: H2
            idr.idr(8) == Idr::HIGH, // PB8: H3
        )
    }
}

/// TIM4 Hall Sensor Interface の初期化
///
/// # Safety
/// PACを使用した直接的なレジスタ操作を含むため、unsafe
pub unsafe fn init_hall_timer() {
    let rcc = pac::RCC;
    let tim4 = pac::TIM4;
    let gpiob = pac::GPIOB;

    // 1. クロック有効化
    rcc.ahb2enr().modify(|w| w.set_gpioben(true)); // GPIOB
    rcc.apb1enr1().modify(|w| w.set_tim4en(true)); // TIM4

    // 2. GPIO設定（PB6/PB7/PB8をAF2、外部プルアップ前提でNOPULL）
    for pin in [6usize, 7, 8] {
        gpiob
            .moder()
            .modify(|w| w.set_moder(pin, pac::gpio::vals::Moder::ALTERNATE));
        gpiob
            .pupdr()
            .modify(|w| w.set_pupdr(pin, pac::gpio::vals::Pupdr::FLOATING));
        gpiob
            .ospeedr()
            .modify(|w| w.set_ospeedr(pin, pac::gpio::vals::Ospeedr::VERY_HIGH_SPEED));
    }
    gpiob.afr(0).modify(|w| {
        w.set_afr(6, 2); // PB6: TIM4_CH1
        w.set_afr(7, 2); // PB7: TIM4_CH2
    });
    gpiob.afr(1).modify(|w| w.set_afr(0, 2)); // PB8: TIM4_CH3（AFRH[0]）

    // 3. TIM4設定
    tim4.cr1().modify(|w| w.set_cen(false));
    tim4.psc().write_value(0);
    tim4.arr().write_value(pac::timer::regs::ArrCore(0xFFFF));

    // 4. Hall Sensor Interface Mode設定
    tim4.cr2().modify(|w| {
        w.set_ti1s(pac::timer::vals::Ti1s::XOR); // 3つのHall入力をXORしてTI1へ
    });
    tim4.smcr().modify(|w| {
        w.set_ts(pac::timer::vals::Ts::TI1F_ED); // TI1の両エッジをトリガーに
        w.set_sms(pac::timer::vals::Sms::RESET_MODE); // トリガーでカウンターをリセット
    });

    // 5. CH1でTRCをキャプチャ（8サイクルフィルタ）
    tim4.ccmr_input(0).modify(|w| {
        w.set_ccs(0, pac::timer::vals::CcmrInputCcs::TRC);
        w.set_icf(0, pac::timer::vals::FilterValue::FCK_INT_N8);
    });
    tim4.ccer().modify(|w| {
        w.set_cce(0, true);
        w.set_ccp(0, false);
    });

    // 6. CC1割り込みのみ有効化（オーバーフローは使わない）
    tim4.dier().modify(|w| w.set_ccie(0, true));

    // 7. NVIC設定
    // 制御周期割り込み（TIM6）と同じ優先度にして互いに割り込まないようにする
    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM4);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC
        .set_priority(pac::Interrupt::TIM4, crate::config::CONTROL_IRQ_PRIORITY);

    // 8. カウンタをリセットしてタイマー開始
    tim4.cnt().write_value(pac::timer::regs::CntCore(0));
    tim4.sr().write(|w| w.0 = 0);
    tim4.egr().write(|w| w.set_ug(true));
    tim4.cr1().modify(|w| {
        w.set_cen(true);
        w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY);
    });
}

/// TIM4割り込みハンドラー（Capture/Compare 1）
///
/// 転流を行ってからフラグをクリアします。
///
/// # Safety
/// 割り込みコンテキストで実行されるため、処理は最小限にする
#[inline(always)]
pub unsafe fn tim4_irq_handler() {
    let tim4 = pac::TIM4;

    if tim4.sr().read().ccif(0) {
        // 最新の制御出力で転流
        state::with_motor(|motor| motor.on_sector_change());
        HALL_EDGES.fetch_add(1, Ordering::Relaxed);

        tim4.sr().modify(|w| w.set_ccif(0, false));
    }
}

/// TIM4割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM4() {
    tim4_irq_handler();
}
