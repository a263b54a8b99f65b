//! ハードウェア初期化モジュール
//!
//! ペリフェラルの初期化ロジックを集約します。

use embassy_stm32::{bind_interrupts, can, peripherals, Config};

use crate::fmt::*;
use crate::{control_tim, encoder_tim, hall_tim};

// CANの割り込みをバインド
bind_interrupts!(pub struct Irqs {
    FDCAN1_IT0 => can::IT0InterruptHandler<peripherals::FDCAN1>;
    FDCAN1_IT1 => can::IT1InterruptHandler<peripherals::FDCAN1>;
});

/// RCCクロック設定を初期化
///
/// HSI → PLL（÷4 × 85 ÷ 2）で170MHz生成
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::mux::{ClockMux, Fdcansel};
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllQDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: Some(PllQDiv::DIV2), // FDCANクロック用
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R;

        let mut clock_mux = ClockMux::default();
        clock_mux.fdcansel = Fdcansel::PLL1_Q;
        config.rcc.mux = clock_mux;
    }
    config
}

/// TIM4 Hallセンサーインターフェース初期化
///
/// PB6=H1、PB7=H2、PB8=H3（XORモード）
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む
pub unsafe fn init_hall_sensor() {
    info!("Initializing TIM4 Hall Sensor Interface (XOR mode)...");
    hall_tim::init_hall_timer();
    info!("TIM4 Hall Sensor Interface initialized");
}

/// TIM3エンコーダーインターフェース初期化
///
/// PB4=A相、PB5=B相
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む
pub unsafe fn init_encoder() {
    info!("Initializing TIM3 quadrature encoder...");
    encoder_tim::init_encoder_timer();
    info!("TIM3 encoder initialized");
}

/// TIM6制御周期タイマー初期化と開始
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む。制御コア登録後に呼ぶこと
pub unsafe fn start_control_timer() {
    control_tim::init_control_timer();
    info!(
        "Control loop running at {} Hz",
        crate::config::control::FREQUENCY_HZ
    );
}
