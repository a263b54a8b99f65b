#![no_std]
#![no_main]

// ログマクロを全モジュールで使えるよう最初に宣言
mod fmt;

mod config;
mod control_tim;
mod cycle_budget;
mod encoder_tim;
mod hall_tim;
mod hardware;
mod leds;
mod motor_driver;
mod state;
mod tasks;
mod telemetry;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::{
    can,
    gpio::{Level, Output, OutputType, Speed},
    timer::{
        complementary_pwm::{ComplementaryPwm, ComplementaryPwmPin},
        low_level::CountingMode,
        simple_pwm::PwmPin,
    },
    usart::{self, UartTx},
};
use embassy_time::{Duration, Timer};
use lqg_bldc_control::MotorCore;

use config::ControlConfig;
use encoder_tim::EncoderCounter;
use fmt::*;
use hall_tim::HallInputs;
use hardware::Irqs;
use leds::SectorLeds;
use motor_driver::PhaseDriver;
use tasks::{can_task, diagnostics_task, telemetry_task};
use telemetry::QueueTelemetry;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // ハードウェア初期化
    let config = hardware::create_clock_config();
    let p = embassy_stm32::init(config);

    info!("═══════════════════════════════════════════════════════");
    info!("   LQG BLDC speed controller • STM32G431VB @ 170MHz");
    info!("   3kHz LQG loop + hall six-step commutation");
    info!("═══════════════════════════════════════════════════════");

    // セクター表示LED（アクティブLow、初期状態は消灯）
    let led1 = Output::new(p.PC13, Level::High, Speed::Low);
    let led2 = Output::new(p.PC14, Level::High, Speed::Low);
    let led3 = Output::new(p.PC15, Level::High, Speed::Low);
    let leds = SectorLeds::new(led1, led2, led3);

    // テレメトリUART初期化＆タスク起動（USART2 TX = PA2、DMA送信）
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = config::telemetry::BAUDRATE;
    let telemetry_tx = unwrap!(UartTx::new(p.USART2, p.PA2, p.DMA1_CH1, uart_config));
    spawner.spawn(telemetry_task(telemetry_tx)).unwrap();

    // CAN初期化＆タスク起動
    let mut can_configurator = can::CanConfigurator::new(p.FDCAN1, p.PA11, p.PA12, Irqs);
    can_configurator.properties().set_extended_filter(
        can::filter::ExtendedFilterSlot::_0,
        can::filter::ExtendedFilter::accept_all_into_fifo1(),
    );
    can_configurator.properties().set_standard_filter(
        can::filter::StandardFilterSlot::_0,
        can::filter::StandardFilter::accept_all_into_fifo0(),
    );
    can_configurator.set_bitrate(config::can::DEFAULT_BITRATE);
    let can = can_configurator.start(can::OperatingMode::NormalOperationMode);
    spawner.spawn(can_task(can)).unwrap();

    // PWM初期化（TIM1、3相補完PWM）
    // 各アームのON/OFFはPhaseDriverがCCERで個別に制御する
    let mut uvw_pwm = ComplementaryPwm::new(
        p.TIM1,
        Some(PwmPin::new(p.PE9, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(p.PE8, OutputType::PushPull)),
        Some(PwmPin::new(p.PE11, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(p.PE10, OutputType::PushPull)),
        Some(PwmPin::new(p.PE13, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(p.PE12, OutputType::PushPull)),
        None,
        None,
        config::pwm::DEFAULT_FREQUENCY,
        CountingMode::EdgeAlignedUp,
    );
    uvw_pwm.set_dead_time(config::pwm::DEFAULT_DEAD_TIME);
    let driver = PhaseDriver::new(uvw_pwm);
    info!("PWM initialized: max duty = {}", driver.max_duty());

    // エンコーダー・Hallセンサー初期化
    unsafe {
        hardware::init_encoder();
        hardware::init_hall_sensor();
    }

    // 制御コアを組み立てて登録
    let control_config = ControlConfig::default().with_max_duty(driver.max_duty());
    let motor = MotorCore::new(
        &control_config,
        unsafe { EncoderCounter::new() },
        unsafe { HallInputs::new() },
        driver,
        leds,
        &state::CONTROL_OUTPUT,
        QueueTelemetry,
    );
    state::install_motor(motor);

    // 起動時のHall状態で一度転流（u = 0 なので全アームOFFのまま）
    state::with_motor(|motor| motor.on_sector_change());

    // サイクル計測を有効化して制御周期を開始
    unsafe {
        cycle_budget::enable_cycle_counter();
        hardware::start_control_timer();
    }

    spawner.spawn(diagnostics_task()).unwrap();

    info!("Starting LQG speed control...");

    // メインループ（処理はすべて割り込みとタスクで行う）
    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
