//! ハードウェアとタイミングの設定パラメータ

/// システムクロック [Hz]（HSI 16MHz ÷4 ×85 ÷2）
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// 制御周期タイマー（TIM6）設定
pub mod control {
    use lqg_bldc_control::config::params::DEFAULT_CONTROL_FREQUENCY_HZ;

    use super::SYSTEM_CLOCK_HZ;

    /// サンプリング周波数 [Hz]
    pub const FREQUENCY_HZ: u32 = DEFAULT_CONTROL_FREQUENCY_HZ;

    /// TIM6プリスケーラ（PSC=0、170MHzそのまま）
    pub const TIMER_PRESCALER: u16 = 0;

    /// TIM6自動リロード値（170MHz / 3kHz - 1 = 56665）
    pub const TIMER_RELOAD: u16 = (SYSTEM_CLOCK_HZ / FREQUENCY_HZ - 1) as u16;

    /// 1周期あたりのCPUサイクル数（サイクルバジェット）
    pub const CYCLE_BUDGET: u32 = SYSTEM_CLOCK_HZ / FREQUENCY_HZ;

    /// 起動時の目標速度 [rad/s]
    pub const INITIAL_TARGET_SPEED: f32 = 0.0;
}

/// PWM設定
pub mod pwm {
    use embassy_stm32::time::Hertz;

    /// PWM周波数（50kHz）（デフォルト値）
    pub const DEFAULT_FREQUENCY: Hertz = Hertz(50_000);

    /// デッドタイム（デフォルト値）
    pub const DEFAULT_DEAD_TIME: u16 = 1;
}

/// CAN設定
pub mod can {
    /// CANビットレート（250kbps）（デフォルト値）
    pub const DEFAULT_BITRATE: u32 = 250_000;

    /// ステータス送信周期 [ms]（10Hz）
    pub const STATUS_PERIOD_MS: u64 = 100;
}

/// テレメトリ（USART2）設定
pub mod telemetry {
    /// ボーレート
    pub const BAUDRATE: u32 = 115_200;

    /// 送信キューの深さ（行数）
    pub const QUEUE_DEPTH: usize = 32;
}

/// 診断ログ周期 [ms]
pub const DIAGNOSTICS_PERIOD_MS: u64 = 1_000;

/// 制御周期割り込みとHallエッジ割り込みの共通優先度（Priority 2 = 0x20）
///
/// 同一優先度なので2つのハンドラーは互いに割り込まない
pub const CONTROL_IRQ_PRIORITY: u8 = 0x20;

/// エンコーダーのオーバーフロー割り込み優先度（制御より低い）
pub const ENCODER_IRQ_PRIORITY: u8 = 0x40;
