//! 3相ハーフブリッジのゲート駆動
//!
//! TIM1のComplementaryPwmを使い、各相の上アーム（CHx）と下アーム（CHxN）を
//! 独立に有効/無効化します。6ステップ駆動では1相あたり片側のアームしか
//! スイッチングしないため、CCRは有効なアームのデューティ値だけを保持します。

use embassy_stm32::{
    pac, peripherals,
    timer::{complementary_pwm::ComplementaryPwm, Channel},
};
use lqg_bldc_control::{Leg, Phase, PhaseOutputSink, PhaseOutputs};

/// 6ステップ用3相ドライバー
pub struct PhaseDriver {
    pwm: ComplementaryPwm<'static, peripherals::TIM1>,
    max_duty: u16,
}

impl PhaseDriver {
    /// 新しいドライバーを作成（全アームOFFで開始）
    ///
    /// # 引数
    /// * `pwm` - PWMペリフェラル（TIM1、デッドタイム設定済み）
    pub fn new(pwm: ComplementaryPwm<'static, peripherals::TIM1>) -> Self {
        let max_duty = pwm.get_max_duty();
        let mut driver = Self { pwm, max_duty };
        driver.stop();
        driver
    }

    /// PWMの最大Duty値を取得
    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    /// 全アームをOFF
    pub fn stop(&mut self) {
        self.apply(&PhaseOutputs::OFF);
    }
}

fn channel(phase: Phase) -> Channel {
    match phase {
        Phase::A => Channel::Ch1,
        Phase::B => Channel::Ch2,
        Phase::C => Channel::Ch3,
    }
}

impl PhaseOutputSink for PhaseDriver {
    /// 上アーム: CCxE、下アーム: CCxNE で出力を切り替える
    ///
    /// CCxEのみ有効ならOCx、CCxNEのみ有効ならOCxNがOCxREFに従うので、
    /// どちらのアームも同じCCRでデューティが決まる
    fn set_duty(&mut self, phase: Phase, leg: Leg, duty: u16) {
        let on = duty > 0;
        if on {
            self.pwm.set_duty(channel(phase), duty.min(self.max_duty));
        }

        let n = phase.index();
        pac::TIM1.ccer().modify(|w| match leg {
            Leg::High => w.set_cce(n, on),
            Leg::Low => w.set_ccne(n, on),
        });
    }
}
