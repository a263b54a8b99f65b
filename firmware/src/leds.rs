//! セクター表示LED（PC13/PC14/PC15、アクティブLow）

use embassy_stm32::gpio::{Level, Output};
use lqg_bldc_control::{SectorCode, SectorIndicator};

/// Hall状態をそのまま3つのLEDに表示
pub struct SectorLeds {
    h1: Output<'static>,
    h2: Output<'static>,
    h3: Output<'static>,
}

impl SectorLeds {
    pub fn new(h1: Output<'static>, h2: Output<'static>, h3: Output<'static>) -> Self {
        Self { h1, h2, h3 }
    }
}

/// 点灯 = Low
#[inline(always)]
fn lit(on: bool) -> Level {
    if on {
        Level::Low
    } else {
        Level::High
    }
}

impl SectorIndicator for SectorLeds {
    fn show_sector(&mut self, code: SectorCode) {
        let (h1, h2, h3) = code.halls();
        self.h1.set_level(lit(h1));
        self.h2.set_level(lit(h2));
        self.h3.set_level(lit(h3));
    }
}
