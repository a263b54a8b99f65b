//! Configuration module
//!
//! ボード固有のパラメータと、制御コアの設計定数を提供します。

pub mod params;

// params.rsから主要な定数を再エクスポート
pub use params::*;

// 制御コアの設定型
pub use lqg_bldc_control::config::ControlConfig;
