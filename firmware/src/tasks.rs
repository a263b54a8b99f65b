//! タスクモジュール
//!
//! 各タスクの実装を分離して管理します。

pub mod can;
pub mod diagnostics;
pub mod telemetry;

// タスク関数を再エクスポート
pub use can::can_task;
pub use diagnostics::diagnostics_task;
pub use telemetry::telemetry_task;
