//! 视频 ↔ 文本一致性检查
//!
//! 从事件描述中抽取声明，与视频抽帧检测的统计结果比对，给出 0-100 的一致性分数。

pub mod api;
pub mod core;

use std::sync::Once;

static LOGGING: Once = Once::new();

pub fn init_logging() {
    LOGGING.call_once(|| {
        #[cfg(target_os = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(log::LevelFilter::Debug)
                    .with_tag("evidence_check_rust"),
            );
        }

        #[cfg(not(target_os = "android"))]
        {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("info"),
            )
            .try_init();
        }
    });
}
