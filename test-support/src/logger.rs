//! 捕获型日志后端
//!
//! `log` 的全局 logger 只能安装一次，测试并行执行时共享同一个缓冲区，
//! 因此断言应使用测试内唯一的关键字（例如设备标签）。

use std::sync::{Mutex, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// 一条被捕获的日志
#[derive(Debug, Clone)]
pub struct Captured {
    /// 日志级别
    pub level: Level,
    /// 格式化后的消息
    pub message: String,
}

/// 将所有日志记录到内存的 logger
pub struct CaptureLogger {
    records: Mutex<Vec<Captured>>,
}

impl CaptureLogger {
    const fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// 是否存在包含 `needle` 的日志
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.message.contains(needle))
    }

    /// 是否存在指定级别且包含 `needle` 的日志
    pub fn contains_at(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    /// 所有包含 `needle` 的日志
    pub fn matching(&self, needle: &str) -> Vec<Captured> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.message.contains(needle))
            .cloned()
            .collect()
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push(Captured {
            level: record.level(),
            message: format!("{}", record.args()),
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger::new();
static INIT: Once = Once::new();

/// 安装捕获 logger（幂等），返回全局实例
pub fn init() -> &'static CaptureLogger {
    INIT.call_once(|| {
        // Another test harness may have installed a logger first; then capture is unavailable.
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    &LOGGER
}
