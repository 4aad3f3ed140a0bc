//! 内存模拟 GPIO 控制器

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use sync::SpinLock;

use crate::{Direction, GpioChip, GpioError, Level};

/// 单条模拟线的状态
#[derive(Debug, Clone, Default)]
struct SimLine {
    /// 申请者标签，`None` 表示空闲
    label: Option<String>,
    /// 当前方向，未配置时为 `None`
    direction: Option<Direction>,
    /// 输出锁存电平
    latched: Level,
    /// 外部驱动的输入电平
    external: Option<Level>,
    /// 注入故障：拒绝申请
    reject_request: bool,
    /// 注入故障：不支持输出
    no_output: bool,
    /// 注入故障：不支持输入
    no_input: bool,
}

/// 内存模拟的 GPIO 控制器
///
/// 用于测试和开发。支持故障注入（拒绝申请、拒绝方向切换）
/// 以及从外部驱动输入电平。
///
/// 输入方向下，若外部未驱动该线，读取返回最后一次锁存的输出电平。
pub struct SimGpioChip {
    name: String,
    lines: SpinLock<Vec<SimLine>>,
}

impl SimGpioChip {
    /// 创建拥有 `ngpio` 条线的模拟控制器
    pub fn new(name: &str, ngpio: u32) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            lines: SpinLock::new(alloc::vec![SimLine::default(); ngpio as usize]),
        })
    }

    fn with_line<R>(&self, line: u32, f: impl FnOnce(&mut SimLine) -> R) -> Result<R, GpioError> {
        let mut lines = self.lines.lock();
        lines
            .get_mut(line as usize)
            .map(f)
            .ok_or(GpioError::InvalidLine(line))
    }

    /// 之后对该线的申请都将被平台拒绝
    ///
    /// 以下故障注入接口在线号越界时返回 [`GpioError::InvalidLine`]。
    pub fn reject_requests(&self, line: u32) -> Result<(), GpioError> {
        self.with_line(line, |l| l.reject_request = true)
    }

    /// 之后将该线配置为输出都会失败
    pub fn refuse_output(&self, line: u32) -> Result<(), GpioError> {
        self.with_line(line, |l| l.no_output = true)
    }

    /// 之后将该线配置为输入都会失败
    pub fn refuse_input(&self, line: u32) -> Result<(), GpioError> {
        self.with_line(line, |l| l.no_input = true)
    }

    /// 从外部驱动输入电平，`None` 表示悬空
    pub fn drive_input(&self, line: u32, level: Option<Level>) -> Result<(), GpioError> {
        self.with_line(line, |l| l.external = level)
    }

    /// 线上的锁存电平
    pub fn level(&self, line: u32) -> Option<Level> {
        self.with_line(line, |l| l.latched).ok()
    }

    /// 线的当前方向
    pub fn direction(&self, line: u32) -> Option<Direction> {
        self.with_line(line, |l| l.direction).ok().flatten()
    }

    /// 线是否处于已申请状态
    pub fn is_requested(&self, line: u32) -> bool {
        self.with_line(line, |l| l.label.is_some()).unwrap_or(false)
    }

    /// 申请者标签
    pub fn request_label(&self, line: u32) -> Option<String> {
        self.with_line(line, |l| l.label.clone()).ok().flatten()
    }

    /// 已申请的线数量
    pub fn requested_count(&self) -> usize {
        self.lines.lock().iter().filter(|l| l.label.is_some()).count()
    }
}

impl GpioChip for SimGpioChip {
    fn name(&self) -> &str {
        &self.name
    }

    fn ngpio(&self) -> u32 {
        self.lines.lock().len() as u32
    }

    fn request(&self, line: u32, label: &str) -> Result<(), GpioError> {
        self.with_line(line, |l| {
            if l.reject_request {
                return Err(GpioError::PlatformRejected(line));
            }
            if l.label.is_some() {
                return Err(GpioError::AlreadyOwned(line));
            }
            l.label = Some(label.to_string());
            Ok(())
        })?
    }

    fn free(&self, line: u32) {
        let freed = self.with_line(line, |l| {
            if l.label.take().is_none() {
                log::warn!("[Gpio] {}: free of unrequested line {}", self.name, line);
            }
            l.direction = None;
        });
        if let Err(e) = freed {
            log::warn!("[Gpio] {}: free failed: {}", self.name, e);
        }
    }

    fn direction_output(&self, line: u32, value: Level) -> Result<(), GpioError> {
        self.with_line(line, |l| {
            if l.no_output {
                return Err(GpioError::Unsupported(line));
            }
            l.direction = Some(Direction::Output);
            l.latched = value;
            Ok(())
        })?
    }

    fn direction_input(&self, line: u32) -> Result<(), GpioError> {
        self.with_line(line, |l| {
            if l.no_input {
                return Err(GpioError::Unsupported(line));
            }
            l.direction = Some(Direction::Input);
            Ok(())
        })?
    }

    fn set_value(&self, line: u32, value: Level) {
        if let Err(e) = self.with_line(line, |l| l.latched = value) {
            log::warn!("[Gpio] {}: set value failed: {}", self.name, e);
        }
    }

    fn get_value(&self, line: u32) -> Result<Level, GpioError> {
        self.with_line(line, |l| match (l.direction, l.external) {
            (Some(Direction::Input), Some(level)) => level,
            _ => l.latched,
        })
    }
}
