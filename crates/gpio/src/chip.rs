//! GPIO 控制器抽象
//!
//! 平台相关的寄存器访问通过 [`GpioChip`] trait 与线所有权管理解耦，
//! 平台侧实现此 trait 并交给 [`crate::LineRegistry`] 使用。

use crate::GpioError;

/// 线的逻辑电平
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// 低电平 (0)
    #[default]
    Low,
    /// 高电平 (1)
    High,
}

impl Level {
    /// 由整数构造，非零视为高电平
    pub fn from_u32(value: u32) -> Self {
        if value == 0 { Level::Low } else { Level::High }
    }

    /// 转换为 ASCII 字符 `'0'` / `'1'`
    pub fn as_char(self) -> char {
        match self {
            Level::Low => '0',
            Level::High => '1',
        }
    }
}

/// 线的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 输入
    Input,
    /// 输出
    Output,
}

/// GPIO 控制器操作
///
/// 所有方法按线号寻址，对应一块扁平编号的 GPIO 控制器。
/// 实现必须可在多个上下文并发调用。
pub trait GpioChip: Send + Sync {
    /// 控制器名称
    fn name(&self) -> &str;

    /// 控制器管理的线数量，合法线号为 `0..ngpio`
    fn ngpio(&self) -> u32;

    /// 申请一条线
    fn request(&self, line: u32, label: &str) -> Result<(), GpioError>;

    /// 释放一条已申请的线
    fn free(&self, line: u32);

    /// 配置为输出并写入初始电平
    fn direction_output(&self, line: u32, value: Level) -> Result<(), GpioError>;

    /// 配置为输入
    fn direction_input(&self, line: u32) -> Result<(), GpioError>;

    /// 写入电平，没有失败路径
    fn set_value(&self, line: u32, value: Level);

    /// 读取当前电平
    fn get_value(&self, line: u32) -> Result<Level, GpioError>;
}
