//! GPIO 资源管理
//!
//! 此 crate 负责 GPIO 线的申请、方向配置、电平读写与释放：
//!
//! - [`GpioChip`] trait - 平台 GPIO 控制器接口
//! - [`LineRegistry`] - 线所有权注册表，保证每条线至多一个持有者
//! - [`LineHandle`] - 一次成功申请的所有权凭证
//! - [`SimGpioChip`] - 内存模拟控制器，用于测试和开发
//!
//! 所有副作用都落在控制器上，注册表只记录所有权。

#![no_std]

extern crate alloc;

mod chip;
mod error;
mod registry;
mod sim;

pub use chip::{Direction, GpioChip, Level};
pub use error::GpioError;
pub use registry::{LineHandle, LineRegistry};
pub use sim::SimGpioChip;
