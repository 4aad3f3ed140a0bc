//! 测试支持 crate
//!
//! 提供主机测试使用的辅助设施：
//!
//! - [`logger`] - 捕获 `log` 输出，便于断言被吸收的失败确实记录了日志
//! - [`fdt`] - 构造最小的扁平设备树二进制，用于设备树属性解析测试

pub mod fdt;
pub mod logger;
