//! GPIO LED 平台驱动
//!
//! 把平台总线上声明的 LED 设备绑定到 GPIO 输出线，并通过两种接口暴露：
//!
//! - 字节流：`/dev/<name>` 节点，写入首字节 `'0'`/`'1'` 控制电平
//! - 属性：sysfs 下的 `direction`（读写）与 `value`（只读）
//!
//! 组成：
//!
//! - [`DeviceCatalog`] - 设备身份到静态元数据的映射（名字表或设备树属性）
//! - [`GpioLedDriver`] - attach/detach 生命周期，持有全部设备描述符与 GPIO 线
//! - [`IoRouter`] - 按路由键或设备身份把读写分派到描述符
//! - [`Readable`] / [`Writable`] / [`AttributeExposed`] - attach 时按设备种类选定的能力
//! - [`PlatformBus`] - 匹配设备与驱动并调用 probe/remove

#![no_std]

extern crate alloc;

pub mod bus;
pub mod caps;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod lifecycle;
pub mod property;
pub mod router;

// Re-export bus
pub use bus::{PlatformBus, PlatformDevice, PlatformDriver};

// Re-export caps
pub use caps::{
    AttrSpec, AttributeExposed, Capabilities, LedAttributes, LedStream, Readable, Writable,
};

// Re-export catalog
pub use catalog::{DeviceCatalog, DeviceKind, DeviceMetadata};

// Re-export config
pub use config::{CatalogMode, DriverConfig};

// Re-export descriptor
pub use descriptor::{DeviceArena, DeviceDescriptor, DeviceState};

// Re-export error
pub use error::{AttachOutcome, DriverError};

// Re-export lifecycle
pub use lifecycle::GpioLedDriver;

// Re-export property
pub use property::{PropertyBag, PropertyValue};

// Re-export router
pub use router::IoRouter;
