//! 设备暴露层
//!
//! 此 crate 提供驱动向外暴露设备所需的最小 VFS 抽象：
//!
//! - [`dev`] - 设备号编码
//! - [`ChrdevRegion`] - 动态分配的字符设备号区间与驱动挂载
//! - [`DeviceClass`] - 设备类与 `/dev` 节点
//! - [`CharDeviceFile`] - 打开会话，携带驱动分配的 [`RoutingKey`]
//! - [`SysfsTree`] - 每设备的 sysfs 属性目录
//! - [`UserBuffer`] / [`copy_from_user`] - 用户缓冲区拷贝

#![no_std]

extern crate alloc;

pub mod dev;
pub mod error;
pub mod ops;

mod class;
mod devno;
mod file;
pub mod impls;
mod mode;
mod sysfs;
mod user;

// Re-export ops
pub use ops::{CharDriver, RoutingKey};

// Re-export error
pub use error::FsError;

// Re-export dev
pub use dev::{major, makedev, minor};

// Re-export file
pub use file::File;

// Re-export mode
pub use mode::{AccessMode, FileMode};

// Re-export class
pub use class::{DeviceClass, DeviceNode, class_create};

// Re-export devno
pub use devno::{
    ChrdevRegion, alloc_chrdev_region, chrdev_major, get_chrdev_driver, unregister_chrdev_region,
};

// Re-export sysfs
pub use sysfs::{ShowFn, StoreFn, SysfsAttr, SysfsTree};

// Re-export user
pub use user::{UserBuffer, copy_from_user};

// Re-export impls
pub use impls::CharDeviceFile;
