//! 字符设备文件的 File trait 实现

use alloc::sync::Arc;

use crate::dev::{major, minor};
use crate::{
    AccessMode, CharDriver, DeviceClass, File, FsError, RoutingKey, UserBuffer, get_chrdev_driver,
};

/// 字符设备文件
///
/// 打开时由驱动分配 [`RoutingKey`]，丢弃时调用驱动的 `release`。
pub struct CharDeviceFile {
    /// 设备号
    dev: u64,

    /// 设备驱动（缓存）
    driver: Arc<dyn CharDriver>,

    /// 本会话的路由键
    key: RoutingKey,

    /// 打开模式
    access: AccessMode,
}

impl CharDeviceFile {
    /// 打开设备类下名为 `name` 的节点
    pub fn open(class: &DeviceClass, name: &str, access: AccessMode) -> Result<Self, FsError> {
        let node = class.lookup(name).ok_or(FsError::NotFound)?;
        Self::open_dev(node.dev, access)
    }

    /// 按设备号打开
    pub fn open_dev(dev: u64, access: AccessMode) -> Result<Self, FsError> {
        let driver = get_chrdev_driver(dev).ok_or(FsError::NoDevice)?;
        let key = driver.open(minor(dev))?;
        log::debug!(
            "[Chrdev] open {}:{} session {}",
            major(dev),
            minor(dev),
            key.session()
        );
        Ok(Self {
            dev,
            driver,
            key,
            access,
        })
    }

    /// 设备号
    pub fn dev(&self) -> u64 {
        self.dev
    }

    /// 本会话的路由键
    pub fn key(&self) -> RoutingKey {
        self.key
    }
}

impl File for CharDeviceFile {
    fn readable(&self) -> bool {
        self.access.readable()
    }

    fn writable(&self) -> bool {
        self.access.writable()
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, FsError> {
        if !self.readable() {
            return Err(FsError::PermissionDenied);
        }
        self.driver.read(self.key, buf)
    }

    fn write(&self, buf: &UserBuffer<'_>, count: usize) -> Result<usize, FsError> {
        if !self.writable() {
            return Err(FsError::PermissionDenied);
        }
        self.driver.write(self.key, buf, count)
    }

    fn access(&self) -> AccessMode {
        self.access
    }
}

impl Drop for CharDeviceFile {
    fn drop(&mut self) {
        self.driver.release(self.key);
    }
}
