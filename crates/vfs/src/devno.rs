//! 字符设备号区间
//!
//! 驱动通过 [`alloc_chrdev_region`] 动态获得一个 major 号和一段连续 minor 号，
//! 再用 [`ChrdevRegion::cdev_add`] 挂上驱动。[`unregister_chrdev_region`]
//! 或区间被丢弃时 major 号归还。

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::ptr;
use core::sync::atomic::{AtomicBool, Ordering};
use lazy_static::lazy_static;
use sync::{RwLock, SpinLock};

use crate::dev::{major, makedev, minor};
use crate::{CharDriver, FsError};

/// 动态分配的 major 号范围（与 Linux 的 CHRDEV_MAJOR_DYN_EXT 段一致）
pub mod chrdev_major {
    /// 动态分配的最小 major
    pub const DYN_MIN: u32 = 234;
    /// 动态分配的最大 major
    pub const DYN_MAX: u32 = 511;
}

lazy_static! {
    static ref CHRDEV_MAJORS: SpinLock<BTreeSet<u32>> = SpinLock::new(BTreeSet::new());
    static ref CHRDEV_REGIONS: RwLock<Vec<(u32, Weak<ChrdevRegion>)>> =
        RwLock::new(Vec::new());
}

/// 一段已注册的字符设备号
pub struct ChrdevRegion {
    name: String,
    major: u32,
    base_minor: u32,
    count: u32,
    cdev: RwLock<Option<Arc<dyn CharDriver>>>,
    registered: AtomicBool,
}

/// 分配字符设备号区间
///
/// 从高往低取第一个空闲的动态 major；`count` 为 0 时返回 `InvalidArgument`。
pub fn alloc_chrdev_region(
    base_minor: u32,
    count: u32,
    name: &str,
) -> Result<Arc<ChrdevRegion>, FsError> {
    if count == 0 || base_minor.checked_add(count).is_none() {
        return Err(FsError::InvalidArgument);
    }

    let major = {
        let mut majors = CHRDEV_MAJORS.lock();
        let free = (chrdev_major::DYN_MIN..=chrdev_major::DYN_MAX)
            .rev()
            .find(|m| !majors.contains(m))
            .ok_or(FsError::NoSpace)?;
        majors.insert(free);
        free
    };

    let region = Arc::new(ChrdevRegion {
        name: name.to_string(),
        major,
        base_minor,
        count,
        cdev: RwLock::new(None),
        registered: AtomicBool::new(true),
    });

    let mut regions = CHRDEV_REGIONS.write();
    regions.retain(|(_, weak)| weak.strong_count() > 0);
    regions.push((major, Arc::downgrade(&region)));

    log::info!(
        "[Chrdev] {}: major {} minors {}..{}",
        name,
        major,
        base_minor,
        base_minor + count
    );
    Ok(region)
}

/// 注销字符设备号区间
///
/// 卸下驱动，从全局表中移除并立即归还 major，不依赖区间的最后一个引用被丢弃。
/// 重复注销无副作用。
pub fn unregister_chrdev_region(region: &ChrdevRegion) {
    region.cdev_del();
    if !region.registered.swap(false, Ordering::AcqRel) {
        return;
    }
    CHRDEV_REGIONS
        .write()
        .retain(|(_, weak)| !ptr::eq(weak.as_ptr(), region));
    CHRDEV_MAJORS.lock().remove(&region.major);
    log::info!(
        "[Chrdev] {}: major {} unregistered",
        region.name,
        region.major
    );
}

/// 按设备号查找已挂载的驱动
pub fn get_chrdev_driver(dev: u64) -> Option<Arc<dyn CharDriver>> {
    let regions = CHRDEV_REGIONS.read();
    regions
        .iter()
        .filter(|(m, _)| *m == major(dev))
        .filter_map(|(_, weak)| weak.upgrade())
        .find(|region| region.contains(dev))
        .and_then(|region| region.driver())
}

impl ChrdevRegion {
    /// 区间名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// major 号
    pub fn major(&self) -> u32 {
        self.major
    }

    /// 起始 minor
    pub fn base_minor(&self) -> u32 {
        self.base_minor
    }

    /// minor 数量
    pub fn count(&self) -> u32 {
        self.count
    }

    /// 区间内第 `index` 个设备号
    pub fn dev(&self, index: u32) -> Option<u64> {
        (index < self.count).then(|| makedev(self.major, self.base_minor + index))
    }

    /// 设备号是否落在本区间
    pub fn contains(&self, dev: u64) -> bool {
        major(dev) == self.major
            && (self.base_minor..self.base_minor + self.count).contains(&minor(dev))
    }

    /// 挂载驱动
    pub fn cdev_add(&self, driver: Arc<dyn CharDriver>) -> Result<(), FsError> {
        let mut cdev = self.cdev.write();
        if cdev.is_some() {
            return Err(FsError::AlreadyExists);
        }
        *cdev = Some(driver);
        Ok(())
    }

    /// 卸载驱动
    pub fn cdev_del(&self) {
        self.cdev.write().take();
    }

    /// 当前挂载的驱动
    pub fn driver(&self) -> Option<Arc<dyn CharDriver>> {
        self.cdev.read().clone()
    }

    /// 区间是否仍占用其 major
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }
}

impl Drop for ChrdevRegion {
    fn drop(&mut self) {
        if self.registered.swap(false, Ordering::AcqRel) {
            CHRDEV_MAJORS.lock().remove(&self.major);
            log::info!("[Chrdev] {}: major {} released", self.name, self.major);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_count_rejected() {
        assert_eq!(
            alloc_chrdev_region(0, 0, "empty").err(),
            Some(FsError::InvalidArgument)
        );
    }

    #[test]
    fn test_major_released_on_drop() {
        let region = alloc_chrdev_region(0, 2, "transient").unwrap();
        let m = region.major();
        assert!(CHRDEV_MAJORS.lock().contains(&m));
        drop(region);
        assert!(!CHRDEV_MAJORS.lock().contains(&m));
    }

    #[test]
    fn test_unregister_leaves_table() {
        let region = alloc_chrdev_region(0, 1, "unregistered").unwrap();
        let dev0 = region.dev(0).unwrap();
        assert!(region.is_registered());

        unregister_chrdev_region(&region);
        assert!(!region.is_registered());
        assert!(region.driver().is_none());
        assert!(
            !CHRDEV_REGIONS
                .read()
                .iter()
                .any(|(_, weak)| ptr::eq(weak.as_ptr(), Arc::as_ptr(&region)))
        );
        assert!(get_chrdev_driver(dev0).is_none());

        // A second unregister and the final drop are both no-ops.
        unregister_chrdev_region(&region);
        drop(region);
    }

    #[test]
    fn test_dev_bounds() {
        let region = alloc_chrdev_region(0, 2, "bounds").unwrap();
        let dev0 = region.dev(0).unwrap();
        assert!(region.contains(dev0));
        assert_eq!(minor(dev0), 0);
        assert_eq!(region.dev(2), None);
        assert!(!region.contains(makedev(region.major(), 2)));
    }
}
