//! 驱动卸载后的行为
//!
//! 独立的测试二进制：断言依赖动态 major 的分配顺序。

mod common;

use device::{DeviceState, DriverError, PlatformDevice};
use vfs::{AccessMode, CharDeviceFile, CharDriver, FsError, alloc_chrdev_region, get_chrdev_driver};

use common::id_driver;

#[test]
fn test_exit_is_terminal() {
    let (chip, driver) = id_driver();
    driver.attach(&PlatformDevice::named("LED_RED")).unwrap();
    let file = CharDeviceFile::open(driver.class(), "LED_RED", AccessMode::WriteOnly).unwrap();
    let major = driver.region().major();
    let dev0 = driver.region().dev(0).unwrap();

    driver.exit();
    assert!(driver.is_exited());
    assert!(!driver.region().is_registered());
    assert!(get_chrdev_driver(dev0).is_none());
    assert!(driver.router().sessions().is_empty());
    drop(file);

    // The major is free again while the driver object is still alive.
    let other = alloc_chrdev_region(0, 1, "other").unwrap();
    assert_eq!(other.major(), major);

    assert_eq!(
        driver.attach(&PlatformDevice::named("LED_RED")),
        Err(DriverError::NoDevice)
    );
    assert_eq!(driver.state(0), Some(DeviceState::Unmatched));
    assert!(!chip.is_requested(2));
    assert_eq!(chip.requested_count(), 0);
    assert!(driver.class().is_empty());
    assert_eq!(driver.router().open(0), Err(FsError::NoDevice));

    // A second exit leaves the reused major alone.
    driver.exit();
    assert!(other.is_registered());
    drop(driver);
    assert!(other.is_registered());
    let next = alloc_chrdev_region(0, 1, "next").unwrap();
    assert_ne!(next.major(), other.major());
}
