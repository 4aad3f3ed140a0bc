#![allow(dead_code)]

use std::sync::Arc;

use device::{DriverConfig, GpioLedDriver, PlatformDevice, PropertyBag};
use gpio::{LineRegistry, SimGpioChip};

/// 设备树模式驱动，挂在 32 线的模拟控制器上
pub fn dt_driver() -> (Arc<SimGpioChip>, GpioLedDriver) {
    let chip = SimGpioChip::new("sim", 32);
    let driver = GpioLedDriver::new(DriverConfig::device_tree(), LineRegistry::new(chip.clone()))
        .unwrap();
    (chip, driver)
}

/// 名字表模式驱动
pub fn id_driver() -> (Arc<SimGpioChip>, GpioLedDriver) {
    let chip = SimGpioChip::new("sim", 32);
    let driver =
        GpioLedDriver::new(DriverConfig::id_table(), LineRegistry::new(chip.clone())).unwrap();
    (chip, driver)
}

/// 完整的设备树属性包
pub fn led_props(label: &str, pin: u32) -> PropertyBag {
    let compatible = if label == "redled_2" {
        "tera,led2"
    } else {
        "tera,led1"
    };
    PropertyBag::new()
        .with_str("compatible", compatible)
        .with_str("label", label)
        .with_u32("led_value", 0)
        .with_u32("gpio_pin", pin)
        .with_u32("buff_size", 3)
        .with_u32("perm", 0o666)
}

/// 设备树平台设备
pub fn led(label: &str, pin: u32) -> PlatformDevice {
    PlatformDevice::with_properties(label, led_props(label, pin))
}

/// 一页用户内存，前缀为 `data`
pub fn user_page(data: &[u8]) -> [u8; 64] {
    let mut page = [0u8; 64];
    page[..data.len()].copy_from_slice(data);
    page
}
