mod common;

use std::sync::Arc;

use device::{DriverConfig, GpioLedDriver, PlatformBus, PlatformDevice};
use gpio::{Level, LineRegistry, SimGpioChip};
use test_support::fdt::FdtBuilder;

fn led_node(builder: FdtBuilder, node: &str, compatible: &str, label: &str, pin: u32) -> FdtBuilder {
    builder
        .begin_node(node)
        .prop_str("compatible", compatible)
        .prop_str("label", label)
        .prop_u32("led_value", 0)
        .prop_u32("gpio_pin", pin)
        .prop_u32("buff_size", 3)
        .prop_u32("perm", 0o666)
        .end_node()
}

fn board_dtb() -> Vec<u8> {
    let builder = FdtBuilder::new().prop_str("model", "tera,board");
    let builder = led_node(builder, "led1", "tera,led1", "redled_1", 2);
    let builder = led_node(builder, "led2", "tera,led2", "redled_2", 3);
    builder
        .begin_node("chosen")
        .prop_str("bootargs", "console=ttyS0")
        .end_node()
        .build()
}

fn dt_setup() -> (Arc<SimGpioChip>, Arc<GpioLedDriver>, PlatformBus) {
    let chip = SimGpioChip::new("sim", 32);
    let driver = Arc::new(
        GpioLedDriver::new(DriverConfig::device_tree(), LineRegistry::new(chip.clone())).unwrap(),
    );
    let bus = PlatformBus::new();
    assert_eq!(bus.register_driver(driver.clone()), 0);
    (chip, driver, bus)
}

#[test]
fn test_enumerate_fdt_finds_compatible_nodes() {
    let devices = PlatformBus::enumerate_fdt(&board_dtb()).unwrap();
    let names: Vec<_> = devices.iter().map(|d| d.name()).collect();
    assert_eq!(names, ["led1", "led2"]);

    let led2 = &devices[1];
    assert_eq!(led2.compatible(), ["tera,led2"]);
    let props = led2.properties().unwrap();
    assert_eq!(props.read_string("label"), Some("redled_2"));
    assert_eq!(props.read_u32("gpio_pin"), Some(3));
    assert_eq!(props.read_u32("perm"), Some(0o666));
}

#[test]
fn test_enumerate_rejects_garbage() {
    assert!(PlatformBus::enumerate_fdt(&[0u8; 16]).is_err());
}

#[test]
fn test_device_tree_boot() {
    let (chip, driver, bus) = dt_setup();
    for dev in PlatformBus::enumerate_fdt(&board_dtb()).unwrap() {
        assert_eq!(bus.register_device(dev), 0);
    }
    assert!(bus.is_bound("led1"));
    assert!(bus.is_bound("led2"));
    assert!(chip.is_requested(2));
    assert!(chip.is_requested(3));
    assert_eq!(driver.sysfs().show("redled_2", "direction").as_deref(), Ok("1"));

    assert_eq!(bus.unregister_device("led1"), 0);
    assert!(!chip.is_requested(2));
    assert!(chip.is_requested(3));
    assert_eq!(bus.device_count(), 1);
}

#[test]
fn test_probe_failure_reports_errno() {
    let (chip, _, bus) = dt_setup();
    let mut props = common::led_props("redled_1", 2);
    props.remove("buff_size");
    let code = bus.register_device(PlatformDevice::with_properties("led1", props));
    assert_eq!(code, -22);
    assert!(!bus.is_bound("led1"));
    assert_eq!(chip.requested_count(), 0);

    // Detach of a device that never bound is a no-op.
    assert_eq!(bus.unregister_device("led1"), 0);
}

#[test]
fn test_id_table_matching_by_name() {
    let chip = SimGpioChip::new("sim", 8);
    let driver = Arc::new(
        GpioLedDriver::new(DriverConfig::id_table(), LineRegistry::new(chip.clone())).unwrap(),
    );
    let bus = PlatformBus::new();

    // Devices registered before the driver are probed on driver registration.
    assert_eq!(bus.register_device(PlatformDevice::named("LED_GREEN")), 0);
    assert_eq!(bus.register_device(PlatformDevice::named("BUZZER")), 0);
    assert!(!bus.is_bound("LED_GREEN"));
    assert_eq!(bus.register_driver(driver.clone()), 0);
    assert!(bus.is_bound("LED_GREEN"));
    assert!(!bus.is_bound("BUZZER"));
    assert_eq!(chip.level(4), Some(Level::Low));
    assert!(chip.is_requested(4));

    // Compatible strings do not match a name-table driver.
    let dt = PlatformDevice::with_properties("led1", common::led_props("redled_1", 2));
    assert_eq!(bus.register_device(dt), 0);
    assert!(!bus.is_bound("led1"));

    bus.unregister_driver();
    assert!(!bus.is_bound("LED_GREEN"));
    assert_eq!(chip.requested_count(), 0);
    assert_eq!(driver.registry().owned_count(), 0);
}

#[test]
fn test_duplicate_registration() {
    let (_, driver, bus) = dt_setup();
    assert_eq!(bus.register_driver(driver), -16);
    assert_eq!(bus.register_device(common::led("redled_1", 2)), 0);
    assert_eq!(bus.register_device(common::led("redled_1", 2)), -17);
}
