//! 平台总线
//!
//! 保存已注册的平台设备与一个平台驱动，负责匹配并调用驱动的 probe/remove。
//! 匹配顺序与 Linux `platform_match` 相同：先 compatible，再设备名。
//! 设备树中带 `compatible` 的节点可通过 [`PlatformBus::enumerate_fdt`] 转换为平台设备。

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use fdt::Fdt;
use fdt::node::FdtNode;
use sync::RwLock;

use crate::error::{AttachOutcome, DriverError};
use crate::property::PropertyBag;

/// 平台设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    name: String,
    compatible: Vec<String>,
    of_node: Option<PropertyBag>,
}

impl PlatformDevice {
    /// 只有名字的设备（名字表匹配）
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            compatible: Vec::new(),
            of_node: None,
        }
    }

    /// 带属性包的设备，compatible 取自属性包
    pub fn with_properties(name: &str, props: PropertyBag) -> Self {
        Self {
            name: name.to_string(),
            compatible: props.compatible(),
            of_node: Some(props),
        }
    }

    /// 由设备树节点构造
    pub fn from_fdt_node(node: &FdtNode<'_, '_>) -> Self {
        Self::with_properties(node.name, PropertyBag::from_fdt_node(node))
    }

    /// 设备名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// compatible 列表
    pub fn compatible(&self) -> &[String] {
        &self.compatible
    }

    /// 设备属性
    pub fn properties(&self) -> Option<&PropertyBag> {
        self.of_node.as_ref()
    }
}

/// 平台驱动
pub trait PlatformDriver: Send + Sync {
    /// 驱动名
    fn name(&self) -> &str;

    /// 按设备名匹配的表
    fn id_table(&self) -> &[&'static str];

    /// 按 compatible 匹配的表
    fn of_match_table(&self) -> &[&'static str];

    /// 绑定设备
    fn probe(&self, dev: &PlatformDevice) -> Result<AttachOutcome, DriverError>;

    /// 解绑设备
    fn remove(&self, dev: &PlatformDevice) -> Result<(), DriverError>;
}

struct BusEntry {
    dev: PlatformDevice,
    bound: bool,
}

/// 平台总线
#[derive(Default)]
pub struct PlatformBus {
    driver: RwLock<Option<Arc<dyn PlatformDriver>>>,
    devices: RwLock<Vec<BusEntry>>,
}

fn matches(driver: &dyn PlatformDriver, dev: &PlatformDevice) -> bool {
    let of_match = dev
        .compatible()
        .iter()
        .any(|c| driver.of_match_table().iter().any(|m| *m == c.as_str()));
    of_match || driver.id_table().iter().any(|id| *id == dev.name())
}

fn probe_code(driver: &dyn PlatformDriver, dev: &PlatformDevice) -> isize {
    match driver.probe(dev) {
        Ok(outcome) => {
            if let AttachOutcome::Degraded(e) = outcome {
                log::warn!("[Bus] {} bound degraded: {}", dev.name(), e);
            }
            0
        }
        Err(e) => {
            log::warn!("[Bus] probe of {} failed: {}", dev.name(), e);
            e.to_errno()
        }
    }
}

impl PlatformBus {
    /// 创建空总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析设备树，把每个带 `compatible` 的节点转换为平台设备
    pub fn enumerate_fdt(blob: &[u8]) -> Result<Vec<PlatformDevice>, DriverError> {
        let fdt = Fdt::new(blob).map_err(|e| {
            log::warn!("[Bus] invalid device tree: {:?}", e);
            DriverError::InvalidArgument
        })?;
        let devices: Vec<_> = fdt
            .all_nodes()
            .filter(|node| node.compatible().is_some())
            .map(|node| {
                log::info!("[Bus] found device: {}", node.name);
                PlatformDevice::from_fdt_node(&node)
            })
            .collect();
        Ok(devices)
    }

    /// 注册驱动并探测已注册的匹配设备；已有驱动时返回 -EBUSY
    pub fn register_driver(&self, driver: Arc<dyn PlatformDriver>) -> isize {
        {
            let mut slot = self.driver.write();
            if slot.is_some() {
                return -16;
            }
            *slot = Some(driver.clone());
        }
        log::info!("[Bus] driver {} registered", driver.name());

        let mut devices = self.devices.write();
        for entry in devices.iter_mut().filter(|e| !e.bound) {
            if matches(driver.as_ref(), &entry.dev) {
                entry.bound = probe_code(driver.as_ref(), &entry.dev) == 0;
            }
        }
        0
    }

    /// 注销驱动，先解绑它绑定的所有设备
    pub fn unregister_driver(&self) {
        let Some(driver) = self.driver.write().take() else {
            return;
        };
        let mut devices = self.devices.write();
        for entry in devices.iter_mut().filter(|e| e.bound) {
            if let Err(e) = driver.remove(&entry.dev) {
                log::warn!("[Bus] remove of {} failed: {}", entry.dev.name(), e);
            }
            entry.bound = false;
        }
        log::info!("[Bus] driver {} unregistered", driver.name());
    }

    /// 注册设备，匹配时立即探测
    ///
    /// 返回 0 或探测失败的负错误码；同名设备已存在时返回 -EEXIST。
    pub fn register_device(&self, dev: PlatformDevice) -> isize {
        let mut devices = self.devices.write();
        if devices.iter().any(|e| e.dev.name() == dev.name()) {
            return -17;
        }
        let driver = self.driver.read().clone();
        let mut entry = BusEntry { dev, bound: false };
        let code = match driver {
            Some(driver) if matches(driver.as_ref(), &entry.dev) => {
                let code = probe_code(driver.as_ref(), &entry.dev);
                entry.bound = code == 0;
                code
            }
            _ => 0,
        };
        devices.push(entry);
        code
    }

    /// 注销设备，已绑定时调用 remove；总是返回 0
    pub fn unregister_device(&self, name: &str) -> isize {
        let entry = {
            let mut devices = self.devices.write();
            let Some(pos) = devices.iter().position(|e| e.dev.name() == name) else {
                return 0;
            };
            devices.remove(pos)
        };
        if entry.bound {
            if let Some(driver) = self.driver.read().clone() {
                if let Err(e) = driver.remove(&entry.dev) {
                    log::warn!("[Bus] remove of {} failed: {}", name, e);
                }
            }
        }
        0
    }

    /// 设备是否已绑定
    pub fn is_bound(&self, name: &str) -> bool {
        self.devices
            .read()
            .iter()
            .any(|e| e.dev.name() == name && e.bound)
    }

    /// 已注册设备数
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }
}
