//! 设备目录
//!
//! 把设备身份映射到静态元数据（GPIO 线、初始电平、节点权限、缓冲区大小、槽位序号）。
//! 两种来源：编译期名字表，或匹配时随设备提供的设备树属性。

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use gpio::Level;
use lazy_static::lazy_static;

use crate::bus::PlatformDevice;
use crate::config::{CatalogMode, DEFAULT_BUFFER_SIZE, DEFAULT_NODE_PERM, MAX_BUFFER_SIZE};
use crate::error::DriverError;

/// 设备种类，决定 attach 时挂上的能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// 只有字节流接口
    Stream,
    /// 字节流接口加 `direction` / `value` 属性
    StreamWithAttributes,
}

/// 名字表条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdEntry {
    /// 平台设备名
    pub name: &'static str,
    /// GPIO 线号
    pub line: u32,
    /// 槽位序号（minor 偏移）
    pub index: u32,
}

/// 编译期名字表
pub static ID_TABLE: [IdEntry; 3] = [
    IdEntry {
        name: "LED_RED",
        line: 2,
        index: 0,
    },
    IdEntry {
        name: "LED_RED_2",
        line: 3,
        index: 1,
    },
    IdEntry {
        name: "LED_GREEN",
        line: 4,
        index: 2,
    },
];

/// 设备树 compatible 表
pub static OF_MATCH_TABLE: [&str; 2] = ["tera,led1", "tera,led2"];

/// 设备树标签表，位置即槽位序号
pub static DT_LABELS: [&str; 2] = ["redled_1", "redled_2"];

/// 设备树模式下必须存在的属性，按检查顺序排列
pub const REQUIRED_PROPERTIES: [&str; 5] = ["label", "led_value", "gpio_pin", "buff_size", "perm"];

lazy_static! {
    static ref ID_INDEX: BTreeMap<&'static str, IdEntry> =
        ID_TABLE.iter().map(|e| (e.name, *e)).collect();
    static ref ID_NAMES: Vec<&'static str> = ID_TABLE.iter().map(|e| e.name).collect();
    static ref LABEL_INDEX: BTreeMap<&'static str, u32> = DT_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| (*label, i as u32))
        .collect();
}

/// 解析得到的设备元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMetadata {
    /// 设备身份（平台设备名或设备树标签），也是节点名
    pub identity: String,
    /// 槽位序号
    pub index: u32,
    /// GPIO 线号
    pub line: u32,
    /// 初始电平
    pub value: Level,
    /// 流缓冲区大小
    pub buffer_size: usize,
    /// 节点权限位
    pub perm: u32,
    /// 设备种类
    pub kind: DeviceKind,
}

/// 设备目录
#[derive(Debug, Clone, Copy)]
pub struct DeviceCatalog {
    mode: CatalogMode,
}

impl DeviceCatalog {
    /// 创建目录
    pub const fn new(mode: CatalogMode) -> Self {
        Self { mode }
    }

    /// 目录来源
    pub fn mode(&self) -> CatalogMode {
        self.mode
    }

    /// 平台总线按名字匹配用的表
    pub fn id_names(&self) -> &'static [&'static str] {
        match self.mode {
            CatalogMode::IdTable => ID_NAMES.as_slice(),
            CatalogMode::DeviceTree => &[],
        }
    }

    /// 平台总线按 compatible 匹配用的表
    pub fn of_match_table(&self) -> &'static [&'static str] {
        match self.mode {
            CatalogMode::IdTable => &[],
            CatalogMode::DeviceTree => &OF_MATCH_TABLE,
        }
    }

    /// 解析设备元数据
    ///
    /// 设备树模式下先确认全部必需属性存在，再逐个读取；任何失败都不会触碰资源。
    pub fn resolve(&self, dev: &PlatformDevice) -> Result<DeviceMetadata, DriverError> {
        match self.mode {
            CatalogMode::IdTable => {
                let entry = ID_INDEX.get(dev.name()).ok_or(DriverError::UnknownDevice)?;
                Ok(DeviceMetadata {
                    identity: entry.name.to_string(),
                    index: entry.index,
                    line: entry.line,
                    value: Level::Low,
                    buffer_size: DEFAULT_BUFFER_SIZE,
                    perm: DEFAULT_NODE_PERM,
                    kind: DeviceKind::Stream,
                })
            }
            CatalogMode::DeviceTree => Self::resolve_properties(dev),
        }
    }

    fn resolve_properties(dev: &PlatformDevice) -> Result<DeviceMetadata, DriverError> {
        let Some(props) = dev.properties() else {
            log::warn!(
                "[Led] {}: device property '{}' not found",
                dev.name(),
                REQUIRED_PROPERTIES[0]
            );
            return Err(DriverError::MissingProperty(REQUIRED_PROPERTIES[0]));
        };
        if let Some(&missing) = REQUIRED_PROPERTIES.iter().find(|p| !props.present(p)) {
            log::warn!("[Led] {}: device property '{}' not found", dev.name(), missing);
            return Err(DriverError::MissingProperty(missing));
        }

        let label = props
            .read_string("label")
            .ok_or(DriverError::InvalidProperty("label"))?;
        let index = *LABEL_INDEX.get(label).ok_or_else(|| {
            log::warn!("[Led] unknown label {}", label);
            DriverError::UnknownDevice
        })?;
        let read = |name: &'static str| {
            props.read_u32(name).ok_or_else(|| {
                log::warn!("[Led] couldn't read '{}' for {}", name, label);
                DriverError::InvalidProperty(name)
            })
        };
        let value = read("led_value")?;
        let line = read("gpio_pin")?;
        let buffer_size = read("buff_size")? as usize;
        let perm = read("perm")?;
        if buffer_size > MAX_BUFFER_SIZE {
            log::warn!("[Led] buff_size {} too large for {}", buffer_size, label);
            return Err(DriverError::InvalidProperty("buff_size"));
        }

        log::info!(
            "[Led] label {} led_value {} gpio_pin {} buff_size {} perm {:o}",
            label,
            value,
            line,
            buffer_size,
            perm
        );
        Ok(DeviceMetadata {
            identity: label.to_string(),
            index,
            line,
            value: Level::from_u32(value),
            buffer_size,
            perm,
            kind: DeviceKind::StreamWithAttributes,
        })
    }

    /// 仅确定设备对应的槽位序号，用于 detach
    pub fn index_of(&self, dev: &PlatformDevice) -> Result<u32, DriverError> {
        match self.mode {
            CatalogMode::IdTable => ID_INDEX
                .get(dev.name())
                .map(|e| e.index)
                .ok_or(DriverError::UnknownDevice),
            CatalogMode::DeviceTree => {
                let label = dev
                    .properties()
                    .and_then(|p| p.read_string("label"))
                    .ok_or(DriverError::MissingProperty("label"))?;
                LABEL_INDEX
                    .get(label)
                    .copied()
                    .ok_or(DriverError::UnknownDevice)
            }
        }
    }
}
