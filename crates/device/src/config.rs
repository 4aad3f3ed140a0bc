//! 驱动常量与实例配置

/// 字符设备区间名
pub const DRIVER_NAME: &str = "teraDriver";

/// 设备类名
pub const DRIVER_CLASS: &str = "tera_class";

/// 平台驱动名
pub const PLATFORM_DRIVER_NAME: &str = "mydriver";

/// 单个驱动实例最多管理的设备数
pub const MAX_DEVICES: u32 = 8;

/// 静态表设备的流缓冲区大小
pub const DEFAULT_BUFFER_SIZE: usize = 3;

/// 流缓冲区大小上限（一页）
pub const MAX_BUFFER_SIZE: usize = 4096;

/// 静态表设备的节点权限
pub const DEFAULT_NODE_PERM: u32 = 0o666;

/// `direction` 属性名
pub const DIRECTION_ATTR: &str = "direction";

/// `value` 属性名
pub const VALUE_ATTR: &str = "value";

/// `direction` 属性权限（所有者读写）
pub const DIRECTION_ATTR_MODE: u32 = 0o600;

/// `value` 属性权限（所有者只读）
pub const VALUE_ATTR_MODE: u32 = 0o400;

/// 设备目录的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogMode {
    /// 编译期固定的名字表
    IdTable,
    /// 匹配时由设备树属性提供
    DeviceTree,
}

/// 一个驱动实例的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// 字符设备区间名
    pub driver_name: &'static str,
    /// 设备类名
    pub class_name: &'static str,
    /// 平台驱动名
    pub platform_name: &'static str,
    /// 起始 minor
    pub base_minor: u32,
    /// minor 数量，即设备槽位数
    pub minor_count: u32,
    /// 设备目录来源
    pub mode: CatalogMode,
}

impl DriverConfig {
    /// 静态名字表：三个设备
    pub const fn id_table() -> Self {
        Self {
            driver_name: DRIVER_NAME,
            class_name: DRIVER_CLASS,
            platform_name: PLATFORM_DRIVER_NAME,
            base_minor: 0,
            minor_count: 3,
            mode: CatalogMode::IdTable,
        }
    }

    /// 设备树：两个设备，带属性文件
    pub const fn device_tree() -> Self {
        Self {
            driver_name: DRIVER_NAME,
            class_name: DRIVER_CLASS,
            platform_name: PLATFORM_DRIVER_NAME,
            base_minor: 0,
            minor_count: 2,
            mode: CatalogMode::DeviceTree,
        }
    }
}
