//! 设备类与设备节点
//!
//! 对应 `/dev` 下的节点：[`DeviceClass::device_create`] 以设备号为键登记一个
//! 具名节点，[`DeviceClass::device_destroy`] 将其移除。节点名与设备号在类内都唯一。

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use sync::RwLock;

use crate::dev::{major, minor};
use crate::{FileMode, FsError};

/// 设备节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    /// 节点名
    pub name: String,
    /// 设备号
    pub dev: u64,
    /// 节点权限
    pub mode: FileMode,
}

/// 设备类
pub struct DeviceClass {
    name: String,
    nodes: RwLock<BTreeMap<u64, DeviceNode>>,
}

/// 创建设备类
pub fn class_create(name: &str) -> Arc<DeviceClass> {
    log::info!("[Chrdev] class {} created", name);
    Arc::new(DeviceClass {
        name: name.to_string(),
        nodes: RwLock::new(BTreeMap::new()),
    })
}

impl DeviceClass {
    /// 类名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 创建设备节点
    pub fn device_create(&self, dev: u64, name: &str, mode: FileMode) -> Result<(), FsError> {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&dev) || nodes.values().any(|n| n.name == name) {
            return Err(FsError::AlreadyExists);
        }
        nodes.insert(
            dev,
            DeviceNode {
                name: name.to_string(),
                dev,
                mode,
            },
        );
        log::info!(
            "[Chrdev] /dev/{} ({}:{}) mode {:o}",
            name,
            major(dev),
            minor(dev),
            mode.bits()
        );
        Ok(())
    }

    /// 删除设备节点
    pub fn device_destroy(&self, dev: u64) -> Option<DeviceNode> {
        let node = self.nodes.write().remove(&dev);
        if let Some(ref node) = node {
            log::info!("[Chrdev] /dev/{} removed", node.name);
        }
        node
    }

    /// 按名字查找节点
    pub fn lookup(&self, name: &str) -> Option<DeviceNode> {
        self.nodes.read().values().find(|n| n.name == name).cloned()
    }

    /// 按设备号查找节点
    pub fn node(&self, dev: u64) -> Option<DeviceNode> {
        self.nodes.read().get(&dev).cloned()
    }

    /// 所有节点（按设备号排序）
    pub fn nodes(&self) -> Vec<DeviceNode> {
        self.nodes.read().values().cloned().collect()
    }

    /// 节点数
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// 是否没有节点
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
