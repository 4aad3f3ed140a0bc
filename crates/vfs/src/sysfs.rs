//! sysfs 属性文件
//!
//! 每个设备一个目录，目录下是若干 [`SysfsAttr`]。读属性调用 `show`，写属性调用 `store`；
//! 没有 `store` 的属性是只读的。

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use sync::RwLock;

use crate::{FileMode, FsError};

/// 属性读回调
pub type ShowFn = Arc<dyn Fn() -> Result<String, FsError> + Send + Sync>;

/// 属性写回调，返回消费的字节数
pub type StoreFn = Arc<dyn Fn(&[u8]) -> Result<usize, FsError> + Send + Sync>;

/// sysfs 属性
#[derive(Clone)]
pub struct SysfsAttr {
    /// 属性名
    pub name: String,
    /// 权限
    pub mode: FileMode,
    /// 读取回调
    pub show: ShowFn,
    /// 写入回调（只读属性为 None）
    pub store: Option<StoreFn>,
}

/// sysfs 设备目录树
#[derive(Default)]
pub struct SysfsTree {
    dirs: RwLock<BTreeMap<String, Vec<SysfsAttr>>>,
}

impl SysfsTree {
    /// 创建空树
    pub fn new() -> Self {
        Self::default()
    }

    /// 在设备目录下创建属性文件，目录不存在时自动创建
    pub fn create_file(&self, dev_name: &str, attr: SysfsAttr) -> Result<(), FsError> {
        let mut dirs = self.dirs.write();
        let dir = dirs.entry(dev_name.to_string()).or_default();
        if dir.iter().any(|a| a.name == attr.name) {
            return Err(FsError::AlreadyExists);
        }
        log::debug!("[Sysfs] {}/{} created", dev_name, attr.name);
        dir.push(attr);
        Ok(())
    }

    /// 删除属性文件；目录变空时一并删除
    pub fn remove_file(&self, dev_name: &str, attr_name: &str) -> bool {
        let mut dirs = self.dirs.write();
        let Some(dir) = dirs.get_mut(dev_name) else {
            return false;
        };
        let before = dir.len();
        dir.retain(|a| a.name != attr_name);
        let removed = dir.len() != before;
        if dir.is_empty() {
            dirs.remove(dev_name);
        }
        removed
    }

    /// 删除整个设备目录，返回删除的属性数
    pub fn remove_dir(&self, dev_name: &str) -> usize {
        let removed = self.dirs.write().remove(dev_name).map_or(0, |d| d.len());
        if removed > 0 {
            log::debug!("[Sysfs] {} removed ({} attrs)", dev_name, removed);
        }
        removed
    }

    /// 设备目录是否存在
    pub fn has_dir(&self, dev_name: &str) -> bool {
        self.dirs.read().contains_key(dev_name)
    }

    /// 设备目录下的属性名
    pub fn attrs(&self, dev_name: &str) -> Vec<String> {
        self.dirs
            .read()
            .get(dev_name)
            .map(|d| d.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    fn find(&self, dev_name: &str, attr_name: &str) -> Result<SysfsAttr, FsError> {
        self.dirs
            .read()
            .get(dev_name)
            .and_then(|d| d.iter().find(|a| a.name == attr_name))
            .cloned()
            .ok_or(FsError::NotFound)
    }

    /// 读属性
    pub fn show(&self, dev_name: &str, attr_name: &str) -> Result<String, FsError> {
        let attr = self.find(dev_name, attr_name)?;
        if !attr.mode.owner_readable() {
            return Err(FsError::PermissionDenied);
        }
        (attr.show)()
    }

    /// 写属性
    pub fn store(&self, dev_name: &str, attr_name: &str, buf: &[u8]) -> Result<usize, FsError> {
        let attr = self.find(dev_name, attr_name)?;
        let Some(store) = attr.store else {
            return Err(FsError::NotSupported);
        };
        if !attr.mode.owner_writable() {
            return Err(FsError::PermissionDenied);
        }
        store(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn const_attr(name: &str, text: &'static str) -> SysfsAttr {
        SysfsAttr {
            name: name.to_string(),
            mode: FileMode::from_perm(0o400),
            show: Arc::new(move || Ok(text.to_string())),
            store: None,
        }
    }

    #[test]
    fn test_show_and_readonly_store() {
        let tree = SysfsTree::new();
        tree.create_file("led", const_attr("value", "1")).unwrap();
        assert_eq!(tree.show("led", "value").unwrap(), "1");
        assert_eq!(tree.store("led", "value", b"0"), Err(FsError::NotSupported));
        assert_eq!(tree.show("led", "missing"), Err(FsError::NotFound));
    }

    #[test]
    fn test_duplicate_attr_rejected() {
        let tree = SysfsTree::new();
        tree.create_file("led", const_attr("value", "0")).unwrap();
        assert_eq!(
            tree.create_file("led", const_attr("value", "0")),
            Err(FsError::AlreadyExists)
        );
    }

    #[test]
    fn test_remove_last_file_removes_dir() {
        let tree = SysfsTree::new();
        tree.create_file("led", const_attr("value", "0")).unwrap();
        assert!(tree.remove_file("led", "value"));
        assert!(!tree.has_dir("led"));
        assert_eq!(tree.remove_dir("led"), 0);
    }
}
