//! 设备属性包
//!
//! 匹配时随设备一起交给驱动的键值集合。既可以手工构造，也可以从设备树节点读取；
//! 设备树属性以原始字节保存，读取时再按字符串或大端 u32 解释。

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use fdt::node::FdtNode;

/// 属性值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// 字符串
    Str(String),
    /// 32 位整数
    U32(u32),
    /// 原始字节（设备树属性）
    Bytes(Vec<u8>),
}

/// 设备属性包
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    props: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    /// 创建空属性包
    pub fn new() -> Self {
        Self::default()
    }

    /// 从设备树节点读取全部属性
    pub fn from_fdt_node(node: &FdtNode<'_, '_>) -> Self {
        let mut bag = Self::new();
        for prop in node.properties() {
            bag.insert(prop.name, PropertyValue::Bytes(prop.value.to_vec()));
        }
        bag
    }

    /// 插入或替换属性
    pub fn insert(&mut self, name: &str, value: PropertyValue) {
        self.props.insert(name.to_string(), value);
    }

    /// 移除属性
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.props.remove(name)
    }

    /// 追加字符串属性
    pub fn with_str(mut self, name: &str, value: &str) -> Self {
        self.insert(name, PropertyValue::Str(value.to_string()));
        self
    }

    /// 追加 u32 属性
    pub fn with_u32(mut self, name: &str, value: u32) -> Self {
        self.insert(name, PropertyValue::U32(value));
        self
    }

    /// 属性是否存在
    pub fn present(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// 按字符串读取
    ///
    /// 字节属性须为以 NUL 结尾（或不含 NUL）的 UTF-8。
    pub fn read_string(&self, name: &str) -> Option<&str> {
        match self.props.get(name)? {
            PropertyValue::Str(s) => Some(s),
            PropertyValue::Bytes(b) => {
                let b = b.strip_suffix(&[0]).unwrap_or(b);
                if b.contains(&0) {
                    return None;
                }
                core::str::from_utf8(b).ok()
            }
            PropertyValue::U32(_) => None,
        }
    }

    /// 按 u32 读取（字节属性须恰好 4 字节，大端）
    pub fn read_u32(&self, name: &str) -> Option<u32> {
        match self.props.get(name)? {
            PropertyValue::U32(v) => Some(*v),
            PropertyValue::Bytes(b) => Some(u32::from_be_bytes(b.as_slice().try_into().ok()?)),
            PropertyValue::Str(_) => None,
        }
    }

    /// `compatible` 属性中的全部字符串
    pub fn compatible(&self) -> Vec<String> {
        match self.props.get("compatible") {
            Some(PropertyValue::Str(s)) => alloc::vec![s.clone()],
            Some(PropertyValue::Bytes(b)) => b
                .split(|c| *c == 0)
                .filter(|s| !s.is_empty())
                .filter_map(|s| core::str::from_utf8(s).ok())
                .map(|s| s.to_string())
                .collect(),
            _ => Vec::new(),
        }
    }
}
