//! 扁平设备树（FDT/DTB）构造器
//!
//! 只覆盖测试需要的子集：节点、字符串属性、u32 属性。
//!
//! ```ignore
//! let blob = FdtBuilder::new()
//!     .begin_node("led1")
//!     .prop_str("compatible", "tera,led1")
//!     .prop_u32("gpio_pin", 2)
//!     .end_node()
//!     .build();
//! ```

use std::collections::HashMap;

const FDT_MAGIC: u32 = 0xd00d_feed;
const FDT_BEGIN_NODE: u32 = 0x1;
const FDT_END_NODE: u32 = 0x2;
const FDT_PROP: u32 = 0x3;
const FDT_END: u32 = 0x9;

const HEADER_SIZE: usize = 40;
const RSVMAP_SIZE: usize = 16;

/// 设备树二进制构造器
pub struct FdtBuilder {
    structs: Vec<u8>,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    depth: usize,
}

impl Default for FdtBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FdtBuilder {
    /// 创建构造器，根节点已打开并带有 `#address-cells` / `#size-cells`
    pub fn new() -> Self {
        let builder = Self {
            structs: Vec::new(),
            strings: Vec::new(),
            string_offsets: HashMap::new(),
            depth: 0,
        };
        builder
            .begin_node("")
            .prop_u32("#address-cells", 1)
            .prop_u32("#size-cells", 1)
    }

    fn push_u32(&mut self, v: u32) {
        self.structs.extend_from_slice(&v.to_be_bytes());
    }

    fn pad(&mut self) {
        while self.structs.len() % 4 != 0 {
            self.structs.push(0);
        }
    }

    fn string_offset(&mut self, name: &str) -> u32 {
        if let Some(&off) = self.string_offsets.get(name) {
            return off;
        }
        let off = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(name.to_string(), off);
        off
    }

    /// 打开一个子节点
    pub fn begin_node(mut self, name: &str) -> Self {
        self.push_u32(FDT_BEGIN_NODE);
        self.structs.extend_from_slice(name.as_bytes());
        self.structs.push(0);
        self.pad();
        self.depth += 1;
        self
    }

    /// 关闭当前节点
    pub fn end_node(mut self) -> Self {
        assert!(self.depth > 1, "the root node is closed by build()");
        self.push_u32(FDT_END_NODE);
        self.depth -= 1;
        self
    }

    /// 添加原始字节属性
    pub fn prop_bytes(mut self, name: &str, value: &[u8]) -> Self {
        let nameoff = self.string_offset(name);
        self.push_u32(FDT_PROP);
        self.push_u32(value.len() as u32);
        self.push_u32(nameoff);
        self.structs.extend_from_slice(value);
        self.pad();
        self
    }

    /// 添加以 NUL 结尾的字符串属性
    pub fn prop_str(self, name: &str, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.prop_bytes(name, &bytes)
    }

    /// 添加大端 u32 属性
    pub fn prop_u32(self, name: &str, value: u32) -> Self {
        self.prop_bytes(name, &value.to_be_bytes())
    }

    /// 关闭所有打开的节点并生成二进制
    pub fn build(mut self) -> Vec<u8> {
        while self.depth > 0 {
            self.push_u32(FDT_END_NODE);
            self.depth -= 1;
        }
        self.push_u32(FDT_END);

        let off_rsvmap = HEADER_SIZE;
        let off_struct = off_rsvmap + RSVMAP_SIZE;
        let off_strings = off_struct + self.structs.len();
        let total = off_strings + self.strings.len();

        let mut blob = Vec::with_capacity(total);
        for field in [
            FDT_MAGIC,
            total as u32,
            off_struct as u32,
            off_strings as u32,
            off_rsvmap as u32,
            17, // version
            16, // last_comp_version
            0,  // boot_cpuid_phys
            self.strings.len() as u32,
            self.structs.len() as u32,
        ] {
            blob.extend_from_slice(&field.to_be_bytes());
        }
        blob.extend_from_slice(&[0u8; RSVMAP_SIZE]);
        blob.extend_from_slice(&self.structs);
        blob.extend_from_slice(&self.strings);
        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let blob = FdtBuilder::new()
            .begin_node("led1")
            .prop_str("compatible", "tera,led1")
            .end_node()
            .build();
        assert_eq!(&blob[0..4], &FDT_MAGIC.to_be_bytes());
        let total = u32::from_be_bytes(blob[4..8].try_into().unwrap()) as usize;
        assert_eq!(total, blob.len());
        let off_struct = u32::from_be_bytes(blob[8..12].try_into().unwrap()) as usize;
        assert_eq!(off_struct, HEADER_SIZE + RSVMAP_SIZE);
        assert_eq!(
            &blob[off_struct..off_struct + 4],
            &FDT_BEGIN_NODE.to_be_bytes()
        );
        assert_eq!(blob.last(), Some(&0));
    }

    #[test]
    fn test_strings_deduplicated() {
        let builder = FdtBuilder::new()
            .begin_node("a")
            .prop_u32("gpio_pin", 2)
            .end_node()
            .begin_node("b")
            .prop_u32("gpio_pin", 3)
            .end_node();
        assert_eq!(
            builder
                .strings
                .split(|b| *b == 0)
                .filter(|s| *s == b"gpio_pin")
                .count(),
            1
        );
    }
}
