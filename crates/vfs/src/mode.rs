//! 文件权限位与打开模式

use bitflags::bitflags;

bitflags! {
    /// 文件权限位（POSIX mode 的低 9 位）
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileMode: u32 {
        /// 所有者可读
        const S_IRUSR = 0o400;
        /// 所有者可写
        const S_IWUSR = 0o200;
        /// 所有者可执行
        const S_IXUSR = 0o100;
        /// 组可读
        const S_IRGRP = 0o040;
        /// 组可写
        const S_IWGRP = 0o020;
        /// 组可执行
        const S_IXGRP = 0o010;
        /// 其他用户可读
        const S_IROTH = 0o004;
        /// 其他用户可写
        const S_IWOTH = 0o002;
        /// 其他用户可执行
        const S_IXOTH = 0o001;
    }
}

impl FileMode {
    /// 由数值构造，忽略权限位以外的比特
    pub const fn from_perm(perm: u32) -> Self {
        Self::from_bits_truncate(perm)
    }

    /// 所有者是否可读
    pub const fn owner_readable(&self) -> bool {
        self.contains(Self::S_IRUSR)
    }

    /// 所有者是否可写
    pub const fn owner_writable(&self) -> bool {
        self.contains(Self::S_IWUSR)
    }
}

/// 打开模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// O_RDONLY
    ReadOnly,
    /// O_WRONLY
    WriteOnly,
    /// O_RDWR
    ReadWrite,
}

impl AccessMode {
    /// 是否允许读
    pub const fn readable(&self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    /// 是否允许写
    pub const fn writable(&self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_perm_truncates() {
        let mode = FileMode::from_perm(0o100666);
        assert_eq!(mode.bits(), 0o666);
        assert!(mode.owner_readable());
        assert!(mode.owner_writable());
    }

    #[test]
    fn test_read_only_attr() {
        let mode = FileMode::from_perm(0o400);
        assert!(mode.owner_readable());
        assert!(!mode.owner_writable());
    }
}
