//! 文件抽象层 - VFS 会话层接口
//!
//! 每次打开设备节点得到一个 [`File`] 会话，读写都经由会话转发到驱动；
//! 会话被丢弃即视为关闭。

use crate::{AccessMode, FsError, UserBuffer};

/// 文件操作的统一接口
pub trait File: Send + Sync {
    /// 检查文件是否可读
    fn readable(&self) -> bool;

    /// 检查文件是否可写
    fn writable(&self) -> bool;

    /// 从文件读取数据
    fn read(&self, buf: &mut [u8]) -> Result<usize, FsError>;

    /// 向文件写入 `count` 字节，数据取自用户缓冲区 `buf`
    fn write(&self, buf: &UserBuffer<'_>, count: usize) -> Result<usize, FsError>;

    /// 获取打开模式
    fn access(&self) -> AccessMode;
}
