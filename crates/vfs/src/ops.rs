//! 字符设备驱动接口
//!
//! VFS 层只负责把打开、读、写、关闭转发给驱动；会话到设备状态的映射由驱动自己维护，
//! VFS 只保存驱动在 `open` 时返回的 [`RoutingKey`]。

use crate::{FsError, UserBuffer};

/// 会话路由键
///
/// 由驱动在 `open` 时分配，对每个打开会话唯一；之后该会话的所有调用都携带它。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoutingKey {
    minor: u32,
    session: u64,
}

impl RoutingKey {
    /// 创建路由键
    pub const fn new(minor: u32, session: u64) -> Self {
        Self { minor, session }
    }

    /// 会话所属设备的 minor 号
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    /// 会话序号
    pub const fn session(&self) -> u64 {
        self.session
    }
}

/// 字符设备驱动接口
///
/// 注册到 [`crate::ChrdevRegion`] 上，由 [`crate::CharDeviceFile`] 调用。
pub trait CharDriver: Send + Sync {
    /// 打开 minor 号对应的设备，返回本次会话的路由键
    fn open(&self, minor: u32) -> Result<RoutingKey, FsError>;

    /// 关闭会话
    fn release(&self, key: RoutingKey);

    /// 从设备读取数据
    fn read(&self, key: RoutingKey, buf: &mut [u8]) -> Result<usize, FsError>;

    /// 向设备写入数据
    ///
    /// `count` 为调用者请求的长度，`buf` 为调用者实际映射的用户内存。
    fn write(&self, key: RoutingKey, buf: &UserBuffer<'_>, count: usize)
    -> Result<usize, FsError>;
}
