//! VFS 错误类型
//!
//! 定义了与 POSIX 兼容的错误码，可通过 [`FsError::to_errno()`] 转换为系统调用错误码。

/// VFS 错误类型
///
/// 各错误码对应标准 POSIX errno 值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// 文件不存在 (-ENOENT)
    NotFound,
    /// 文件已存在 (-EEXIST)
    AlreadyExists,
    /// 权限被拒绝 (-EACCES)
    PermissionDenied,
    /// 无效的文件描述符 (-EBADF)
    BadFileDescriptor,
    /// 无效参数 (-EINVAL)
    InvalidArgument,
    /// 设备空间不足 (-ENOSPC)
    NoSpace,
    /// 设备不存在 (-ENODEV)
    NoDevice,
    /// I/O 错误 (-EIO)
    IoError,
    /// 操作不支持 (-ENOTSUP)
    NotSupported,
}

impl FsError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            FsError::NotFound => -2,
            FsError::IoError => -5,
            FsError::BadFileDescriptor => -9,
            FsError::PermissionDenied => -13,
            FsError::AlreadyExists => -17,
            FsError::NoDevice => -19,
            FsError::InvalidArgument => -22,
            FsError::NoSpace => -28,
            FsError::NotSupported => -95,
        }
    }
}
