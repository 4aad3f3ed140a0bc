//! GPIO 错误类型

use core::fmt;

/// GPIO 资源操作错误
///
/// 每个变体携带出错的线号，便于日志定位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// 线已被其他持有者占用 (-EBUSY)
    AlreadyOwned(u32),
    /// 平台拒绝了申请 (-EPERM)
    PlatformRejected(u32),
    /// 该线不支持请求的方向配置 (-ENOTSUP)
    Unsupported(u32),
    /// 线号超出控制器范围 (-EINVAL)
    InvalidLine(u32),
}

impl GpioError {
    /// 出错的线号
    pub fn line(&self) -> u32 {
        match *self {
            GpioError::AlreadyOwned(line)
            | GpioError::PlatformRejected(line)
            | GpioError::Unsupported(line)
            | GpioError::InvalidLine(line) => line,
        }
    }

    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            GpioError::PlatformRejected(_) => -1,
            GpioError::AlreadyOwned(_) => -16,
            GpioError::InvalidLine(_) => -22,
            GpioError::Unsupported(_) => -95,
        }
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::AlreadyOwned(line) => write!(f, "GPIO {} is already owned", line),
            GpioError::PlatformRejected(line) => write!(f, "platform rejected GPIO {}", line),
            GpioError::Unsupported(line) => {
                write!(f, "GPIO {} does not support this direction", line)
            }
            GpioError::InvalidLine(line) => write!(f, "GPIO {} is out of range", line),
        }
    }
}
