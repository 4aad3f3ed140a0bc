//! 驱动错误类型

use core::fmt;

use gpio::GpioError;
use vfs::FsError;

/// 驱动错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// 缺少必需的设备属性
    MissingProperty(&'static str),
    /// 设备属性存在但无法按预期类型读取
    InvalidProperty(&'static str),
    /// 设备身份不在目录中
    UnknownDevice,
    /// GPIO 线不可用
    ResourceUnavailable(GpioError),
    /// 设备节点或属性文件创建失败
    ExposureFailed(FsError),
    /// 设备未处于 Attached 状态
    NotAttached,
    /// 路由键对应的设备不存在或未就绪
    NoDevice,
    /// 设备不支持该操作
    NotSupported,
    /// 参数无效
    InvalidArgument,
    /// 读写硬件失败
    Hardware(GpioError),
}

impl DriverError {
    /// 转换为总线回调返回码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            DriverError::MissingProperty(_)
            | DriverError::InvalidProperty(_)
            | DriverError::InvalidArgument
            | DriverError::NotAttached => -22,
            DriverError::UnknownDevice | DriverError::NoDevice => -19,
            DriverError::ResourceUnavailable(_) => -16,
            DriverError::ExposureFailed(e) => e.to_errno(),
            DriverError::NotSupported => -95,
            DriverError::Hardware(_) => -5,
        }
    }
}

impl From<DriverError> for FsError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::MissingProperty(_)
            | DriverError::InvalidProperty(_)
            | DriverError::InvalidArgument
            | DriverError::NotAttached => FsError::InvalidArgument,
            DriverError::UnknownDevice | DriverError::NoDevice => FsError::NoDevice,
            DriverError::ResourceUnavailable(_) | DriverError::Hardware(_) => FsError::IoError,
            DriverError::ExposureFailed(e) => e,
            DriverError::NotSupported => FsError::NotSupported,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::MissingProperty(name) => write!(f, "device property '{}' not found", name),
            DriverError::InvalidProperty(name) => write!(f, "couldn't read '{}'", name),
            DriverError::UnknownDevice => write!(f, "unknown device"),
            DriverError::ResourceUnavailable(e) => write!(f, "resource unavailable: {}", e),
            DriverError::ExposureFailed(e) => write!(f, "exposure failed: {:?}", e),
            DriverError::NotAttached => write!(f, "device not attached"),
            DriverError::NoDevice => write!(f, "no such device"),
            DriverError::NotSupported => write!(f, "operation not supported"),
            DriverError::InvalidArgument => write!(f, "invalid argument"),
            DriverError::Hardware(e) => write!(f, "hardware error: {}", e),
        }
    }
}

/// 成功 attach 的结果
///
/// GPIO 线申请或方向设置失败时设备仍会被暴露，结果为 [`AttachOutcome::Degraded`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// 设备完全可用
    Attached,
    /// 设备已暴露但没有可用的 GPIO 线
    Degraded(GpioError),
}

impl AttachOutcome {
    /// 是否为降级结果
    pub fn is_degraded(&self) -> bool {
        matches!(self, AttachOutcome::Degraded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(DriverError::MissingProperty("label").to_errno(), -22);
        assert_eq!(DriverError::UnknownDevice.to_errno(), -19);
        assert_eq!(
            DriverError::ResourceUnavailable(GpioError::AlreadyOwned(2)).to_errno(),
            -16
        );
        assert_eq!(
            DriverError::ExposureFailed(FsError::AlreadyExists).to_errno(),
            -17
        );
        assert_eq!(DriverError::NotSupported.to_errno(), -95);
    }

    #[test]
    fn test_fs_error_conversion() {
        assert_eq!(
            FsError::from(DriverError::InvalidArgument),
            FsError::InvalidArgument
        );
        assert_eq!(FsError::from(DriverError::NotSupported), FsError::NotSupported);
        assert_eq!(
            FsError::from(DriverError::Hardware(GpioError::InvalidLine(40))),
            FsError::IoError
        );
        assert_eq!(FsError::from(DriverError::NoDevice), FsError::NoDevice);
    }
}
