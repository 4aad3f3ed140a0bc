//! 设备能力
//!
//! attach 时按 [`DeviceKind`] 选定一组能力并存入描述符，路由层只通过这些 trait 访问设备。
//! 调用方在整个调用期间持有设备槽位锁。

use alloc::string::{String, ToString};
use gpio::{Direction, Level, LineRegistry};
use vfs::{UserBuffer, copy_from_user};

use crate::catalog::DeviceKind;
use crate::config::{DIRECTION_ATTR, DIRECTION_ATTR_MODE, VALUE_ATTR, VALUE_ATTR_MODE};
use crate::descriptor::DeviceDescriptor;
use crate::error::DriverError;

/// 字节流读
pub trait Readable: Send + Sync {
    /// 读取到 `buf`
    fn read(&self, desc: &mut DeviceDescriptor, buf: &mut [u8]) -> Result<usize, DriverError>;
}

/// 字节流写
pub trait Writable: Send + Sync {
    /// 写入 `count` 字节，数据取自用户缓冲区；返回实际消费的字节数
    fn write(
        &self,
        desc: &mut DeviceDescriptor,
        registry: &LineRegistry,
        buf: &UserBuffer<'_>,
        count: usize,
    ) -> Result<usize, DriverError>;
}

/// 属性文件描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpec {
    /// 属性名
    pub name: &'static str,
    /// 权限位
    pub mode: u32,
    /// 是否可写
    pub writable: bool,
}

/// 具名属性读写
pub trait AttributeExposed: Send + Sync {
    /// 设备暴露的属性
    fn attributes(&self) -> &'static [AttrSpec];

    /// 读属性
    fn show(
        &self,
        desc: &DeviceDescriptor,
        registry: &LineRegistry,
        attr: &str,
    ) -> Result<String, DriverError>;

    /// 写属性，返回消费的字节数
    fn store(
        &self,
        desc: &mut DeviceDescriptor,
        registry: &LineRegistry,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize, DriverError>;
}

/// 一个设备的能力集合
#[derive(Clone, Copy)]
pub struct Capabilities {
    /// 流读
    pub readable: Option<&'static dyn Readable>,
    /// 流写
    pub writable: Option<&'static dyn Writable>,
    /// 属性
    pub attributes: Option<&'static dyn AttributeExposed>,
}

static LED_STREAM: LedStream = LedStream;
static LED_ATTRIBUTES: LedAttributes = LedAttributes;

impl Capabilities {
    /// 按设备种类选定能力
    pub fn for_kind(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Stream => Self {
                readable: Some(&LED_STREAM),
                writable: Some(&LED_STREAM),
                attributes: None,
            },
            DeviceKind::StreamWithAttributes => Self {
                readable: Some(&LED_STREAM),
                writable: Some(&LED_STREAM),
                attributes: Some(&LED_ATTRIBUTES),
            },
        }
    }
}

/// LED 字节流：首字节 `'0'` 熄灭，`'1'` 点亮
pub struct LedStream;

impl Readable for LedStream {
    fn read(&self, desc: &mut DeviceDescriptor, _buf: &mut [u8]) -> Result<usize, DriverError> {
        log::debug!("[Led] {}: read is not supported", desc.identity);
        Err(DriverError::NotSupported)
    }
}

impl Writable for LedStream {
    fn write(
        &self,
        desc: &mut DeviceDescriptor,
        registry: &LineRegistry,
        buf: &UserBuffer<'_>,
        count: usize,
    ) -> Result<usize, DriverError> {
        // 空写没有决定字节，不触碰缓冲区和线
        if count == 0 {
            log::debug!("[Led] {}: empty write", desc.identity);
            return Ok(0);
        }
        let not_copied = copy_from_user(&mut desc.buffer, buf);
        let consumed = count.saturating_sub(not_copied);
        if not_copied > 0 {
            log::warn!(
                "[Led] {}: {} of {} bytes not copied",
                desc.identity,
                not_copied,
                desc.buffer_size
            );
        }
        if not_copied == desc.buffer_size {
            return Ok(consumed);
        }

        let level = match desc.buffer[0] {
            b'0' => Level::Low,
            b'1' => Level::High,
            other => {
                log::warn!("[Led] {}: gpio invalid input {:#04x}", desc.identity, other);
                return Ok(consumed);
            }
        };
        if desc.direction == Direction::Input {
            log::warn!(
                "[Led] {}: GPIO pin {} is input, write ignored",
                desc.identity,
                desc.line
            );
            return Ok(consumed);
        }
        let Some(handle) = desc.handle.as_ref() else {
            log::warn!("[Led] {}: no GPIO pin bound, write ignored", desc.identity);
            return Ok(consumed);
        };

        registry.set_value(handle, level);
        desc.value = level;
        match level {
            Level::High => log::debug!("[Led] {}: gpio set is done", desc.identity),
            Level::Low => log::debug!("[Led] {}: gpio clear is done", desc.identity),
        }
        Ok(consumed)
    }
}

/// LED 属性：`direction`（读写）与 `value`（只读）
pub struct LedAttributes;

const LED_ATTRS: [AttrSpec; 2] = [
    AttrSpec {
        name: DIRECTION_ATTR,
        mode: DIRECTION_ATTR_MODE,
        writable: true,
    },
    AttrSpec {
        name: VALUE_ATTR,
        mode: VALUE_ATTR_MODE,
        writable: false,
    },
];

impl AttributeExposed for LedAttributes {
    fn attributes(&self) -> &'static [AttrSpec] {
        &LED_ATTRS
    }

    fn show(
        &self,
        desc: &DeviceDescriptor,
        registry: &LineRegistry,
        attr: &str,
    ) -> Result<String, DriverError> {
        match attr {
            DIRECTION_ATTR => Ok(match desc.direction {
                Direction::Output => "1",
                Direction::Input => "0",
            }
            .to_string()),
            VALUE_ATTR => registry
                .get_value(desc.line)
                .map(|level| level.as_char().to_string())
                .map_err(|e| {
                    log::warn!("[Led] {}: cannot read GPIO pin {}: {}", desc.identity, desc.line, e);
                    DriverError::Hardware(e)
                }),
            _ => Err(DriverError::NotSupported),
        }
    }

    fn store(
        &self,
        desc: &mut DeviceDescriptor,
        registry: &LineRegistry,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize, DriverError> {
        if attr != DIRECTION_ATTR {
            return Err(DriverError::NotSupported);
        }

        let (target, name) = if buf.starts_with(b"output") {
            (Direction::Output, "output")
        } else if buf.starts_with(b"input") {
            (Direction::Input, "input")
        } else {
            log::warn!("[Led] {}: invalid direction", desc.identity);
            return Err(DriverError::InvalidArgument);
        };

        match desc.handle.as_ref() {
            Some(handle) => {
                let res = match target {
                    Direction::Output => registry.set_direction_output(handle, desc.value),
                    Direction::Input => registry.set_direction_input(handle),
                };
                res.map_err(|e| {
                    log::warn!(
                        "[Led] {}: cannot set GPIO pin {} to {}: {}",
                        desc.identity,
                        desc.line,
                        name,
                        e
                    );
                    DriverError::ResourceUnavailable(e)
                })?;
            }
            None => log::warn!(
                "[Led] {}: no GPIO pin bound, direction flag only",
                desc.identity
            ),
        }

        desc.direction = target;
        log::info!(
            "[Led] gpio direction is set to {} for {}",
            name,
            desc.identity
        );
        Ok(buf.len())
    }
}
