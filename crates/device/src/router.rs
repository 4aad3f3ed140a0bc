//! I/O 路由
//!
//! 把字节流会话与属性访问分派到对应的设备描述符。路由层只持有槽位序号，
//! 描述符的所有权在生命周期管理器手里；设备 detach 时其会话全部作废。

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Weak;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use gpio::LineRegistry;
use sync::SpinLock;
use vfs::{CharDriver, FsError, RoutingKey, UserBuffer};

use crate::descriptor::{DeviceArena, DeviceDescriptor, DeviceState};
use crate::error::DriverError;

/// I/O 路由器，作为字符设备驱动挂在设备号区间上
pub struct IoRouter {
    arena: Weak<DeviceArena>,
    registry: LineRegistry,
    base_minor: u32,
    sessions: SpinLock<BTreeMap<RoutingKey, u32>>,
    next_session: AtomicU64,
    closed: AtomicBool,
}

impl IoRouter {
    /// 创建路由器
    pub fn new(arena: Weak<DeviceArena>, registry: LineRegistry, base_minor: u32) -> Self {
        Self {
            arena,
            registry,
            base_minor,
            sessions: SpinLock::new(BTreeMap::new()),
            next_session: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// 在已绑定设备上执行 `f`，期间持有槽位锁
    fn with_attached<R>(
        &self,
        index: u32,
        f: impl FnOnce(&mut DeviceDescriptor, &LineRegistry) -> Result<R, DriverError>,
    ) -> Result<R, DriverError> {
        let arena = self.arena.upgrade().ok_or(DriverError::NoDevice)?;
        let slot = arena.slot(index).ok_or(DriverError::NoDevice)?;
        let mut slot = slot.lock();
        if slot.state != DeviceState::Attached {
            return Err(DriverError::NoDevice);
        }
        let desc = slot.desc.as_mut().ok_or(DriverError::NoDevice)?;
        f(desc, &self.registry)
    }

    fn session_index(&self, key: RoutingKey) -> Result<u32, FsError> {
        self.sessions
            .lock()
            .get(&key)
            .copied()
            .ok_or(FsError::BadFileDescriptor)
    }

    /// 停止接受新会话，驱动卸载时调用
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// 作废某个槽位的全部会话，返回作废的数量
    pub fn revoke(&self, index: u32) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, i| *i != index);
        before - sessions.len()
    }

    /// 当前打开的会话
    pub fn sessions(&self) -> Vec<RoutingKey> {
        self.sessions.lock().keys().copied().collect()
    }

    /// 按槽位序号读属性
    pub fn show_index(&self, index: u32, attr: &str) -> Result<String, DriverError> {
        self.with_attached(index, |desc, registry| {
            let caps = desc.caps.attributes.ok_or(DriverError::NotSupported)?;
            caps.show(desc, registry, attr)
        })
    }

    /// 按槽位序号写属性
    pub fn store_index(&self, index: u32, attr: &str, buf: &[u8]) -> Result<usize, DriverError> {
        self.with_attached(index, |desc, registry| {
            let caps = desc.caps.attributes.ok_or(DriverError::NotSupported)?;
            caps.store(desc, registry, attr, buf)
        })
    }

    fn find(&self, identity: &str) -> Result<u32, DriverError> {
        self.arena
            .upgrade()
            .and_then(|arena| arena.find(identity))
            .ok_or(DriverError::NoDevice)
    }

    /// 按设备身份读属性
    pub fn show(&self, identity: &str, attr: &str) -> Result<String, DriverError> {
        self.show_index(self.find(identity)?, attr)
    }

    /// 按设备身份写属性
    pub fn store(&self, identity: &str, attr: &str, buf: &[u8]) -> Result<usize, DriverError> {
        self.store_index(self.find(identity)?, attr, buf)
    }

    /// 按会话读属性
    pub fn show_session(&self, key: RoutingKey, attr: &str) -> Result<String, DriverError> {
        let index = self
            .session_index(key)
            .map_err(|_| DriverError::InvalidArgument)?;
        self.show_index(index, attr)
    }

    /// 按会话写属性
    pub fn store_session(
        &self,
        key: RoutingKey,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize, DriverError> {
        let index = self
            .session_index(key)
            .map_err(|_| DriverError::InvalidArgument)?;
        self.store_index(index, attr, buf)
    }

    /// 按会话访问描述符；会话在槽位锁下复核，已作废的会话返回 `BadFileDescriptor`
    fn session_call<R>(
        &self,
        key: RoutingKey,
        f: impl FnOnce(&mut DeviceDescriptor, &LineRegistry) -> Result<R, DriverError>,
    ) -> Result<R, FsError> {
        let index = self.session_index(key)?;
        let mut revoked = false;
        let res = self.with_attached(index, |desc, registry| {
            if !self.sessions.lock().contains_key(&key) {
                revoked = true;
                return Err(DriverError::NoDevice);
            }
            f(desc, registry)
        });
        if revoked {
            return Err(FsError::BadFileDescriptor);
        }
        res.map_err(FsError::from)
    }
}

impl CharDriver for IoRouter {
    fn open(&self, minor: u32) -> Result<RoutingKey, FsError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FsError::NoDevice);
        }
        let index = minor.checked_sub(self.base_minor).ok_or(FsError::NoDevice)?;
        let arena = self.arena.upgrade().ok_or(FsError::NoDevice)?;
        let slot = arena.slot(index).ok_or(FsError::NoDevice)?;
        let slot = slot.lock();
        if slot.state != DeviceState::Attached {
            return Err(FsError::NoDevice);
        }
        let key = RoutingKey::new(minor, self.next_session.fetch_add(1, Ordering::Relaxed));
        self.sessions.lock().insert(key, index);
        log::info!(
            "[Led] opened device minor {} session {}",
            minor,
            key.session()
        );
        Ok(key)
    }

    fn release(&self, key: RoutingKey) {
        if self.sessions.lock().remove(&key).is_some() {
            log::debug!("[Led] close session {}", key.session());
        }
    }

    fn read(&self, key: RoutingKey, buf: &mut [u8]) -> Result<usize, FsError> {
        self.session_call(key, |desc, _| {
            let readable = desc.caps.readable.ok_or(DriverError::NotSupported)?;
            readable.read(desc, buf)
        })
    }

    fn write(&self, key: RoutingKey, buf: &UserBuffer<'_>, count: usize) -> Result<usize, FsError> {
        log::debug!("[Led] write entered, minor {}", key.minor());
        self.session_call(key, |desc, registry| {
            let writable = desc.caps.writable.ok_or(DriverError::NotSupported)?;
            writable.write(desc, registry, buf, count)
        })
    }
}
