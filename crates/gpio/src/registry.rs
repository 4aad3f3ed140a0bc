//! GPIO 线所有权注册表
//!
//! [`LineRegistry`] 保证任意时刻一条线至多被一个持有者拥有。
//! 申请成功得到 [`LineHandle`]，句柄是该线所有权的唯一凭证：
//!
//! - 句柄不可复制，释放需要交出句柄，因此同一次申请不会被释放两次；
//! - 句柄被丢弃时自动释放对应的线，不会遗留已申请的资源。

use alloc::collections::btree_map::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;
use sync::SpinLock;

use crate::{GpioChip, GpioError, Level};

struct RegistryInner {
    chip: Arc<dyn GpioChip>,
    /// 线号 -> 申请者标签
    owned: SpinLock<BTreeMap<u32, String>>,
}

impl RegistryInner {
    fn free(&self, line: u32) {
        let mut owned = self.owned.lock();
        if owned.remove(&line).is_some() {
            self.chip.free(line);
            log::debug!("[Gpio] line {} released", line);
        }
    }
}

/// 一条已申请 GPIO 线的独占所有权
#[must_use = "dropping a LineHandle releases the line immediately"]
pub struct LineHandle {
    line: u32,
    inner: Arc<RegistryInner>,
}

impl LineHandle {
    /// 所拥有的线号
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Debug for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineHandle").field("line", &self.line).finish()
    }
}

impl Drop for LineHandle {
    fn drop(&mut self) {
        self.inner.free(self.line);
    }
}

/// GPIO 线所有权注册表
///
/// 克隆得到的实例共享同一张所有权表。
#[derive(Clone)]
pub struct LineRegistry {
    inner: Arc<RegistryInner>,
}

impl LineRegistry {
    /// 在给定控制器之上创建注册表
    pub fn new(chip: Arc<dyn GpioChip>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                chip,
                owned: SpinLock::new(BTreeMap::new()),
            }),
        }
    }

    /// 底层控制器
    pub fn chip(&self) -> &Arc<dyn GpioChip> {
        &self.inner.chip
    }

    /// 申请一条线的独占所有权
    ///
    /// 线已被注册表内的其他持有者拥有时返回 [`GpioError::AlreadyOwned`]；
    /// 平台拒绝时返回 [`GpioError::PlatformRejected`]。失败不会修改所有权表。
    pub fn acquire(&self, line: u32, label: &str) -> Result<LineHandle, GpioError> {
        let mut owned = self.inner.owned.lock();
        if let Some(holder) = owned.get(&line) {
            log::warn!(
                "[Gpio] cannot allocate GPIO pin {}: held by {}",
                line,
                holder
            );
            return Err(GpioError::AlreadyOwned(line));
        }

        match self.inner.chip.request(line, label) {
            Ok(()) => {
                owned.insert(line, label.to_string());
                log::info!("[Gpio] GPIO pin {} allocated successfully", line);
                Ok(LineHandle {
                    line,
                    inner: self.inner.clone(),
                })
            }
            Err(GpioError::AlreadyOwned(_)) => {
                log::warn!("[Gpio] cannot allocate GPIO pin {}: busy on chip", line);
                Err(GpioError::AlreadyOwned(line))
            }
            Err(e) => {
                log::warn!("[Gpio] cannot allocate GPIO pin {}: {}", line, e);
                Err(GpioError::PlatformRejected(line))
            }
        }
    }

    /// 将线配置为输出并写入初始电平
    ///
    /// 失败时句柄仍然有效，调用者负责释放。
    pub fn set_direction_output(&self, handle: &LineHandle, value: Level) -> Result<(), GpioError> {
        self.inner.chip.direction_output(handle.line, value)
    }

    /// 将线配置为输入
    pub fn set_direction_input(&self, handle: &LineHandle) -> Result<(), GpioError> {
        self.inner.chip.direction_input(handle.line)
    }

    /// 写入电平
    pub fn set_value(&self, handle: &LineHandle, value: Level) {
        self.inner.chip.set_value(handle.line, value);
    }

    /// 读取线上的实时电平
    ///
    /// 按线号读取，不要求持有所有权。
    pub fn get_value(&self, line: u32) -> Result<Level, GpioError> {
        self.inner.chip.get_value(line)
    }

    /// 交还句柄并释放线
    pub fn release(&self, handle: LineHandle) {
        drop(handle);
    }

    /// 线是否被注册表内的持有者拥有
    pub fn is_owned(&self, line: u32) -> bool {
        self.inner.owned.lock().contains_key(&line)
    }

    /// 线的持有者标签
    pub fn owner(&self, line: u32) -> Option<String> {
        self.inner.owned.lock().get(&line).cloned()
    }

    /// 当前被拥有的线数量
    pub fn owned_count(&self) -> usize {
        self.inner.owned.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimGpioChip;

    fn registry() -> (Arc<SimGpioChip>, LineRegistry) {
        let chip = SimGpioChip::new("sim", 8);
        let reg = LineRegistry::new(chip.clone());
        (chip, reg)
    }

    #[test]
    fn test_acquire_is_exclusive() {
        let (chip, reg) = registry();
        let h = reg.acquire(2, "LED_RED_pin").unwrap();
        assert_eq!(h.line(), 2);
        assert!(reg.is_owned(2));
        assert_eq!(reg.owner(2).as_deref(), Some("LED_RED_pin"));
        assert!(chip.is_requested(2));

        assert_eq!(
            reg.acquire(2, "LED_RED_2_pin").unwrap_err(),
            GpioError::AlreadyOwned(2)
        );
        // The failed attempt did not disturb the owner.
        assert_eq!(reg.owner(2).as_deref(), Some("LED_RED_pin"));
    }

    #[test]
    fn test_release_frees_chip_line() {
        let (chip, reg) = registry();
        let h = reg.acquire(3, "x").unwrap();
        reg.release(h);
        assert!(!reg.is_owned(3));
        assert!(!chip.is_requested(3));
        assert_eq!(reg.owned_count(), 0);

        // The line can be claimed again.
        let _h = reg.acquire(3, "y").unwrap();
        assert_eq!(reg.owned_count(), 1);
    }

    #[test]
    fn test_drop_releases_line() {
        let (chip, reg) = registry();
        {
            let _h = reg.acquire(4, "scoped").unwrap();
            assert!(chip.is_requested(4));
        }
        assert!(!reg.is_owned(4));
        assert!(!chip.is_requested(4));
    }

    #[test]
    fn test_platform_rejection_maps_to_rejected() {
        let (chip, reg) = registry();
        chip.reject_requests(5).unwrap();
        assert_eq!(
            reg.acquire(5, "x").unwrap_err(),
            GpioError::PlatformRejected(5)
        );
        assert_eq!(
            reg.acquire(42, "x").unwrap_err(),
            GpioError::PlatformRejected(42)
        );
        assert_eq!(reg.owned_count(), 0);
    }

    #[test]
    fn test_line_busy_outside_registry() {
        let (chip, reg) = registry();
        chip.request(6, "firmware").unwrap();
        assert_eq!(reg.acquire(6, "x").unwrap_err(), GpioError::AlreadyOwned(6));
        assert!(!reg.is_owned(6));
    }

    #[test]
    fn test_direction_and_value() {
        let (chip, reg) = registry();
        let h = reg.acquire(2, "x").unwrap();
        reg.set_direction_output(&h, Level::High).unwrap();
        assert_eq!(reg.get_value(2), Ok(Level::High));

        reg.set_value(&h, Level::Low);
        assert_eq!(chip.level(2), Some(Level::Low));

        reg.set_direction_input(&h).unwrap();
        assert_eq!(chip.direction(2), Some(crate::Direction::Input));
    }

    #[test]
    fn test_direction_failure_keeps_handle_valid() {
        let (chip, reg) = registry();
        chip.refuse_output(2).unwrap();
        let h = reg.acquire(2, "x").unwrap();
        assert_eq!(
            reg.set_direction_output(&h, Level::Low),
            Err(GpioError::Unsupported(2))
        );
        assert!(reg.is_owned(2));
        reg.release(h);
        assert!(!chip.is_requested(2));
    }
}
