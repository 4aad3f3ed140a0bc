//! 读写自旋锁实现
//!
//! 允许多个读者并发，写者独占。作为 [`lock_api::RawRwLock`] 的底层实现。

use core::{
    hint,
    sync::atomic::{AtomicUsize, Ordering},
};

/// 写者持有标志位
const WRITER: usize = 1;
/// 每个读者占用的计数单位
const READER: usize = 2;

/// 原始读写自旋锁
///
/// 状态字最低位表示写者，其余位为读者计数。
/// 读者优先，写者在存在读者时自旋等待。
#[derive(Debug)]
pub struct RawRwSpinLock {
    state: AtomicUsize,
}

impl RawRwSpinLock {
    /// 创建一个未加锁的读写锁
    pub const fn new() -> Self {
        RawRwSpinLock {
            state: AtomicUsize::new(0),
        }
    }
}

impl Default for RawRwSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: 写者仅在状态为 0 时通过 CAS 获得所有权；
// 读者在观察到写者位时撤销自己的计数，因此读写不会同时持有。
unsafe impl lock_api::RawRwLock for RawRwSpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = RawRwSpinLock::new();

    type GuardMarker = lock_api::GuardSend;

    fn lock_shared(&self) {
        while !self.try_lock_shared() {
            hint::spin_loop();
        }
    }

    fn try_lock_shared(&self) -> bool {
        let prev = self.state.fetch_add(READER, Ordering::Acquire);
        if prev & WRITER != 0 {
            self.state.fetch_sub(READER, Ordering::Relaxed);
            false
        } else {
            true
        }
    }

    unsafe fn unlock_shared(&self) {
        self.state.fetch_sub(READER, Ordering::Release);
    }

    fn lock_exclusive(&self) {
        while !self.try_lock_exclusive() {
            hint::spin_loop();
        }
    }

    fn try_lock_exclusive(&self) -> bool {
        self.state
            .compare_exchange(0, WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock_exclusive(&self) {
        self.state.fetch_and(!WRITER, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) != 0
    }
}
