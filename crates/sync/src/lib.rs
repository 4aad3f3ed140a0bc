//! 同步原语
//!
//! 向其它模块提供基本的锁原语：自旋互斥锁与读写自旋锁。
//!
//! 原始锁实现 [`lock_api`] 的 `RawMutex` / `RawRwLock`，
//! 对外通过类型别名暴露带数据的 RAII 封装：
//!
//! ```ignore
//! let lock = SpinLock::new(0);
//! {
//!     let mut guard = lock.lock(); // 获取锁
//!     *guard += 1; // 访问和修改数据
//! } // 离开作用域，自动释放锁
//! ```
//!
//! # 注意
//! SpinLock 不是可重入的。持有锁时再次获取将导致死锁。
//! 临界区应只包含有界的短操作（例如一次寄存器读写）。

#![no_std]

mod raw_spin_lock;
mod rwlock;

pub use raw_spin_lock::RawSpinLock;
pub use rwlock::RawRwSpinLock;

/// 提供对数据的互斥访问的自旋锁
pub type SpinLock<T> = lock_api::Mutex<RawSpinLock, T>;

/// [`SpinLock`] 的 RAII 保护器，离开作用域时自动释放锁
pub type SpinLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLock, T>;

/// 读写自旋锁
pub type RwLock<T> = lock_api::RwLock<RawRwSpinLock, T>;

/// [`RwLock`] 的共享读保护器
pub type RwLockReadGuard<'a, T> = lock_api::RwLockReadGuard<'a, RawRwSpinLock, T>;

/// [`RwLock`] 的独占写保护器
pub type RwLockWriteGuard<'a, T> = lock_api::RwLockWriteGuard<'a, RawRwSpinLock, T>;
