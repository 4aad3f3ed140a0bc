//! 设备号编码
//!
//! 与 glibc `makedev` 相同的 64 位编码：major 占 32 位，minor 占 32 位，
//! 低 8 位 minor 与 12 位 major 保持旧式 16 位设备号兼容。

/// 由 major/minor 组合设备号
#[inline]
pub const fn makedev(major: u32, minor: u32) -> u64 {
    let major = major as u64;
    let minor = minor as u64;
    ((major & 0xffff_f000) << 32)
        | ((major & 0x0000_0fff) << 8)
        | ((minor & 0xffff_ff00) << 12)
        | (minor & 0x0000_00ff)
}

/// 提取 major
#[inline]
pub const fn major(dev: u64) -> u32 {
    (((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0x0000_0fff)) as u32
}

/// 提取 minor
#[inline]
pub const fn minor(dev: u64) -> u32 {
    (((dev >> 12) & 0xffff_ff00) | (dev & 0x0000_00ff)) as u32
}
