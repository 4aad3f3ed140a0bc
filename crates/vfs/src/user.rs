//! 用户空间缓冲区
//!
//! 宿主环境下没有页表，用户内存以调用者实际映射的字节切片表示；
//! 超出切片的部分视为不可访问，对应内核 `copy_from_user` 的“未拷贝字节”。

/// 调用者映射的用户内存
#[derive(Debug, Clone, Copy)]
pub struct UserBuffer<'a> {
    mapped: &'a [u8],
}

impl<'a> UserBuffer<'a> {
    /// 用已映射的字节构造
    pub const fn new(mapped: &'a [u8]) -> Self {
        Self { mapped }
    }

    /// 可访问的字节数
    pub const fn len(&self) -> usize {
        self.mapped.len()
    }

    /// 是否没有任何可访问字节
    pub const fn is_empty(&self) -> bool {
        self.mapped.is_empty()
    }
}

impl<'a> From<&'a [u8]> for UserBuffer<'a> {
    fn from(mapped: &'a [u8]) -> Self {
        Self::new(mapped)
    }
}

/// 从用户缓冲区拷贝 `dst.len()` 字节
///
/// 返回未能拷贝的字节数；拷贝成功的部分写入 `dst` 的前缀，其余保持不变。
pub fn copy_from_user(dst: &mut [u8], src: &UserBuffer<'_>) -> usize {
    let n = dst.len().min(src.mapped.len());
    dst[..n].copy_from_slice(&src.mapped[..n]);
    dst.len() - n
}
