//! 设备描述符与槽位
//!
//! 每个设备占据一个固定槽位，槽位序号即 minor 偏移。槽位各自加锁，
//! 状态与描述符在同一把锁下修改。

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use gpio::{Direction, Level, LineHandle};
use sync::SpinLock;
use vfs::FileMode;

use crate::caps::Capabilities;
use crate::catalog::{DeviceKind, DeviceMetadata};

/// 设备生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// 未绑定
    Unmatched,
    /// 正在 attach
    Attaching,
    /// 已绑定并暴露
    Attached,
    /// 正在 detach
    Detaching,
}

/// 已绑定设备的状态
pub struct DeviceDescriptor {
    /// 设备身份
    pub identity: String,
    /// 槽位序号
    pub index: u32,
    /// GPIO 线号
    pub line: u32,
    /// 当前方向
    pub direction: Direction,
    /// 当前逻辑电平
    pub value: Level,
    /// 声明的缓冲区大小
    pub buffer_size: usize,
    /// 节点权限
    pub perm: FileMode,
    /// 设备种类
    pub kind: DeviceKind,
    /// 流写入缓冲区，长度恒为 `buffer_size`
    pub(crate) buffer: Vec<u8>,
    /// GPIO 线所有权；降级设备为 None
    pub(crate) handle: Option<LineHandle>,
    /// attach 时选定的能力
    pub(crate) caps: Capabilities,
}

impl DeviceDescriptor {
    pub(crate) fn new(meta: DeviceMetadata, handle: Option<LineHandle>, caps: Capabilities) -> Self {
        Self {
            identity: meta.identity,
            index: meta.index,
            line: meta.line,
            direction: Direction::Output,
            value: meta.value,
            buffer_size: meta.buffer_size,
            perm: FileMode::from_perm(meta.perm),
            kind: meta.kind,
            buffer: vec![0; meta.buffer_size],
            handle,
            caps,
        }
    }

    /// 是否持有 GPIO 线
    pub fn has_line(&self) -> bool {
        self.handle.is_some()
    }

    /// 最近一次流写入的缓冲区内容
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// 一个设备槽位
pub struct DeviceSlot {
    /// 生命周期状态
    pub state: DeviceState,
    /// 描述符，仅 Attached 时存在
    pub desc: Option<DeviceDescriptor>,
}

/// 设备槽位集合
pub struct DeviceArena {
    slots: Vec<SpinLock<DeviceSlot>>,
}

impl DeviceArena {
    /// 创建 `count` 个空槽位
    pub fn new(count: u32) -> Self {
        Self {
            slots: (0..count)
                .map(|_| {
                    SpinLock::new(DeviceSlot {
                        state: DeviceState::Unmatched,
                        desc: None,
                    })
                })
                .collect(),
        }
    }

    /// 第 `index` 个槽位
    pub fn slot(&self, index: u32) -> Option<&SpinLock<DeviceSlot>> {
        self.slots.get(index as usize)
    }

    /// 槽位数
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否没有槽位
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 槽位状态
    pub fn state(&self, index: u32) -> Option<DeviceState> {
        self.slot(index).map(|s| s.lock().state)
    }

    /// 按身份查找已绑定设备的槽位序号
    pub fn find(&self, identity: &str) -> Option<u32> {
        self.slots.iter().position(|s| {
            s.lock()
                .desc
                .as_ref()
                .is_some_and(|d| d.identity == identity)
        })
        .map(|i| i as u32)
    }

    /// 处于 Attached 状态的槽位序号
    pub fn attached(&self) -> Vec<u32> {
        (0..self.slots.len() as u32)
            .filter(|&i| self.state(i) == Some(DeviceState::Attached))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(identity: &str, index: u32) -> DeviceMetadata {
        DeviceMetadata {
            identity: identity.into(),
            index,
            line: 2,
            value: Level::High,
            buffer_size: 3,
            perm: 0o100644,
            kind: DeviceKind::Stream,
        }
    }

    #[test]
    fn test_descriptor_from_metadata() {
        let desc = DeviceDescriptor::new(
            meta("LED_RED", 0),
            None,
            Capabilities::for_kind(DeviceKind::Stream),
        );
        assert_eq!(desc.direction, Direction::Output);
        assert_eq!(desc.value, Level::High);
        assert_eq!(desc.buffer(), &[0, 0, 0]);
        assert_eq!(desc.perm.bits(), 0o644);
        assert!(!desc.has_line());
    }

    #[test]
    fn test_arena_find_and_attached() {
        let arena = DeviceArena::new(3);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.state(3), None);
        {
            let mut slot = arena.slot(1).unwrap().lock();
            slot.desc = Some(DeviceDescriptor::new(
                meta("LED_RED_2", 1),
                None,
                Capabilities::for_kind(DeviceKind::Stream),
            ));
            slot.state = DeviceState::Attached;
        }
        assert_eq!(arena.find("LED_RED_2"), Some(1));
        assert_eq!(arena.find("LED_RED"), None);
        assert_eq!(arena.attached(), [1]);
    }
}
