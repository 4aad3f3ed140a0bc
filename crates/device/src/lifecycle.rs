//! 设备生命周期管理
//!
//! `Unmatched → Attaching → Attached → Detaching → Unmatched`。
//!
//! attach 先校验元数据（失败不触碰任何资源），再申请 GPIO 线并设置为输出；
//! 这一步失败只记录日志，设备仍然暴露，结果为 [`AttachOutcome::Degraded`]。
//! 设备节点或属性文件创建失败则回滚已做的一切并返回 [`DriverError::ExposureFailed`]。
//! detach 先撤销暴露，再把电平清零并释放 GPIO 线。
//! exit 是终态：之后的 attach 与 open 都返回 `NoDevice`，major 号立即归还。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use gpio::{Level, LineHandle, LineRegistry};
use vfs::{
    ChrdevRegion, DeviceClass, FileMode, FsError, StoreFn, SysfsAttr, SysfsTree,
    alloc_chrdev_region, class_create, unregister_chrdev_region,
};

use crate::bus::{PlatformDevice, PlatformDriver};
use crate::caps::{AttrSpec, Capabilities};
use crate::catalog::{DeviceCatalog, DeviceMetadata};
use crate::config::{DriverConfig, MAX_DEVICES};
use crate::descriptor::{DeviceArena, DeviceDescriptor, DeviceState};
use crate::error::{AttachOutcome, DriverError};
use crate::router::IoRouter;

/// GPIO LED 平台驱动
pub struct GpioLedDriver {
    config: DriverConfig,
    catalog: DeviceCatalog,
    registry: LineRegistry,
    arena: Arc<DeviceArena>,
    router: Arc<IoRouter>,
    region: Arc<ChrdevRegion>,
    class: Arc<DeviceClass>,
    sysfs: SysfsTree,
    exited: AtomicBool,
}

impl GpioLedDriver {
    /// 加载驱动：分配设备号区间、挂上路由器、创建设备类
    pub fn new(config: DriverConfig, registry: LineRegistry) -> Result<Self, DriverError> {
        if config.minor_count == 0 || config.minor_count > MAX_DEVICES {
            return Err(DriverError::InvalidArgument);
        }
        let region = alloc_chrdev_region(config.base_minor, config.minor_count, config.driver_name)
            .map_err(|e| {
                log::error!("[Led] device number could not be allocated: {:?}", e);
                DriverError::ExposureFailed(e)
            })?;

        let arena = Arc::new(DeviceArena::new(config.minor_count));
        let router = Arc::new(IoRouter::new(
            Arc::downgrade(&arena),
            registry.clone(),
            config.base_minor,
        ));
        region.cdev_add(router.clone()).map_err(|e| {
            log::error!("[Led] adding the device to the kernel failed: {:?}", e);
            DriverError::ExposureFailed(e)
        })?;
        let class = class_create(config.class_name);

        log::info!(
            "[Led] platform driver {} inserted (major {})",
            config.platform_name,
            region.major()
        );
        Ok(Self {
            config,
            catalog: DeviceCatalog::new(config.mode),
            registry,
            arena,
            router,
            region,
            class,
            sysfs: SysfsTree::new(),
            exited: AtomicBool::new(false),
        })
    }

    /// 驱动配置
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 设备目录
    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// GPIO 线注册表
    pub fn registry(&self) -> &LineRegistry {
        &self.registry
    }

    /// 设备号区间
    pub fn region(&self) -> &Arc<ChrdevRegion> {
        &self.region
    }

    /// 设备类（`/dev` 节点）
    pub fn class(&self) -> &Arc<DeviceClass> {
        &self.class
    }

    /// sysfs 属性目录
    pub fn sysfs(&self) -> &SysfsTree {
        &self.sysfs
    }

    /// I/O 路由器
    pub fn router(&self) -> &Arc<IoRouter> {
        &self.router
    }

    /// 驱动是否已卸载
    pub fn is_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// 槽位状态
    pub fn state(&self, index: u32) -> Option<DeviceState> {
        self.arena.state(index)
    }

    /// 在已绑定设备的描述符上执行只读检查
    pub fn inspect<R>(&self, identity: &str, f: impl FnOnce(&DeviceDescriptor) -> R) -> Option<R> {
        let index = self.arena.find(identity)?;
        let slot = self.arena.slot(index)?.lock();
        slot.desc.as_ref().map(f)
    }

    /// 绑定设备
    pub fn attach(&self, dev: &PlatformDevice) -> Result<AttachOutcome, DriverError> {
        log::info!("[Led] probe {}", dev.name());
        if self.is_exited() {
            log::warn!("[Led] probe {} after driver exit", dev.name());
            return Err(DriverError::NoDevice);
        }
        let meta = self.catalog.resolve(dev)?;
        let slot = self
            .arena
            .slot(meta.index)
            .ok_or(DriverError::UnknownDevice)?;
        let devno = self
            .region
            .dev(meta.index)
            .ok_or(DriverError::UnknownDevice)?;

        {
            let mut slot = slot.lock();
            if slot.state != DeviceState::Unmatched {
                log::warn!(
                    "[Led] {} is already bound (state {:?})",
                    meta.identity,
                    slot.state
                );
                return Err(DriverError::ResourceUnavailable(
                    gpio::GpioError::AlreadyOwned(meta.line),
                ));
            }
            slot.state = DeviceState::Attaching;
        }

        let (handle, degraded) = self.bind_line(&meta);
        let caps = Capabilities::for_kind(meta.kind);

        if let Err(e) = self.expose(&meta, devno, &caps) {
            log::error!(
                "[Led] can not create device file for {}: {:?}",
                meta.identity,
                e
            );
            if let Some(handle) = handle {
                self.registry.release(handle);
            }
            slot.lock().state = DeviceState::Unmatched;
            return Err(DriverError::ExposureFailed(e));
        }

        let identity = meta.identity.clone();
        {
            let mut slot = slot.lock();
            // exit 先置位再逐槽加锁扫描
            if self.is_exited() {
                slot.state = DeviceState::Unmatched;
                drop(slot);
                log::warn!("[Led] {}: driver exited during probe", identity);
                self.unexpose(&identity, meta.index);
                if let Some(handle) = handle {
                    self.registry.release(handle);
                }
                return Err(DriverError::NoDevice);
            }
            slot.desc = Some(DeviceDescriptor::new(meta, handle, caps));
            slot.state = DeviceState::Attached;
        }

        match degraded {
            None => {
                log::info!("[Led] {} attached", identity);
                Ok(AttachOutcome::Attached)
            }
            Some(e) => {
                log::warn!("[Led] {} attached without a usable GPIO pin", identity);
                Ok(AttachOutcome::Degraded(e))
            }
        }
    }

    /// 申请 GPIO 线并设置为输出；失败时返回降级原因
    fn bind_line(&self, meta: &DeviceMetadata) -> (Option<LineHandle>, Option<gpio::GpioError>) {
        let label = alloc::format!("{}_pin", meta.identity);
        let handle = match self.registry.acquire(meta.line, &label) {
            Ok(handle) => handle,
            Err(e) => return (None, Some(e)),
        };
        match self.registry.set_direction_output(&handle, meta.value) {
            Ok(()) => {
                log::info!("[Led] GPIO pin {} set to be output", meta.line);
                (Some(handle), None)
            }
            Err(e) => {
                log::warn!("[Led] cannot set the GPIO pin {} to be output", meta.line);
                self.registry.release(handle);
                (None, Some(e))
            }
        }
    }

    /// 创建设备节点与属性文件；失败时撤销本次创建的部分
    fn expose(&self, meta: &DeviceMetadata, devno: u64, caps: &Capabilities) -> Result<(), FsError> {
        self.class
            .device_create(devno, &meta.identity, FileMode::from_perm(meta.perm))?;
        log::info!("[Led] device file created for {}", meta.identity);

        let Some(attrs) = caps.attributes else {
            return Ok(());
        };
        let mut created: Vec<&'static str> = Vec::new();
        for attr in attrs.attributes() {
            if let Err(e) = self
                .sysfs
                .create_file(&meta.identity, self.make_attr(meta.index, attr))
            {
                log::error!("[Led] failed to create sysfs attribute file {}", attr.name);
                for name in created {
                    self.sysfs.remove_file(&meta.identity, name);
                }
                self.class.device_destroy(devno);
                return Err(e);
            }
            created.push(attr.name);
        }
        log::info!("[Led] done creating the attributes for {}", meta.identity);
        Ok(())
    }

    fn make_attr(&self, index: u32, attr: &AttrSpec) -> SysfsAttr {
        let name = attr.name;
        let router = Arc::downgrade(&self.router);
        let show_router = router.clone();
        let store: Option<StoreFn> = attr.writable.then(|| {
            Arc::new(move |buf: &[u8]| {
                let router = router.upgrade().ok_or(FsError::NoDevice)?;
                router.store_index(index, name, buf).map_err(FsError::from)
            }) as StoreFn
        });
        SysfsAttr {
            name: String::from(name),
            mode: FileMode::from_perm(attr.mode),
            show: Arc::new(move || {
                let router = show_router.upgrade().ok_or(FsError::NoDevice)?;
                router.show_index(index, name).map_err(FsError::from)
            }),
            store,
        }
    }

    /// 解绑设备
    ///
    /// 设备不处于 Attached 状态时返回 [`DriverError::NotAttached`]，不产生任何副作用。
    pub fn detach(&self, dev: &PlatformDevice) -> Result<(), DriverError> {
        let index = self.catalog.index_of(dev)?;
        self.detach_index(index)
    }

    fn detach_index(&self, index: u32) -> Result<(), DriverError> {
        let slot = self.arena.slot(index).ok_or(DriverError::UnknownDevice)?;
        let mut desc = {
            let mut slot = slot.lock();
            if slot.state != DeviceState::Attached {
                return Err(DriverError::NotAttached);
            }
            let Some(desc) = slot.desc.take() else {
                return Err(DriverError::NotAttached);
            };
            slot.state = DeviceState::Detaching;
            desc
        };

        let revoked = self.router.revoke(index);
        if revoked > 0 {
            log::debug!("[Led] {}: {} open sessions revoked", desc.identity, revoked);
        }
        self.unexpose(&desc.identity, index);

        match desc.handle.take() {
            Some(handle) => {
                self.registry.set_value(&handle, Level::Low);
                self.registry.release(handle);
            }
            None => log::debug!("[Led] {}: no GPIO pin to release", desc.identity),
        }

        slot.lock().state = DeviceState::Unmatched;
        log::info!("[Led] {} removed", desc.identity);
        Ok(())
    }

    /// 移除属性目录与设备节点
    fn unexpose(&self, identity: &str, index: u32) {
        self.sysfs.remove_dir(identity);
        if let Some(devno) = self.region.dev(index) {
            self.class.device_destroy(devno);
        }
    }

    /// 卸载驱动：解绑仍在绑定的设备，移除节点，注销设备号区间
    ///
    /// 重复调用无副作用。
    pub fn exit(&self) {
        if self.exited.swap(true, Ordering::AcqRel) {
            return;
        }
        self.router.shutdown();
        for index in self.arena.attached() {
            if let Err(e) = self.detach_index(index) {
                log::warn!("[Led] slot {} detach on exit failed: {}", index, e);
            }
        }
        for node in self.class.nodes() {
            self.class.device_destroy(node.dev);
        }
        unregister_chrdev_region(&self.region);
        log::info!("[Led] goodbye from {}", self.config.driver_name);
    }
}

impl PlatformDriver for GpioLedDriver {
    fn name(&self) -> &str {
        self.config.platform_name
    }

    fn id_table(&self) -> &[&'static str] {
        self.catalog.id_names()
    }

    fn of_match_table(&self) -> &[&'static str] {
        self.catalog.of_match_table()
    }

    fn probe(&self, dev: &PlatformDevice) -> Result<AttachOutcome, DriverError> {
        self.attach(dev)
    }

    fn remove(&self, dev: &PlatformDevice) -> Result<(), DriverError> {
        self.detach(dev)
    }
}
