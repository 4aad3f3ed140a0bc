use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use vfs::{
    AccessMode, CharDeviceFile, CharDriver, File, FileMode, FsError, RoutingKey, UserBuffer,
    alloc_chrdev_region, class_create, copy_from_user,
};

/// 记录调用的驱动
#[derive(Default)]
struct EchoDriver {
    next: AtomicU64,
    open: Mutex<Vec<RoutingKey>>,
    written: Mutex<Vec<u8>>,
}

impl CharDriver for EchoDriver {
    fn open(&self, minor: u32) -> Result<RoutingKey, FsError> {
        if minor > 1 {
            return Err(FsError::NoDevice);
        }
        let key = RoutingKey::new(minor, self.next.fetch_add(1, Ordering::SeqCst));
        self.open.lock().unwrap().push(key);
        Ok(key)
    }

    fn release(&self, key: RoutingKey) {
        self.open.lock().unwrap().retain(|k| *k != key);
    }

    fn read(&self, _key: RoutingKey, _buf: &mut [u8]) -> Result<usize, FsError> {
        Err(FsError::NotSupported)
    }

    fn write(&self, key: RoutingKey, buf: &UserBuffer<'_>, count: usize) -> Result<usize, FsError> {
        if !self.open.lock().unwrap().contains(&key) {
            return Err(FsError::BadFileDescriptor);
        }
        let mut tmp = vec![0u8; count];
        let not_copied = copy_from_user(&mut tmp, buf);
        self.written
            .lock()
            .unwrap()
            .extend_from_slice(&tmp[..count - not_copied]);
        Ok(count - not_copied)
    }
}

#[test]
fn test_open_write_close() {
    let region = alloc_chrdev_region(0, 2, "chrdev_echo").unwrap();
    let driver = Arc::new(EchoDriver::default());
    region.cdev_add(driver.clone()).unwrap();
    let class = class_create("echo_class");
    class
        .device_create(region.dev(0).unwrap(), "echo0", FileMode::from_perm(0o666))
        .unwrap();

    let file = CharDeviceFile::open(&class, "echo0", AccessMode::ReadWrite).unwrap();
    assert_eq!(file.key().minor(), 0);
    assert_eq!(driver.open.lock().unwrap().len(), 1);

    assert_eq!(file.write(&UserBuffer::new(b"10"), 2), Ok(2));
    assert_eq!(file.write(&UserBuffer::new(b"1"), 3), Ok(1));
    assert_eq!(&*driver.written.lock().unwrap(), b"101");
    assert_eq!(file.read(&mut [0u8; 4]), Err(FsError::NotSupported));

    drop(file);
    assert!(driver.open.lock().unwrap().is_empty());
}

#[test]
fn test_sessions_get_distinct_keys() {
    let region = alloc_chrdev_region(0, 2, "chrdev_keys").unwrap();
    region.cdev_add(Arc::new(EchoDriver::default())).unwrap();
    let a = CharDeviceFile::open_dev(region.dev(1).unwrap(), AccessMode::WriteOnly).unwrap();
    let b = CharDeviceFile::open_dev(region.dev(1).unwrap(), AccessMode::WriteOnly).unwrap();
    assert_ne!(a.key(), b.key());
    assert_eq!(a.key().minor(), 1);
    assert_eq!(a.read(&mut [0u8; 1]), Err(FsError::PermissionDenied));
}

#[test]
fn test_open_missing_node_or_driver() {
    let region = alloc_chrdev_region(0, 1, "chrdev_missing").unwrap();
    let class = class_create("missing_class");
    assert_eq!(
        CharDeviceFile::open(&class, "nothing", AccessMode::ReadWrite).err(),
        Some(FsError::NotFound)
    );
    class
        .device_create(region.dev(0).unwrap(), "nodrv", FileMode::from_perm(0o600))
        .unwrap();
    assert_eq!(
        CharDeviceFile::open(&class, "nodrv", AccessMode::ReadWrite).err(),
        Some(FsError::NoDevice)
    );
}

#[test]
fn test_double_cdev_add_rejected() {
    let region = alloc_chrdev_region(0, 1, "chrdev_twice").unwrap();
    region.cdev_add(Arc::new(EchoDriver::default())).unwrap();
    assert_eq!(
        region.cdev_add(Arc::new(EchoDriver::default())),
        Err(FsError::AlreadyExists)
    );
    region.cdev_del();
    assert!(region.driver().is_none());
}

#[test]
fn test_node_name_and_dev_unique() {
    let region = alloc_chrdev_region(0, 2, "chrdev_nodes").unwrap();
    let class = class_create("nodes_class");
    let d0 = region.dev(0).unwrap();
    let d1 = region.dev(1).unwrap();
    class.device_create(d0, "led", FileMode::from_perm(0o666)).unwrap();
    assert_eq!(
        class.device_create(d1, "led", FileMode::from_perm(0o666)),
        Err(FsError::AlreadyExists)
    );
    assert_eq!(
        class.device_create(d0, "other", FileMode::from_perm(0o666)),
        Err(FsError::AlreadyExists)
    );
    assert_eq!(class.device_destroy(d0).map(|n| n.name), Some("led".to_string()));
    assert!(class.is_empty());
}
