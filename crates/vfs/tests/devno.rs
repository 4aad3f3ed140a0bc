use vfs::{
    alloc_chrdev_region, chrdev_major,
    dev::{major, makedev, minor},
    get_chrdev_driver,
};

#[test]
fn test_makedev_major_minor() {
    let dev = makedev(8, 1);
    assert_eq!(major(dev), 8);
    assert_eq!(minor(dev), 1);
}

#[test]
fn test_makedev_roundtrip_dynamic_range() {
    for maj in [chrdev_major::DYN_MIN, 254, 255, 256, chrdev_major::DYN_MAX] {
        for min in [0, 1, 2, 255, 256] {
            let dev = makedev(maj, min);
            assert_eq!(major(dev), maj);
            assert_eq!(minor(dev), min);
        }
    }
}

#[test]
fn test_devno_unique() {
    let dev1 = makedev(240, 0);
    let dev2 = makedev(240, 1);
    let dev3 = makedev(241, 0);

    assert_ne!(dev1, dev2);
    assert_ne!(dev1, dev3);
    assert_ne!(dev2, dev3);
}

#[test]
fn test_regions_get_distinct_dynamic_majors() {
    let a = alloc_chrdev_region(0, 3, "devno_a").unwrap();
    let b = alloc_chrdev_region(0, 2, "devno_b").unwrap();
    assert_ne!(a.major(), b.major());
    for region in [&a, &b] {
        assert!(region.major() >= chrdev_major::DYN_MIN);
        assert!(region.major() <= chrdev_major::DYN_MAX);
    }
}

#[test]
fn test_no_driver_before_cdev_add() {
    let region = alloc_chrdev_region(0, 1, "devno_bare").unwrap();
    assert!(get_chrdev_driver(region.dev(0).unwrap()).is_none());
}
