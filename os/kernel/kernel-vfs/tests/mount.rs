mod common;

use common::{BrokenFs, CountingFs, MemFs};
use kernel_vfs::{FilesystemInfo, NodeType, OpenMode, Vfs, VfsError};
use std::sync::Arc;

fn with_counting(temporary: bool) -> (Vfs, Arc<CountingFs>) {
    let fs = Arc::new(CountingFs::default());
    let mut vfs = Vfs::new().unwrap();
    vfs.register_filesystem(FilesystemInfo::new("testfs", temporary, fs.clone()).unwrap())
        .unwrap();
    (vfs, fs)
}

#[test]
fn mounting_makes_the_driver_tree_reachable() {
    let (mut vfs, fs) = with_counting(true);

    assert_eq!(vfs.open("/mnt/file.txt", OpenMode::Read), Err(VfsError::NotFound));
    vfs.mount("none", "/mnt", "testfs").unwrap();
    assert_eq!(fs.mount_calls(), 1);

    let h = vfs.open("/mnt/file.txt", OpenMode::Read).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(vfs.read(h, &mut buf), Ok(3));
    assert_eq!(&buf[..3], b"abc");
    assert!(vfs.open("/mnt/sub/inner", OpenMode::Read).is_ok());

    // Lookups never call the driver's mount again.
    assert_eq!(fs.mount_calls(), 1);
}

#[test]
fn mount_path_resolves_to_the_mounted_root() {
    let (mut vfs, _) = with_counting(true);
    vfs.create("/mnt", NodeType::Folder).unwrap();
    vfs.create("/mnt/hidden", NodeType::File).unwrap();
    vfs.mount("none", "/mnt", "testfs").unwrap();

    let stat = vfs.stat("/mnt").unwrap();
    assert_eq!(stat.kind, NodeType::Folder);
    assert_eq!(stat.fs, vfs.registry().lookup("testfs"));
    assert_eq!(vfs.stat("/mnt/hidden"), Err(VfsError::NotFound));

    let h = vfs.open("/mnt", OpenMode::Read).unwrap();
    let mut buf = [0u8; 256];
    let n = vfs.getdents(h, &mut buf, 10).unwrap();
    let names: Vec<_> = kernel_vfs::dirent::DirentIter::new(&buf, n).map(|d| d.name).collect();
    assert_eq!(names, ["sub", "file.txt"]);
}

#[test]
fn descriptors_opened_before_a_mount_keep_the_covered_folder() {
    let (mut vfs, _) = with_counting(true);
    vfs.create("/mnt", NodeType::Folder).unwrap();
    vfs.create("/mnt/hidden", NodeType::File).unwrap();
    let before = vfs.open("/mnt", OpenMode::ReadWrite).unwrap();

    vfs.mount("none", "/mnt", "testfs").unwrap();

    let mut buf = [0u8; 256];
    let n = vfs.getdents(before, &mut buf, 10).unwrap();
    let names: Vec<_> = kernel_vfs::dirent::DirentIter::new(&buf, n).map(|d| d.name).collect();
    assert_eq!(names, ["hidden"]);
    assert_eq!(vfs.read(before, &mut buf), Err(VfsError::InvalidArgument));
    assert_eq!(vfs.write(before, b"x"), Err(VfsError::InvalidArgument));
    assert_eq!(vfs.fstat(before).unwrap().kind, NodeType::Mountpoint);

    // A fresh open lands in the mounted tree.
    let after = vfs.open("/mnt", OpenMode::Read).unwrap();
    let n = vfs.getdents(after, &mut buf, 10).unwrap();
    assert_eq!(n, 2);
}

#[test]
fn mount_rejects_bad_targets() {
    let (mut vfs, fs) = with_counting(true);
    vfs.create("/file", NodeType::File).unwrap();

    assert_eq!(vfs.mount("none", "/mnt", "nofs"), Err(VfsError::NotFound));
    assert_eq!(vfs.mount("none", "/file", "testfs"), Err(VfsError::NotADirectory));
    assert_eq!(vfs.mount("none", "/no/such", "testfs"), Err(VfsError::NotFound));
    assert_eq!(fs.mount_calls(), 0);

    vfs.mount("none", "/mnt", "testfs").unwrap();
    assert_eq!(vfs.mount("none", "/mnt", "testfs"), Err(VfsError::AlreadyExists));
    assert_eq!(fs.mount_calls(), 1);
}

#[test]
fn device_backed_formats_receive_the_device_node() {
    let (mut vfs, fs) = with_counting(false);
    assert_eq!(vfs.mount("/dev/disk", "/mnt", "testfs"), Err(VfsError::NotFound));
    assert_eq!(fs.mount_calls(), 0);

    vfs.create("/dev", NodeType::Folder).unwrap();
    vfs.create("/dev/tty", NodeType::CharDevice).unwrap();
    vfs.create("/dev/disk", NodeType::BlockDevice).unwrap();

    // The driver refuses the wrong kind of device; the auto-created folder is rolled back.
    assert_eq!(vfs.mount("/dev/tty", "/mnt", "testfs"), Err(VfsError::InvalidArgument));
    assert_eq!(vfs.stat("/mnt"), Err(VfsError::NotFound));

    vfs.mount("/dev/disk", "/mnt", "testfs").unwrap();
    assert_eq!(fs.mount_calls(), 2);
    assert!(vfs.stat("/mnt/file.txt").is_ok());
}

#[test]
fn nested_mounts_are_crossed() {
    let (mut vfs, _) = with_counting(true);
    vfs.register_filesystem(common::memfs()).unwrap();
    vfs.mount("none", "/mnt", "testfs").unwrap();
    vfs.mount("none", "/mnt/sub/deeper", "memfs").unwrap();

    vfs.create("/mnt/sub/deeper/x", NodeType::File).unwrap();
    let stat = vfs.stat("/mnt/sub/deeper/x").unwrap();
    assert_eq!(stat.fs, vfs.registry().lookup("memfs"));
    assert_eq!(vfs.registry().mount_count(stat.fs.unwrap()), 1);
}

#[test]
fn mounted_formats_cannot_be_unregistered() {
    let mut vfs = common::mounted_memfs();
    assert_eq!(vfs.unregister_filesystem("memfs").unwrap_err(), VfsError::InvalidArgument);
    assert_eq!(vfs.unregister_filesystem("ext2").unwrap_err(), VfsError::NotFound);

    vfs.register_filesystem(FilesystemInfo::new("spare", true, Arc::new(MemFs)).unwrap())
        .unwrap();
    assert_eq!(vfs.unregister_filesystem("spare").unwrap().name.as_str(), "spare");
}

#[test]
fn registry_limits() {
    let mut vfs = Vfs::new().unwrap();
    vfs.register_filesystem(common::memfs()).unwrap();
    assert_eq!(vfs.register_filesystem(common::memfs()), Err(VfsError::AlreadyExists));
    for i in 1..kernel_vfs::limits::MAX_FILESYSTEMS {
        vfs.register_filesystem(FilesystemInfo::new(&format!("fs{i}"), true, Arc::new(MemFs)).unwrap())
            .unwrap();
    }
    let extra = FilesystemInfo::new("extra", true, Arc::new(MemFs)).unwrap();
    assert_eq!(vfs.register_filesystem(extra), Err(VfsError::RegistryFull));
    assert_eq!(VfsError::RegistryFull.code(), VfsError::NoSpace.code());
}

#[test]
fn driver_errors_pass_through_unchanged() {
    let mut vfs = Vfs::new().unwrap();
    let broken = FilesystemInfo::new("broken", true, Arc::new(BrokenFs(VfsError::NoSpace))).unwrap();
    vfs.register_filesystem(broken).unwrap();
    vfs.mount("none", "/b", "broken").unwrap();

    let before = vfs.entry_count();
    assert_eq!(vfs.create("/b/x", NodeType::File), Err(VfsError::NoSpace));
    assert_eq!(vfs.entry_count(), before);
    assert_eq!(vfs.stat("/b/x"), Err(VfsError::NotFound));
}
