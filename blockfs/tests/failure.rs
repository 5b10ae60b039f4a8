//! 写入中途失败时的盘上状态：没有回滚，已提交的写入保留

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use blockfs::{
    BLOCK_SIZE, BlockFileSystem, DIR_ENTRY_SIZE, DeviceError, ENTRIES_PER_BLOCK, Error, ROOT_INODE,
    SECTORS_PER_BLOCK,
};
use common::{FaultyDisk, assert_maps_consistent, faulty_fs};

#[test]
fn touch_fails_at_inode_write() {
    let (disk, mut fs) = faulty_fs();
    let before = fs.read_super_block().unwrap();

    // 新数据块与超级块写出后失败
    disk.fail_after_blocks(2);
    let err = fs.touch(ROOT_INODE, "a").unwrap_err();
    assert_eq!(Error::Device(DeviceError::Io(SECTORS_PER_BLOCK)), err);
    disk.heal();

    let after = fs.read_super_block().unwrap();
    assert_eq!(before.free_block_count - 1, after.free_block_count);
    assert_eq!(before.free_inode_count - 1, after.free_inode_count);
    assert_eq!(Error::NotFound, fs.resolve("/a").unwrap_err());
    assert_eq!(256, fs.stat(ROOT_INODE).unwrap().size);
    assert_maps_consistent(&fs);

    // 泄漏的块与 inode 不会再被分配
    let file = fs.touch(ROOT_INODE, "a").unwrap();
    assert_eq!(2, file);
}

#[test]
fn touch_fails_before_superblock() {
    let (disk, mut fs) = faulty_fs();
    let before = fs.read_super_block().unwrap();

    disk.fail_after_blocks(1);
    assert!(matches!(
        fs.mkdir(ROOT_INODE, "d"),
        Err(Error::Device(DeviceError::Io(_)))
    ));
    disk.heal();

    assert_eq!(before, fs.read_super_block().unwrap());
    assert_eq!(2, fs.read_dir(ROOT_INODE).unwrap().len());
}

#[test]
fn touch_fails_growing_directory() {
    let (disk, mut fs) = faulty_fs();
    // 根目录的首块恰好写满
    for i in 0..ENTRIES_PER_BLOCK - 2 {
        fs.touch(ROOT_INODE, &format!("f{i}")).unwrap();
    }
    let root = fs.stat(ROOT_INODE).unwrap();
    assert_eq!((ENTRIES_PER_BLOCK * DIR_ENTRY_SIZE) as u64, root.size);
    let before = fs.read_super_block().unwrap();

    // 新数据块与新目录块写出后，超级块写入失败
    disk.fail_after_blocks(2);
    let err = fs.touch(ROOT_INODE, "next").unwrap_err();
    assert_eq!(Error::Device(DeviceError::Io(0)), err);
    disk.heal();

    assert_eq!(before, fs.read_super_block().unwrap());
    assert_eq!(Error::NotFound, fs.resolve("/next").unwrap_err());
    let after = fs.stat(ROOT_INODE).unwrap();
    assert_eq!(root.size, after.size);
    assert_eq!(root.pointers, after.pointers);
    assert_maps_consistent(&fs);

    // 未记录的两块被重新分配
    let file = fs.touch(ROOT_INODE, "next").unwrap();
    assert_eq!(file, fs.resolve("/next").unwrap());
    assert_eq!(before.free_block_count - 2, fs.read_super_block().unwrap().free_block_count);
}

#[test]
fn append_fails_mid_block() {
    let (disk, mut fs) = faulty_fs();
    let file = fs.touch(ROOT_INODE, "a").unwrap();

    disk.fail_after_sectors(3);
    assert!(fs.append_byte(file, b'x').is_err());
    disk.heal();

    assert_eq!(0, fs.stat(file).unwrap().size);
    assert_eq!(Error::OutOfRange, fs.read_byte(file, 0).unwrap_err());
}

#[test]
fn append_loses_unrecorded_block() {
    let (disk, mut fs) = faulty_fs();
    let file = fs.touch(ROOT_INODE, "a").unwrap();
    fs.write_from(file, 0, &vec![1; BLOCK_SIZE]).unwrap();
    let before = fs.read_super_block().unwrap();

    // 新块已写出，超级块写入失败
    disk.fail_after_blocks(1);
    assert!(fs.append_byte(file, 2).is_err());
    disk.heal();

    assert_eq!(before, fs.read_super_block().unwrap());
    assert_eq!(BLOCK_SIZE as u64, fs.stat(file).unwrap().size);

    // 同一块按首次适配被重新分配
    fs.append_byte(file, 3).unwrap();
    let after = fs.read_super_block().unwrap();
    assert_eq!(before.free_block_count - 1, after.free_block_count);
    assert_eq!(3, fs.read_byte(file, BLOCK_SIZE).unwrap());
    assert_maps_consistent(&fs);
}

#[test]
fn format_fails_on_first_write() {
    let disk = Arc::new(FaultyDisk::new());
    let mut fs = BlockFileSystem::new(disk.clone());

    disk.fail_after_blocks(0);
    assert!(fs.format().is_err());
    disk.heal();

    assert!(!fs.exists().unwrap());
}

#[test]
fn every_transfer_opens_and_closes() {
    let (disk, mut fs) = faulty_fs();
    let file = fs.touch(ROOT_INODE, "a").unwrap();
    fs.write_from(file, 0, b"hello").unwrap();

    let opens = disk.opens.load(Ordering::SeqCst);
    let reads = disk.sector_reads.load(Ordering::SeqCst);
    assert_eq!(b'e', fs.read_byte(file, 1).unwrap());
    // inode 表块与数据块各一次
    assert_eq!(opens + 2, disk.opens.load(Ordering::SeqCst));
    assert_eq!(
        reads + 2 * SECTORS_PER_BLOCK,
        disk.sector_reads.load(Ordering::SeqCst)
    );

    disk.fail_after_sectors(5);
    assert!(fs.touch(ROOT_INODE, "b").is_err());
    disk.heal();

    assert_eq!(
        disk.opens.load(Ordering::SeqCst),
        disk.closes.load(Ordering::SeqCst)
    );
}
