//! Common utilities for tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

use blockfs::{BlockDevice, BlockFileSystem, DEVICE_SECTORS, DeviceError, RamDisk, SECTORS_PER_BLOCK};

/// 在 [`RamDisk`] 之上注入写失败，并统计打开与关闭次数
#[derive(Debug)]
pub struct FaultyDisk {
    disk: RamDisk,
    /// 剩余可成功写入的扇区数，负数表示不限
    writes_left: AtomicIsize,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub sector_reads: AtomicUsize,
}

impl FaultyDisk {
    pub fn new() -> Self {
        Self {
            disk: RamDisk::new(DEVICE_SECTORS),
            writes_left: AtomicIsize::new(-1),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            sector_reads: AtomicUsize::new(0),
        }
    }

    /// 之后只有 `blocks` 次块写入能成功
    pub fn fail_after_blocks(&self, blocks: usize) {
        self.writes_left
            .store((blocks * SECTORS_PER_BLOCK) as isize, Ordering::SeqCst);
    }

    /// 第 `sectors` 个扇区之后的写入全部失败，可落在块中间
    pub fn fail_after_sectors(&self, sectors: usize) {
        self.writes_left.store(sectors as isize, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.writes_left.store(-1, Ordering::SeqCst);
    }
}

impl BlockDevice for FaultyDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.sector_reads.fetch_add(1, Ordering::SeqCst);
        self.disk.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let left = self.writes_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(DeviceError::Io(block_id));
        }
        if left > 0 {
            self.writes_left.store(left - 1, Ordering::SeqCst);
        }
        self.disk.write_block(block_id, buf)
    }

    fn open(&self) -> Result<(), DeviceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// 格式化后的内存文件系统
pub fn ram_fs() -> BlockFileSystem {
    let mut fs = BlockFileSystem::new(Arc::new(RamDisk::new(DEVICE_SECTORS)));
    fs.format().unwrap();
    fs
}

pub fn faulty_fs() -> (Arc<FaultyDisk>, BlockFileSystem) {
    let disk = Arc::new(FaultyDisk::new());
    let mut fs = BlockFileSystem::new(disk.clone());
    fs.format().unwrap();
    (disk, fs)
}

/// 位图置位数与空闲计数一致
pub fn assert_maps_consistent(fs: &BlockFileSystem) {
    let sb = fs.read_super_block().unwrap();
    assert_eq!(
        blockfs::DATA_BLOCKS - sb.free_block_count as usize,
        sb.block_map.count_ones()
    );
    assert_eq!(
        blockfs::INODE_COUNT - sb.free_inode_count as usize,
        sb.inode_map.count_ones()
    );
}
