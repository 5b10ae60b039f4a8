use alloc::boxed::Box;
use alloc::vec;

use spin::Mutex;

use crate::{BlockDevice, DeviceError, SECTOR_SIZE};

/// 内存中的块设备，适合测试与无盘环境
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Box<[u8]>>,
    sectors: usize,
}

impl RamDisk {
    /// 创建容量为 `sectors` 个扇区的全零设备
    pub fn new(sectors: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; sectors * SECTOR_SIZE].into_boxed_slice()),
            sectors,
        }
    }

    fn range(&self, block_id: usize, len: usize) -> Result<core::ops::Range<usize>, DeviceError> {
        if block_id >= self.sectors || len != SECTOR_SIZE {
            log::warn!("ram disk: rejected sector {block_id} (len {len})");
            return Err(DeviceError::OutOfRange(block_id));
        }

        let start = block_id * SECTOR_SIZE;
        Ok(start..start + SECTOR_SIZE)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let range = self.range(block_id, buf.len())?;
        buf.copy_from_slice(&self.data.lock()[range]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let range = self.range(block_id, buf.len())?;
        self.data.lock()[range].copy_from_slice(buf);
        Ok(())
    }
}
