//! # 块转换层
//!
//! 文件系统块由 [`SECTORS_PER_BLOCK`] 个连续扇区组成，所有读写都经过这里。
//!
//! 每次块传输都会打开设备、传输完毕后关闭设备；
//! 任一扇区失败即中止整块传输，已传输的扇区不会回滚。

use alloc::boxed::Box;

use block_dev::BlockDevice;
use vfs::{Error, Result};

use crate::{BLOCK_COUNT, BLOCK_SIZE, DataBlock, SECTOR_SIZE, SECTORS_PER_BLOCK};

/// 全零的块缓冲区，每次调用各自持有
#[inline]
pub fn zeroed() -> Box<DataBlock> {
    Box::new([0; BLOCK_SIZE])
}

pub fn read(dev: &dyn BlockDevice, block_id: usize, buf: &mut DataBlock) -> Result<()> {
    let session = Session::open(dev, block_id)?;
    for (i, sector) in buf.chunks_exact_mut(SECTOR_SIZE).enumerate() {
        session.dev.read_block(block_id * SECTORS_PER_BLOCK + i, sector)?;
    }
    log::trace!("read block {block_id}");

    Ok(())
}

pub fn write(dev: &dyn BlockDevice, block_id: usize, buf: &DataBlock) -> Result<()> {
    let session = Session::open(dev, block_id)?;
    for (i, sector) in buf.chunks_exact(SECTOR_SIZE).enumerate() {
        session.dev.write_block(block_id * SECTORS_PER_BLOCK + i, sector)?;
    }
    log::trace!("write block {block_id}");

    Ok(())
}

/// 对设备的作用域占用：构造时打开，析构时关闭
struct Session<'a> {
    dev: &'a dyn BlockDevice,
}

impl<'a> Session<'a> {
    fn open(dev: &'a dyn BlockDevice, block_id: usize) -> Result<Self> {
        if block_id >= BLOCK_COUNT {
            log::warn!("block {block_id} out of range");
            return Err(Error::OutOfRange);
        }
        dev.open()?;

        Ok(Self { dev })
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.dev.close();
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;
    use crate::DEVICE_SECTORS;

    #[test]
    fn block_spans_sectors() {
        let disk = RamDisk::new(DEVICE_SECTORS);
        let mut buf = zeroed();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = (i / SECTOR_SIZE) as u8 + 1;
        }
        write(&disk, 2, &buf).unwrap();

        let mut sector = [0u8; SECTOR_SIZE];
        disk.read_block(2 * SECTORS_PER_BLOCK + 7, &mut sector).unwrap();
        assert!(sector.iter().all(|&b| b == 8));

        let mut back = zeroed();
        read(&disk, 2, &mut back).unwrap();
        assert_eq!(buf, back);
    }

    #[test]
    fn out_of_range() {
        let disk = RamDisk::new(DEVICE_SECTORS);
        let mut buf = zeroed();
        assert_eq!(Err(Error::OutOfRange), read(&disk, BLOCK_COUNT, &mut buf));
        assert_eq!(Err(Error::OutOfRange), write(&disk, BLOCK_COUNT, &buf));
    }
}
