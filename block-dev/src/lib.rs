//! # 块设备接口层
//!
//! 块设备是以**扇区**为单位存储数据的设备，例如磁盘、U盘、磁盘镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过块设备驱动读写块设备。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod ram_disk;

use core::any::Any;

use derive_more::Display;

pub use self::ram_disk::RamDisk;

/// 设备扇区大小，读写均以此为单位
pub const SECTOR_SIZE: usize = 512;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// 设备无法打开
    #[display(fmt = "device unavailable")]
    Unavailable,
    /// 扇区号超出设备容量
    #[display(fmt = "sector {} out of range", _0)]
    OutOfRange(usize),
    /// 扇区读写失败
    #[display(fmt = "I/O failure at sector {}", _0)]
    Io(usize),
}

impl core::error::Error for DeviceError {}

/// 块设备驱动特质
///
/// 每次传输前后由上层调用 [`BlockDevice::open`] 与 [`BlockDevice::close`]，
/// 两者之间不会跨越多次块传输。
pub trait BlockDevice: Send + Sync + Any {
    /// 读出扇区，`buf` 长度恒为 [`SECTOR_SIZE`]
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    /// 写入扇区，`buf` 长度恒为 [`SECTOR_SIZE`]
    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;

    fn open(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn close(&self) {}
}
