use block_dev::DeviceError;
use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "device error: {}", _0)]
    Device(DeviceError),
    /// 数据块位图已满
    #[display(fmt = "no free data block")]
    OutOfSpace,
    /// inode 位图已满
    #[display(fmt = "no free inode")]
    OutOfInodes,
    #[display(fmt = "name already exists")]
    AlreadyExists,
    #[display(fmt = "no such file or directory")]
    NotFound,
    #[display(fmt = "is a directory")]
    IsADirectory,
    #[display(fmt = "not a directory")]
    NotADirectory,
    /// 目录或文件已达到结构上限
    #[display(fmt = "capacity exceeded")]
    CapacityExceeded,
    /// 块号或字节位置非法
    #[display(fmt = "index out of range")]
    OutOfRange,
    #[display(fmt = "invalid name")]
    InvalidName,
    #[display(fmt = "path must be absolute")]
    InvalidPath,
    #[display(fmt = "no file system on device")]
    NoFileSystem,
    /// 盘上记录无法解码
    #[display(fmt = "corrupted on-disk record")]
    Corrupted,
}

impl Error {
    /// 文件与目录的误用
    #[inline]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::IsADirectory | Self::NotADirectory)
    }
}

impl From<DeviceError> for Error {
    #[inline]
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
