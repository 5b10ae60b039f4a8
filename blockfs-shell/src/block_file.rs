use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use block_dev::{BlockDevice, DeviceError, SECTOR_SIZE};
use send_wrapper::SendWrapper;

/// 以镜像文件充当块设备。
///
/// 文件只在 [`BlockDevice::open`] 与 [`BlockDevice::close`] 之间保持打开，
/// 每次块传输都会重新打开。
#[derive(Debug)]
pub struct BlockFile {
    path: PathBuf,
    inner: SendWrapper<RefCell<Option<File>>>,
}

impl BlockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: SendWrapper::new(RefCell::new(None)),
        }
    }

    /// 创建长度为 `len` 字节的全零镜像
    pub fn create(path: impl AsRef<Path>, len: u64) -> io::Result<()> {
        let fd = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fd.set_len(len)
    }

    fn with_file<T>(
        &self,
        block_id: usize,
        f: impl FnOnce(&mut File) -> io::Result<T>,
    ) -> Result<T, DeviceError> {
        let mut inner = self.inner.borrow_mut();
        let Some(file) = inner.as_mut() else {
            log::error!("sector {block_id}: {} is not open", self.path.display());
            return Err(DeviceError::Unavailable);
        };

        file.seek(SeekFrom::Start((block_id * SECTOR_SIZE) as u64))
            .and_then(|_| f(file))
            .map_err(|err| {
                log::error!("sector {block_id}: {err}");
                DeviceError::Io(block_id)
            })
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.with_file(block_id, |file| file.read_exact(buf))
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        self.with_file(block_id, |file| file.write_all(buf))
    }

    fn open(&self) -> Result<(), DeviceError> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|err| {
                log::error!("open {}: {err}", self.path.display());
                DeviceError::Unavailable
            })?;
        *self.inner.borrow_mut() = Some(fd);

        Ok(())
    }

    fn close(&self) {
        self.inner.borrow_mut().take();
    }
}
