//! # 磁盘块管理器层
//!
//! 按固定布局使用磁盘：超级块、inode 表与数据区。
//! 没有块缓存，每次访问都完整地经过块转换层。

use alloc::sync::Arc;

use block_dev::BlockDevice;
use vfs::{Error, Result};

use crate::block;
use crate::dir::DirBlock;
use crate::layout::{DiskInode, SuperBlock};
use crate::{DATA_BEGIN, DataBlock, INODE_COUNT, INODE_SIZE, INODES_PER_BLOCK, ROOT_INODE};

pub struct BlockFileSystem {
    block_device: Arc<dyn BlockDevice>,
}

impl BlockFileSystem {
    /// 接管设备，不做任何校验
    #[inline]
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self { block_device }
    }

    /// 接管已格式化的设备
    pub fn open(block_device: Arc<dyn BlockDevice>) -> Result<Self> {
        let fs = Self::new(block_device);
        if !fs.exists()? {
            return Err(Error::NoFileSystem);
        }
        Ok(fs)
    }

    /// 0 号块的魔数是否吻合
    pub fn exists(&self) -> Result<bool> {
        Ok(self.read_super_block()?.is_valid())
    }

    /// 重建超级块与根目录。
    ///
    /// 依次写出根目录块、超级块、根 inode 所在的 inode 表块，
    /// 中途失败不会回滚。
    pub fn format(&mut self) -> Result<()> {
        let mut sb = SuperBlock::new();
        let root_block = sb.alloc_block()?;
        let root_id = sb.alloc_inode()?;
        debug_assert_eq!(ROOT_INODE, root_id);
        sb.dir_inode_count += 1;

        let root_dir = DirBlock::with_dots(ROOT_INODE, ROOT_INODE)?;
        self.write_data(root_block, root_dir.as_block())?;
        self.write_super_block(&sb)?;

        // 根 inode 所在块的其余槽位一并清零
        let mut inode_block = block::zeroed();
        DiskInode::new_dir(root_block).encode(&mut inode_block[..INODE_SIZE])?;
        self.write_block(Self::disk_inode_pos(ROOT_INODE).0, &inode_block)?;

        log::info!("formatted: {} data blocks free", sb.free_block_count);
        Ok(())
    }

    pub fn read_super_block(&self) -> Result<SuperBlock> {
        let mut buf = block::zeroed();
        self.read_block(0, &mut buf)?;
        Ok(SuperBlock::decode(&buf))
    }

    pub(crate) fn write_super_block(&self, sb: &SuperBlock) -> Result<()> {
        let mut buf = block::zeroed();
        sb.encode(&mut buf);
        self.write_block(0, &buf)
    }

    /// 通过ID获取 inode 在磁盘上的位置：**块ID**以及**块内偏移**
    #[inline]
    pub fn disk_inode_pos(inode_id: u32) -> (usize, usize) {
        let inode_id = inode_id as usize;
        let block_id = 1 + inode_id / INODES_PER_BLOCK;
        let block_offset = inode_id % INODES_PER_BLOCK * INODE_SIZE;

        (block_id, block_offset)
    }

    pub fn read_inode(&self, inode_id: u32) -> Result<DiskInode> {
        Self::check_inode(inode_id)?;
        let (block_id, offset) = Self::disk_inode_pos(inode_id);
        let mut buf = block::zeroed();
        self.read_block(block_id, &mut buf)?;

        DiskInode::decode(&buf[offset..offset + INODE_SIZE])
    }

    /// 整块读出、改写其中一个槽位、再整块写回
    pub(crate) fn write_inode(&self, inode_id: u32, inode: &DiskInode) -> Result<()> {
        Self::check_inode(inode_id)?;
        let (block_id, offset) = Self::disk_inode_pos(inode_id);
        let mut buf = block::zeroed();
        self.read_block(block_id, &mut buf)?;
        inode.encode(&mut buf[offset..offset + INODE_SIZE])?;
        self.write_block(block_id, &buf)
    }

    /// 读数据区的块，`index` 为相对块号
    #[inline]
    pub(crate) fn read_data(&self, index: u32, buf: &mut DataBlock) -> Result<()> {
        self.read_block(DATA_BEGIN + index as usize, buf)
    }

    #[inline]
    pub(crate) fn write_data(&self, index: u32, buf: &DataBlock) -> Result<()> {
        self.write_block(DATA_BEGIN + index as usize, buf)
    }

    #[inline]
    fn read_block(&self, block_id: usize, buf: &mut DataBlock) -> Result<()> {
        block::read(&*self.block_device, block_id, buf)
    }

    #[inline]
    fn write_block(&self, block_id: usize, buf: &DataBlock) -> Result<()> {
        block::write(&*self.block_device, block_id, buf)
    }

    #[inline]
    fn check_inode(inode_id: u32) -> Result<()> {
        if inode_id as usize >= INODE_COUNT {
            return Err(Error::OutOfRange);
        }
        Ok(())
    }
}

impl core::fmt::Debug for BlockFileSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockFileSystem").finish_non_exhaustive()
    }
}
