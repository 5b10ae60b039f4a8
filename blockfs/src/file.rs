//! # 文件数据层
//!
//! 按字节读写文件内容，直接操作 inode 与数据块位图，不经过目录层。

use alloc::vec::Vec;

use vfs::{Error, Result, Stat};

use crate::block;
use crate::layout::DiskInode;
use crate::{BLOCK_SIZE, BlockFileSystem, MAX_FILE_SIZE};

impl BlockFileSystem {
    pub fn read_byte(&self, inode_id: u32, position: usize) -> Result<u8> {
        let inode = self.read_file_inode(inode_id)?;
        if position >= inode.size as usize {
            return Err(Error::OutOfRange);
        }

        let mut buf = block::zeroed();
        self.read_data(inode.direct[position / BLOCK_SIZE], &mut buf)?;
        Ok(buf[position % BLOCK_SIZE])
    }

    /// 在文件末尾追加一个字节。
    ///
    /// 末尾恰好落在块边界时分配新块，依次写出新数据块、超级块、inode；
    /// 否则改写末尾所在的块后写出 inode。
    pub fn append_byte(&mut self, inode_id: u32, byte: u8) -> Result<()> {
        let mut inode = self.read_file_inode(inode_id)?;
        let size = inode.size as usize;
        if size >= MAX_FILE_SIZE {
            log::warn!("inode {inode_id} reached the maximum file size");
            return Err(Error::CapacityExceeded);
        }

        let (index, offset) = (size / BLOCK_SIZE, size % BLOCK_SIZE);
        let mut buf = block::zeroed();
        if size > 0 && offset == 0 {
            let mut sb = self.read_super_block()?;
            let block_id = sb.alloc_block()?;
            inode.direct[index] = block_id;
            buf[0] = byte;

            self.write_data(block_id, &buf)?;
            self.write_super_block(&sb)?;
        } else {
            // 空文件写入创建时就已分配的首块
            let block_id = inode.direct[index];
            self.read_data(block_id, &mut buf)?;
            buf[offset] = byte;
            self.write_data(block_id, &buf)?;
        }

        inode.size += 1;
        self.write_inode(inode_id, &inode)
    }

    /// 在任意位置写一个字节。
    ///
    /// 位置在文件之内时原地改写；否则先以0补齐空洞，再追加该字节。
    pub fn write_byte(&mut self, inode_id: u32, position: usize, byte: u8) -> Result<()> {
        if position >= MAX_FILE_SIZE {
            return Err(Error::OutOfRange);
        }
        let inode = self.read_file_inode(inode_id)?;
        let size = inode.size as usize;

        if position < size {
            let block_id = inode.direct[position / BLOCK_SIZE];
            let mut buf = block::zeroed();
            self.read_data(block_id, &mut buf)?;
            buf[position % BLOCK_SIZE] = byte;
            return self.write_data(block_id, &buf);
        }

        if position > size {
            log::debug!("fill inode {inode_id} with {} zeros", position - size);
        }
        for _ in size..position {
            self.append_byte(inode_id, 0)?;
        }
        self.append_byte(inode_id, byte)
    }

    /// 把 `src` 的内容逐块复制到 `dst`，并令两者大小相同。
    ///
    /// `dst` 已拥有的块原地覆盖，不足的部分新分配；
    /// `dst` 原先多出的块不会释放，仍留在位图中。
    pub fn clone_file(&mut self, src: u32, dst: u32) -> Result<()> {
        let src_inode = self.read_file_inode(src)?;
        let mut dst_inode = self.read_file_inode(dst)?;
        let owned = dst_inode.data_blocks();

        let mut sb = self.read_super_block()?;
        let mut buf = block::zeroed();
        for i in 0..src_inode.data_blocks() {
            self.read_data(src_inode.direct[i], &mut buf)?;
            if i >= owned {
                dst_inode.direct[i] = sb.alloc_block()?;
            }
            self.write_data(dst_inode.direct[i], &buf)?;
        }
        self.write_super_block(&sb)?;

        dst_inode.size = src_inode.size;
        log::debug!("cloned inode {src} into inode {dst}, {} bytes", dst_inode.size);
        self.write_inode(dst, &dst_inode)
    }

    pub fn stat(&self, inode_id: u32) -> Result<Stat> {
        let inode = self.read_inode(inode_id)?;

        Ok(Stat {
            mode: inode.kind.into(),
            blocks: inode.data_blocks() as u64,
            size: inode.size as u64,
            links: inode.links as u32,
            pointers: inode.direct.to_vec(),
        })
    }

    /// 读出整个文件
    pub fn read_to_vec(&self, inode_id: u32) -> Result<Vec<u8>> {
        let inode = self.read_file_inode(inode_id)?;
        let size = inode.size as usize;

        let mut content = Vec::with_capacity(size);
        let mut buf = block::zeroed();
        for &block_id in &inode.direct[..size.div_ceil(BLOCK_SIZE)] {
            self.read_data(block_id, &mut buf)?;
            let len = (size - content.len()).min(BLOCK_SIZE);
            content.extend_from_slice(&buf[..len]);
        }

        Ok(content)
    }

    /// 自 `offset` 起逐字节写入，超出最大文件大小的部分被截断。
    ///
    /// 返回实际写入的字节数。
    pub fn write_from(&mut self, inode_id: u32, offset: usize, bytes: &[u8]) -> Result<usize> {
        if offset >= MAX_FILE_SIZE {
            return Err(Error::OutOfRange);
        }
        let len = bytes.len().min(MAX_FILE_SIZE - offset);
        for (i, &byte) in bytes[..len].iter().enumerate() {
            self.write_byte(inode_id, offset + i, byte)?;
        }
        if len < bytes.len() {
            log::warn!("truncated {} bytes at the maximum file size", bytes.len() - len);
        }

        Ok(len)
    }

    fn read_file_inode(&self, inode_id: u32) -> Result<DiskInode> {
        let inode = self.read_inode(inode_id)?;
        if inode.is_dir() {
            return Err(Error::IsADirectory);
        }
        Ok(inode)
    }
}
