//! # 目录块管理层
//!
//! 目录的内容是其直接索引所指目录块的顺序拼接，
//! 每块容纳 [`ENTRIES_PER_BLOCK`] 个定长目录项。
//! 没有删除操作，已用目录项总是连续排列，`size` 即已用目录项所占字节数。

use alloc::boxed::Box;
use alloc::vec::Vec;

use vfs::{Error, Result};

use crate::block;
use crate::layout::{DirEntry, DiskInode, DiskInodeKind};
use crate::{
    BlockFileSystem, CWD_NAME, DIR_ENTRY_SIZE, DataBlock, ENTRIES_PER_BLOCK, N_DIRECT_PTR,
    PARENT_NAME,
};

/// 单个目录数据块
pub struct DirBlock(Box<DataBlock>);

impl DirBlock {
    #[inline]
    pub fn zeroed() -> Self {
        Self(block::zeroed())
    }

    /// 新目录的首块：`.` 指向自身，`..` 指向父目录
    pub fn with_dots(this: u32, parent: u32) -> Result<Self> {
        let mut dir_block = Self::zeroed();
        let dots = [(CWD_NAME, this), (PARENT_NAME, parent)];
        for (slot, (name, inode_id)) in dots.into_iter().enumerate() {
            dir_block.set(slot, &DirEntry::new(name, inode_id, DiskInodeKind::Directory)?);
        }
        Ok(dir_block)
    }

    #[inline]
    pub fn as_block(&self) -> &DataBlock {
        &self.0
    }

    #[inline]
    pub fn as_block_mut(&mut self) -> &mut DataBlock {
        &mut self.0
    }

    /// 按名字精确匹配有效目录项，返回其槽位
    pub fn lookup(&self, name: &str) -> Option<usize> {
        (0..ENTRIES_PER_BLOCK).find(|&slot| {
            let raw = self.raw(slot);
            DirEntry::peek_valid(raw) && DirEntry::peek_name(raw) == name.as_bytes()
        })
    }

    /// 第一个无效(未使用)的槽位
    pub fn free_slot(&self) -> Option<usize> {
        (0..ENTRIES_PER_BLOCK).find(|&slot| !DirEntry::peek_valid(self.raw(slot)))
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Result<DirEntry> {
        DirEntry::decode(self.raw(slot))
    }

    #[inline]
    pub fn set(&mut self, slot: usize, entry: &DirEntry) {
        entry.encode(&mut self.0[slot * DIR_ENTRY_SIZE..(slot + 1) * DIR_ENTRY_SIZE]);
    }

    /// 块内全部有效目录项
    pub fn entries(&self) -> impl Iterator<Item = Result<DirEntry>> + '_ {
        (0..ENTRIES_PER_BLOCK)
            .filter(|&slot| DirEntry::peek_valid(self.raw(slot)))
            .map(|slot| self.get(slot))
    }

    #[inline]
    fn raw(&self, slot: usize) -> &[u8] {
        &self.0[slot * DIR_ENTRY_SIZE..(slot + 1) * DIR_ENTRY_SIZE]
    }
}

impl BlockFileSystem {
    /// 在目录 `parent` 下创建空文件，返回新 inode 的ID
    #[inline]
    pub fn touch(&mut self, parent: u32, name: &str) -> Result<u32> {
        self.create_entry(parent, name, DiskInodeKind::File)
    }

    /// 在目录 `parent` 下创建只含 `.` 与 `..` 的目录，返回新 inode 的ID
    #[inline]
    pub fn mkdir(&mut self, parent: u32, name: &str) -> Result<u32> {
        self.create_entry(parent, name, DiskInodeKind::Directory)
    }

    /// 列出目录下的全部有效目录项，顺序与盘上一致
    pub fn read_dir(&self, inode_id: u32) -> Result<Vec<vfs::DirEntry>> {
        let dir = self.read_inode(inode_id)?;
        if !dir.is_dir() {
            return Err(Error::NotADirectory);
        }

        let mut entries = Vec::with_capacity(dir.size as usize / DIR_ENTRY_SIZE);
        let mut dir_block = DirBlock::zeroed();
        for &block_id in &dir.direct[..dir.dir_blocks()] {
            self.read_data(block_id, dir_block.as_block_mut())?;
            for entry in dir_block.entries() {
                let entry = entry?;
                entries.push(vfs::DirEntry {
                    inode: entry.index() as u64,
                    ty: entry.kind().into(),
                    name: entry.name(),
                });
            }
        }

        Ok(entries)
    }

    /// 在目录 `dir` 的各目录块中按名字查找，返回目标 inode 的ID
    pub(crate) fn find(&self, dir: &DiskInode, name: &str) -> Result<Option<u32>> {
        let mut dir_block = DirBlock::zeroed();
        for &block_id in &dir.direct[..dir.dir_blocks()] {
            self.read_data(block_id, dir_block.as_block_mut())?;
            if let Some(slot) = dir_block.lookup(name) {
                return dir_block.get(slot).map(|entry| Some(entry.index()));
            }
        }

        Ok(None)
    }

    /// 创建目录项及其 inode。
    ///
    /// 已有目录块中有空槽位时，分配一个数据块与一个 inode，
    /// 依次写出：新数据块、超级块、新 inode、目录块、父目录 inode。
    ///
    /// 没有空槽位但直接索引未用尽时，再多分配一个目录块，
    /// 依次写出：新数据块、新目录块、超级块、新 inode、父目录 inode。
    ///
    /// 任一写入失败即返回，之前的写入不会回滚。
    fn create_entry(&mut self, parent_id: u32, name: &str, kind: DiskInodeKind) -> Result<u32> {
        if name == CWD_NAME || name == PARENT_NAME {
            log::warn!("refused to create {name:?}");
            return Err(Error::InvalidName);
        }
        DirEntry::check_name(name)?;

        let mut parent = self.read_inode(parent_id)?;
        if !parent.is_dir() {
            return Err(Error::NotADirectory);
        }

        // 确认没有已创建的同名项
        if self.find(&parent, name)?.is_some() {
            log::warn!("{name:?} already exists in inode {parent_id}");
            return Err(Error::AlreadyExists);
        }

        // 在已有目录块中寻找空槽位
        let used_blocks = parent.dir_blocks();
        let mut dir_block = DirBlock::zeroed();
        let mut found = None;
        for (pos, &block_id) in parent.direct[..used_blocks].iter().enumerate() {
            self.read_data(block_id, dir_block.as_block_mut())?;
            if let Some(slot) = dir_block.free_slot() {
                found = Some((pos, slot));
                break;
            }
        }

        let (pos, slot, grow) = match found {
            Some((pos, slot)) => (pos, slot, false),
            None if used_blocks < N_DIRECT_PTR => (used_blocks, 0, true),
            None => {
                log::warn!("directory inode {parent_id} is full");
                return Err(Error::CapacityExceeded);
            }
        };

        let mut sb = self.read_super_block()?;
        let dir_block_id = if grow {
            sb.alloc_block()?
        } else {
            parent.direct[pos]
        };
        let data_block_id = sb.alloc_block()?;
        let inode_id = sb.alloc_inode()?;
        if kind == DiskInodeKind::Directory {
            sb.dir_inode_count += 1;
        }

        if grow {
            dir_block = DirBlock::zeroed();
            parent.direct[pos] = dir_block_id;
        }
        dir_block.set(slot, &DirEntry::new(name, inode_id, kind)?);
        parent.size += DIR_ENTRY_SIZE as u32;

        let (inode, first_block) = match kind {
            DiskInodeKind::File => (DiskInode::new_file(data_block_id), DirBlock::zeroed()),
            DiskInodeKind::Directory => (
                DiskInode::new_dir(data_block_id),
                DirBlock::with_dots(inode_id, parent_id)?,
            ),
        };

        log::debug!(
            "create {name:?} as inode {inode_id} in inode {parent_id} (dir block {dir_block_id}, new: {grow})"
        );
        self.write_data(data_block_id, first_block.as_block())?;
        if grow {
            self.write_data(dir_block_id, dir_block.as_block())?;
        }
        self.write_super_block(&sb)?;
        self.write_inode(inode_id, &inode)?;
        if !grow {
            self.write_data(dir_block_id, dir_block.as_block())?;
        }
        self.write_inode(parent_id, &parent)?;

        Ok(inode_id)
    }
}
