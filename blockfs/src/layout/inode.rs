//! 索引节点：只有直接索引，文件大小受 [`N_DIRECT_PTR`] 个数据块限制。
//!
//! 盘上32字节：
//! - 一个 `u32` 打包 `size`(0..22 位)、`type`(22..24 位)、`link`(24..32 位)；
//! - 其后为 [`N_DIRECT_PTR`] 个 `u32` 直接索引，存放数据区内的相对块号。

use vfs::{Error, Result};

use crate::{BLOCK_SIZE, DIR_ENTRY_SIZE, INODE_SIZE, MAX_FILE_SIZE, N_DIRECT_PTR};

const SIZE_BITS: u32 = 22;
const KIND_SHIFT: u32 = 22;
const LINK_SHIFT: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInode {
    /// 字节数，不超过 [`DiskInode::MAX_SIZE`]
    pub size: u32,
    pub kind: DiskInodeKind,
    /// 硬链接个数
    pub links: u8,
    /// 直接索引块
    pub direct: [u32; N_DIRECT_PTR],
}

/// 盘上编码：目录为0，文件为1
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum DiskInodeKind {
    Directory = 0,
    #[default]
    File = 1,
}

impl TryFrom<u8> for DiskInodeKind {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::Directory),
            1 => Ok(Self::File),
            _ => Err(Error::Corrupted),
        }
    }
}

impl From<DiskInodeKind> for vfs::DirEntryType {
    #[inline]
    fn from(kind: DiskInodeKind) -> Self {
        match kind {
            DiskInodeKind::Directory => Self::Directory,
            DiskInodeKind::File => Self::Regular,
        }
    }
}

impl DiskInode {
    /// `size` 位域能表示的最大值
    pub const MAX_SIZE: u32 = (1 << SIZE_BITS) - 1;

    /// 空文件，首个数据块在创建时就已分配
    #[inline]
    pub fn new_file(first_block: u32) -> Self {
        Self::with_first_block(0, DiskInodeKind::File, first_block)
    }

    /// 只含 `.` 与 `..` 的目录
    #[inline]
    pub fn new_dir(first_block: u32) -> Self {
        Self::with_first_block(2 * DIR_ENTRY_SIZE as u32, DiskInodeKind::Directory, first_block)
    }

    fn with_first_block(size: u32, kind: DiskInodeKind, first_block: u32) -> Self {
        let mut direct = [0; N_DIRECT_PTR];
        direct[0] = first_block;
        Self {
            size,
            kind,
            links: 1,
            direct,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == DiskInodeKind::Directory
    }

    /// 目录当前用到的目录块个数
    #[inline]
    pub fn dir_blocks(&self) -> usize {
        (self.size as usize).div_ceil(BLOCK_SIZE)
    }

    /// 文件拥有的数据块个数，空文件也占有一块
    #[inline]
    pub fn data_blocks(&self) -> usize {
        (self.size as usize).div_ceil(BLOCK_SIZE).max(1)
    }

    /// 大小超过 [`MAX_FILE_SIZE`] 的记录视为损坏
    pub fn decode(raw: &[u8]) -> Result<Self> {
        debug_assert_eq!(INODE_SIZE, raw.len());
        let word = |at: usize| {
            let mut bytes = [0; 4];
            bytes.copy_from_slice(&raw[at..at + 4]);
            u32::from_le_bytes(bytes)
        };

        let packed = word(0);
        let mut direct = [0; N_DIRECT_PTR];
        for (i, ptr) in direct.iter_mut().enumerate() {
            *ptr = word(4 + 4 * i);
        }

        let size = packed & Self::MAX_SIZE;
        if size as usize > MAX_FILE_SIZE {
            log::warn!("inode size {size} exceeds the direct blocks");
            return Err(Error::Corrupted);
        }

        Ok(Self {
            size,
            kind: DiskInodeKind::try_from(((packed >> KIND_SHIFT) & 0b11) as u8)?,
            links: (packed >> LINK_SHIFT) as u8,
            direct,
        })
    }

    /// 越出位域的 `size` 拒绝写出
    pub fn encode(&self, raw: &mut [u8]) -> Result<()> {
        debug_assert_eq!(INODE_SIZE, raw.len());
        if self.size > Self::MAX_SIZE {
            log::warn!("inode size {} overflows its field", self.size);
            return Err(Error::OutOfRange);
        }

        let packed =
            self.size | (self.kind as u32) << KIND_SHIFT | (self.links as u32) << LINK_SHIFT;
        raw[0..4].copy_from_slice(&packed.to_le_bytes());
        for (i, ptr) in self.direct.iter().enumerate() {
            raw[4 + 4 * i..8 + 4 * i].copy_from_slice(&ptr.to_le_bytes());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_word() {
        let mut inode = DiskInode::new_dir(5);
        inode.direct[6] = 0x0102_0304;
        let mut raw = [0u8; INODE_SIZE];
        inode.encode(&mut raw).unwrap();

        // size=256, type=0, link=1
        assert_eq!([0x00, 0x01, 0x00, 0x01], raw[0..4]);
        assert_eq!([5, 0, 0, 0], raw[4..8]);
        assert_eq!([4, 3, 2, 1], raw[28..32]);
        assert_eq!(inode, DiskInode::decode(&raw).unwrap());

        let file = DiskInode::new_file(9);
        file.encode(&mut raw).unwrap();
        // type=1 落在第22位
        assert_eq!(0x0140_0000, u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]));
    }

    #[test]
    fn size_field_bound() {
        let mut raw = [0u8; INODE_SIZE];
        let mut inode = DiskInode::new_file(0);
        inode.size = MAX_FILE_SIZE as u32;
        inode.encode(&mut raw).unwrap();
        assert_eq!(MAX_FILE_SIZE as u32, DiskInode::decode(&raw).unwrap().size);

        // 位域放得下，但超出直接索引能覆盖的范围
        inode.size += 1;
        inode.encode(&mut raw).unwrap();
        assert_eq!(Err(Error::Corrupted), DiskInode::decode(&raw));

        inode.size = DiskInode::MAX_SIZE;
        inode.encode(&mut raw).unwrap();
        assert_eq!(Err(Error::Corrupted), DiskInode::decode(&raw));

        inode.size += 1;
        assert_eq!(Err(Error::OutOfRange), inode.encode(&mut raw));
    }

    #[test]
    fn unknown_kind() {
        let mut raw = [0u8; INODE_SIZE];
        raw[2] = 0b1000_0000; // type=2
        assert_eq!(Err(Error::Corrupted), DiskInode::decode(&raw));
    }
}
