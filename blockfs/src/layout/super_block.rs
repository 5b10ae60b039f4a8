use vfs::{Error, Result};

use super::Bitmap;
use super::bitmap::MAP_BYTES;
use crate::{DATA_BLOCKS, DataBlock, INODE_COUNT, MAGIC};

/// 超级块，位于 0 号块：
/// - 提供文件系统合法性校验；
/// - 记录空闲计数与目录计数；
/// - 携带数据块位图与 inode 位图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: i32,
    pub free_block_count: i32,
    pub free_inode_count: i32,
    pub dir_inode_count: i32,
    /// 数据块位图，位号即数据区内的相对块号
    pub block_map: Bitmap,
    pub inode_map: Bitmap,
}

impl SuperBlock {
    /// 盘上占用字节数，块内其余部分恒为0
    pub const SIZE: usize = 16 + 2 * MAP_BYTES;

    /// 尚未分配任何块与 inode 的超级块
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            free_block_count: DATA_BLOCKS as i32,
            free_inode_count: INODE_COUNT as i32,
            dir_inode_count: 0,
            block_map: Bitmap::empty(),
            inode_map: Bitmap::empty(),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 首次适配分配数据块，返回数据区内的相对块号
    pub fn alloc_block(&mut self) -> Result<u32> {
        let Some(bit) = self.block_map.lookup(DATA_BLOCKS) else {
            log::warn!("data bitmap exhausted");
            return Err(Error::OutOfSpace);
        };
        self.block_map.set(bit);
        self.free_block_count -= 1;
        log::debug!("alloc data block {bit}, {} left", self.free_block_count);

        Ok(bit as u32)
    }

    /// 首次适配分配 inode，返回其ID
    pub fn alloc_inode(&mut self) -> Result<u32> {
        let Some(bit) = self.inode_map.lookup(INODE_COUNT) else {
            log::warn!("inode bitmap exhausted");
            return Err(Error::OutOfInodes);
        };
        self.inode_map.set(bit);
        self.free_inode_count -= 1;
        log::debug!("alloc inode {bit}, {} left", self.free_inode_count);

        Ok(bit as u32)
    }

    pub fn decode(block: &DataBlock) -> Self {
        let word = |at: usize| {
            let mut bytes = [0; 4];
            bytes.copy_from_slice(&block[at..at + 4]);
            i32::from_le_bytes(bytes)
        };
        let map = |at: usize| {
            let mut bytes = [0; MAP_BYTES];
            bytes.copy_from_slice(&block[at..at + MAP_BYTES]);
            Bitmap::from_bytes(bytes)
        };

        Self {
            magic: word(0),
            free_block_count: word(4),
            free_inode_count: word(8),
            dir_inode_count: word(12),
            block_map: map(16),
            inode_map: map(16 + MAP_BYTES),
        }
    }

    /// 整块写出：超级块之后的字节清零
    pub fn encode(&self, block: &mut DataBlock) {
        block.fill(0);
        block[0..4].copy_from_slice(&self.magic.to_le_bytes());
        block[4..8].copy_from_slice(&self.free_block_count.to_le_bytes());
        block[8..12].copy_from_slice(&self.free_inode_count.to_le_bytes());
        block[12..16].copy_from_slice(&self.dir_inode_count.to_le_bytes());
        block[16..16 + MAP_BYTES].copy_from_slice(self.block_map.as_bytes());
        block[16 + MAP_BYTES..Self::SIZE].copy_from_slice(self.inode_map.as_bytes());
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BLOCK_SIZE;

    #[test]
    fn byte_layout() {
        let mut sb = SuperBlock::new();
        sb.alloc_block().unwrap();
        sb.alloc_inode().unwrap();
        sb.dir_inode_count = 1;

        let mut block = [0xEE; BLOCK_SIZE];
        sb.encode(&mut block);
        assert_eq!([0xFF, 0xFF, 0xFF, 0x7F], block[0..4]);
        assert_eq!(1014i32.to_le_bytes(), block[4..8]);
        assert_eq!(1023i32.to_le_bytes(), block[8..12]);
        assert_eq!(1i32.to_le_bytes(), block[12..16]);
        assert_eq!(1, block[16]);
        assert_eq!(1, block[16 + MAP_BYTES]);
        assert!(block[SuperBlock::SIZE..].iter().all(|&b| b == 0));

        assert_eq!(sb, SuperBlock::decode(&block));
    }

    #[test]
    fn exhausted_maps() {
        let mut sb = SuperBlock::new();
        for _ in 0..DATA_BLOCKS {
            sb.alloc_block().unwrap();
        }
        assert_eq!(0, sb.free_block_count);
        assert_eq!(Err(Error::OutOfSpace), sb.alloc_block());

        for _ in 0..INODE_COUNT {
            sb.alloc_inode().unwrap();
        }
        assert_eq!(Err(Error::OutOfInodes), sb.alloc_inode());
        assert_eq!(0, sb.free_inode_count);
    }
}
