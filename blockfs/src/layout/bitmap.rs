/// 位图占用字节数，两张位图大小相同
pub const MAP_BYTES: usize = 128;

/// 位图，记录其指示区域的分配情况：置位表示已占用。
///
/// 第 `n` 位位于第 `n / 8` 字节，掩码为 `1 << (n % 8)`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap([u8; MAP_BYTES]);

impl Bitmap {
    /// 位图可记录的总位数
    pub const BITS: usize = MAP_BYTES * 8;

    #[inline]
    pub const fn empty() -> Self {
        Self([0; MAP_BYTES])
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; MAP_BYTES]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; MAP_BYTES] {
        &self.0
    }

    #[inline]
    pub fn set(&mut self, bit: usize) {
        self.0[bit / 8] |= 1 << (bit % 8);
    }

    #[inline]
    pub fn reset(&mut self, bit: usize) {
        self.0[bit / 8] &= !(1 << (bit % 8));
    }

    #[inline]
    pub fn test(&self, bit: usize) -> bool {
        (self.0[bit / 8] >> (bit % 8)) & 1 == 1
    }

    /// 自 0 号位起首次适配，返回第一个未置位的位号。
    /// 位号须小于 `limit`，否则视为位图已满。
    pub fn lookup(&self, limit: usize) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .find_map(|(index, &bits)| {
                (bits != u8::MAX).then_some(index * 8 + bits.trailing_ones() as usize)
            })
            .filter(|&bit| bit < limit)
    }

    /// 已置位的总数
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|bits| bits.count_ones() as usize).sum()
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::empty()
    }
}
