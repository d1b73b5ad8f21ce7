//! Выбор формы чанка по заголовку наблюдения.

use fbank_types::FilterbankHeader;

use crate::store::RANK;

/// Целевой размер одного чанка (1 МиБ)
pub const CHUNK_TARGET_BYTES: usize = 1024 * 1024;

/// Планировщик формы чанка `[time, IF, frequency]`.
///
/// Время всегда режется по одной интеграции, IF берётся целиком, а ширина
/// по частоте подбирается так, чтобы чанк был близок к `target_bytes`.
/// Частотная ось делится на равные части, чтобы крайний чанк не вырождался.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlanner {
    target_bytes: usize,
}

impl ChunkPlanner {
    pub fn new(target_bytes: usize) -> Self {
        Self {
            target_bytes: target_bytes.max(1),
        }
    }

    pub fn target_bytes(&self) -> usize {
        self.target_bytes
    }

    /// Форма чанка. Никогда не возвращает 0 и не выходит за размеры датасета.
    pub fn plan(
        &self,
        header: &FilterbankHeader,
    ) -> [u64; RANK] {
        let nifs = header.nifs.max(1) as u64;
        let nchans = header.nchans.max(1) as u64;
        let elem_size = header
            .element_type()
            .map(|e| e.size())
            .unwrap_or_else(|_| (header.nbits as usize / 8).max(1)) as u64;

        let per_channel = nifs * elem_size;
        let width = (self.target_bytes as u64 / per_channel).clamp(1, nchans);
        let parts = nchans.div_ceil(width);

        [1, nifs, nchans.div_ceil(parts)]
    }
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self::new(CHUNK_TARGET_BYTES)
    }
}
