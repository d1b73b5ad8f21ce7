//! Фильтры чанков датасета: bitshuffle (32008, с LZ4 внутри) и чистый
//! LZ4 (32004).
//!
//! Сами фильтры живут в плагинах HDF5. Здесь только их идентификаторы и
//! параметры; плагин bitshuffle сам дописывает версию и размер элемента.

use fbank_types::FilterPolicy;

/// Идентификатор фильтра LZ4
pub const FILTER_ID_LZ4: u32 = 32004;

/// Идентификатор фильтра Bitshuffle
pub const FILTER_ID_BITSHUFFLE: u32 = 32008;

/// Параметр bitshuffle: размер блока выбирается плагином
pub const BSHUF_BLOCK_AUTO: u32 = 0;

/// Параметр bitshuffle: без сжатия внутри
pub const BSHUF_COMPRESS_NONE: u32 = 0;

/// Параметр bitshuffle: LZ4 внутри
pub const BSHUF_COMPRESS_LZ4: u32 = 2;

/// Один фильтр конвейера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Транспонирование битов, затем (опционально) LZ4
    Bitshuffle { lz4: bool },
    /// LZ4 без предобработки
    Lz4,
}

/// Упорядоченный набор фильтров, применяемый к каждому чанку.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPipeline {
    filters: Vec<Filter>,
}

impl Filter {
    /// Идентификатор фильтра в реестре HDF5.
    pub fn id(&self) -> u32 {
        match self {
            Filter::Bitshuffle { .. } => FILTER_ID_BITSHUFFLE,
            Filter::Lz4 => FILTER_ID_LZ4,
        }
    }

    /// Параметры фильтра (`cd_values`).
    pub fn params(&self) -> Vec<u32> {
        match *self {
            Filter::Bitshuffle { lz4 } => vec![
                BSHUF_BLOCK_AUTO,
                if lz4 {
                    BSHUF_COMPRESS_LZ4
                } else {
                    BSHUF_COMPRESS_NONE
                },
            ],
            Filter::Lz4 => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::Bitshuffle { .. } => "bitshuffle",
            Filter::Lz4 => "lz4",
        }
    }
}

impl FilterPipeline {
    /// Конвейер для политики. `Auto` должна быть разрешена заранее
    /// (см. [`FilterPolicy::resolve`]); нерешённая трактуется как bitshuffle.
    pub fn from_policy(policy: FilterPolicy) -> Self {
        let filters = match policy {
            FilterPolicy::None => Vec::new(),
            FilterPolicy::Lz4 => vec![Filter::Lz4],
            FilterPolicy::BitshuffleLz4 | FilterPolicy::Auto => {
                vec![Filter::Bitshuffle { lz4: true }]
            }
        };

        Self { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Display for FilterPipeline {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        if self.filters.is_empty() {
            return write!(f, "none");
        }

        let names: Vec<_> = self.filters.iter().map(|flt| flt.name()).collect();
        write!(f, "{}", names.join("+"))
    }
}
