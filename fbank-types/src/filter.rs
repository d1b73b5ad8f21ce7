use crate::{FbankError, FbankResult};

/// Политика сжатия чанков, выбираемая при открытии сессии.
///
/// Никогда не выводится из заголовка: выбор всегда явный.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Без фильтров
    None,
    /// Только LZ4
    Lz4,
    /// Bitshuffle с LZ4 внутри (фильтр 32008)
    #[default]
    BitshuffleLz4,
    /// Bitshuffle+LZ4, если ожидаемый объём данных не меньше одного чанка
    Auto,
}

impl FilterPolicy {
    /// Разрешает `Auto` в конкретную политику.
    ///
    /// `expected_bytes` - оценка полного объёма данных (подсказка числа
    /// интеграций × размер интеграции), `chunk_bytes` - размер одного чанка.
    pub fn resolve(
        self,
        expected_bytes: u64,
        chunk_bytes: u64,
    ) -> FilterPolicy {
        match self {
            FilterPolicy::Auto if expected_bytes >= chunk_bytes => FilterPolicy::BitshuffleLz4,
            FilterPolicy::Auto => FilterPolicy::None,
            other => other,
        }
    }
}

impl std::fmt::Display for FilterPolicy {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            FilterPolicy::None => write!(f, "none"),
            FilterPolicy::Lz4 => write!(f, "lz4"),
            FilterPolicy::BitshuffleLz4 => write!(f, "bitshuffle"),
            FilterPolicy::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for FilterPolicy {
    type Err = FbankError;

    fn from_str(s: &str) -> FbankResult<Self> {
        match s.to_lowercase().as_str() {
            "none" | "no" | "off" => Ok(FilterPolicy::None),
            "lz4" => Ok(FilterPolicy::Lz4),
            "bitshuffle" | "bshuf" | "bitshuffle-lz4" => Ok(FilterPolicy::BitshuffleLz4),
            "auto" => Ok(FilterPolicy::Auto),
            _ => Err(FbankError::format_violation(format!(
                "Unknown filter policy '{s}'. Use: none, lz4, bitshuffle, auto"
            ))),
        }
    }
}
