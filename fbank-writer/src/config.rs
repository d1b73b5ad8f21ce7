use fbank_core::CHUNK_TARGET_BYTES;
use fbank_types::FilterPolicy;

/// Параметры сессии записи, задаются при открытии.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Подробные дампы состояния сессии (уровень debug)
    pub diagnostics: bool,
    /// Политика сжатия чанков
    pub filter_policy: FilterPolicy,
    /// Целевой размер чанка в байтах
    pub chunk_target_bytes: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SessionOptions {
    /// Включает или выключает диагностику.
    pub fn with_diagnostics(
        mut self,
        diagnostics: bool,
    ) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Задаёт политику сжатия.
    pub fn with_filter_policy(
        mut self,
        policy: FilterPolicy,
    ) -> Self {
        self.filter_policy = policy;
        self
    }

    pub fn with_chunk_target(
        mut self,
        bytes: usize,
    ) -> Self {
        self.chunk_target_bytes = bytes;
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для SessionOptions
////////////////////////////////////////////////////////////////////////////////

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            diagnostics: false,
            filter_policy: FilterPolicy::BitshuffleLz4,
            chunk_target_bytes: CHUNK_TARGET_BYTES,
        }
    }
}

/// Парсит размер в байтах.
///
/// Поддерживает суффиксы: `KiB`, `MiB`, `GiB`, `K`, `M`, `G` (регистронезависимо).
///
/// # Примеры
/// ```
/// use fbank_writer::config::parse_size_bytes;
/// assert_eq!(parse_size_bytes("1MiB").unwrap(), 1_048_576);
/// assert_eq!(parse_size_bytes("64k").unwrap(), 65_536);
/// assert_eq!(parse_size_bytes("4096").unwrap(), 4096);
/// ```
pub fn parse_size_bytes(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower
        .strip_suffix("gib")
        .or_else(|| lower.strip_suffix('g'))
    {
        (v.trim(), 1usize << 30)
    } else if let Some(v) = lower
        .strip_suffix("mib")
        .or_else(|| lower.strip_suffix('m'))
    {
        (v.trim(), 1usize << 20)
    } else if let Some(v) = lower
        .strip_suffix("kib")
        .or_else(|| lower.strip_suffix('k'))
    {
        (v.trim(), 1usize << 10)
    } else {
        (lower.as_str(), 1)
    };

    let n: usize = num_str
        .parse()
        .map_err(|e| format!("Invalid size '{s}': {e}"))?;

    n.checked_mul(mult)
        .ok_or_else(|| format!("Size '{s}' overflows"))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
