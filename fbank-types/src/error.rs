use thiserror::Error;

/// Результат для операций контейнера fbank
pub type FbankResult<T> = std::result::Result<T, FbankError>;

/// Ошибки раскладки датасета и хранилища fbank.
#[derive(Debug, Error)]
pub enum FbankError {
    /// Разрядность, для которой нет типа элемента
    #[error("Unsupported bit depth: {0} (expected one of 1, 2, 4, 8, 16, 32, 64)")]
    UnsupportedBitDepth(u32),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Отказ движка хранения (HDF5)
    #[error("Storage engine error: {0}")]
    Storage(String),

    /// Нарушение раскладки датасета или неверный вызов хранилища
    #[error("Format violation: {0}")]
    FormatViolation(String),
}

impl FbankError {
    /// Удобные конструкторы
    pub fn storage<S: Into<String>>(s: S) -> Self {
        Self::Storage(s.into())
    }

    pub fn format_violation<S: Into<String>>(s: S) -> Self {
        Self::FormatViolation(s.into())
    }
}
