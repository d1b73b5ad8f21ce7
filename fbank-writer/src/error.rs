use fbank_types::FbankError;
use thiserror::Error;

use crate::SessionState;

pub type WriterResult<T> = std::result::Result<T, WriterError>;

#[derive(Debug, Error)]
pub enum WriterError {
    /// Разрядность вне {1, 2, 4, 8, 16, 32, 64}
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u32),

    /// Заголовок описывает пустой или невозможный датасет
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfig(String),

    /// Длина буфера не кратна размеру интеграции
    #[error("Malformed buffer: {len} bytes is not a positive multiple of integration size {integration_size}")]
    MalformedBuffer { len: usize, integration_size: usize },

    /// Заголовок записи не совпадает с заголовком сессии
    #[error("Header mismatch: integration size {found} bytes, session expects {expected}")]
    HeaderMismatch { expected: usize, found: usize },

    /// Ошибка хранилища
    #[error("Storage error: {0}")]
    Storage(#[from] FbankError),

    /// Операция недопустима в текущем состоянии сессии
    #[error("Cannot {op} while session is {state}")]
    InvalidState { op: &'static str, state: SessionState },
}

impl WriterError {
    /// Ошибка хранилища без разбора на частные случаи.
    pub fn is_storage(&self) -> bool {
        matches!(self, WriterError::Storage(_))
    }
}

impl From<std::io::Error> for WriterError {
    fn from(e: std::io::Error) -> Self {
        WriterError::Storage(FbankError::Io(e))
    }
}
