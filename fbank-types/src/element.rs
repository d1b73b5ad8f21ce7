use serde::{Deserialize, Serialize};

use crate::{FbankError, FbankResult};

/// Допустимые значения `nbits`.
pub const SUPPORTED_BIT_DEPTHS: [u32; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Тип элемента матрицы спектров
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Беззнаковое 8-бит (также для 1/2/4-битных отсчётов, по одному на байт)
    U8,
    /// Беззнаковое 16-бит
    U16,
    /// 32-битное число с плавающей точкой
    F32,
    /// 64-битное число с плавающей точкой
    F64,
}

impl ElementType {
    /// Тип элемента по разрядности заголовка.
    ///
    /// Отсчёты уже байта (1, 2, 4 бит) хранятся распакованными, по одному
    /// в `U8`, поэтому размер элемента для них равен 1.
    pub fn from_nbits(nbits: u32) -> FbankResult<Self> {
        match nbits {
            1 | 2 | 4 | 8 => Ok(ElementType::U8),
            16 => Ok(ElementType::U16),
            32 => Ok(ElementType::F32),
            64 => Ok(ElementType::F64),
            _ => Err(FbankError::UnsupportedBitDepth(nbits)),
        }
    }

    /// Размер одного элемента в байтах
    pub fn size(&self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ElementType::U8 => write!(f, "u8"),
            ElementType::U16 => write!(f, "u16"),
            ElementType::F32 => write!(f, "f32"),
            ElementType::F64 => write!(f, "f64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_size_per_depth() {
        for nbits in SUPPORTED_BIT_DEPTHS {
            let elem = ElementType::from_nbits(nbits).unwrap();
            assert_eq!(elem.size(), (nbits as usize / 8).max(1), "nbits={nbits}");
        }
    }

    #[test]
    fn test_float_only_for_32_and_64() {
        assert!(ElementType::from_nbits(32).unwrap().is_float());
        assert!(ElementType::from_nbits(64).unwrap().is_float());
        assert!(!ElementType::from_nbits(16).unwrap().is_float());
        assert!(!ElementType::from_nbits(1).unwrap().is_float());
    }

    #[test]
    fn test_unsupported_depths() {
        for nbits in [0, 3, 12, 24, 128] {
            let err = ElementType::from_nbits(nbits).unwrap_err();
            assert!(matches!(err, FbankError::UnsupportedBitDepth(n) if n == nbits));
        }
    }
}
