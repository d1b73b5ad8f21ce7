//! Абстракция хранилища массивов и описание геометрии датасета.

use fbank_types::{AttrValue, ElementType, FbankError, FbankResult};

use crate::filters::FilterPipeline;

/// Ранг датасета: `[time, IF, frequency]`
pub const RANK: usize = 3;

/// Имя единственного датасета контейнера
pub const DATASET_NAME: &str = "data";

/// Атрибут контейнера `CLASS`
pub const FILTERBANK_CLASS: &str = "FILTERBANK";

/// Атрибут контейнера `VERSION`
pub const FILTERBANK_VERSION: &str = "2.0";

/// Текущие и максимальные размеры датасета (`None` = без ограничения).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataspace {
    pub dims: [u64; RANK],
    pub max_dims: [Option<u64>; RANK],
}

/// Прямоугольная область датасета.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperslab {
    pub offset: [u64; RANK],
    pub count: [u64; RANK],
}

/// Всё, что нужно для создания датасета.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetLayout {
    pub name: String,
    pub element: ElementType,
    pub space: Dataspace,
    pub chunk: [u64; RANK],
    pub filters: FilterPipeline,
}

/// Хранилище с одним растущим датасетом.
///
/// Все вызовы синхронные: возврат из метода означает, что операция
/// выполнена и сброшена на носитель (или завершилась ошибкой). Запись
/// в уже записанную область перезаписывает её.
pub trait ArrayStore: Send {
    /// Атрибут верхнего уровня (контейнера).
    fn set_root_attr(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> FbankResult<()>;

    /// Создаёт единственный датасет контейнера.
    fn create_dataset(
        &mut self,
        layout: DatasetLayout,
    ) -> FbankResult<Dataspace>;

    /// Атрибут датасета.
    fn set_dataset_attr(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> FbankResult<()>;

    /// Метка оси `dim`.
    fn label_dimension(
        &mut self,
        dim: usize,
        label: &str,
    ) -> FbankResult<()>;

    /// Увеличивает размеры датасета до `dims`.
    fn extend(
        &mut self,
        dims: [u64; RANK],
    ) -> FbankResult<Dataspace>;

    /// Пишет `data` в область `slab`.
    fn write_slab(
        &mut self,
        slab: &Hyperslab,
        data: &[u8],
    ) -> FbankResult<()>;

    /// Освобождает датасет.
    fn close_dataset(&mut self) -> FbankResult<()>;

    /// Освобождает контейнер (метаданные сбрасываются на диск).
    fn close(&mut self) -> FbankResult<()>;
}

impl Dataspace {
    pub fn new(
        dims: [u64; RANK],
        max_dims: [Option<u64>; RANK],
    ) -> Self {
        Self { dims, max_dims }
    }

    pub fn num_elements(&self) -> u64 {
        self.dims.iter().product()
    }

    /// Новое пространство с размерами `dims`.
    ///
    /// Размеры только растут и не выходят за `max_dims`.
    pub fn extended(
        &self,
        dims: [u64; RANK],
    ) -> FbankResult<Self> {
        for d in 0..RANK {
            if dims[d] < self.dims[d] {
                return Err(FbankError::format_violation(format!(
                    "cannot shrink dimension {d} from {} to {}",
                    self.dims[d], dims[d]
                )));
            }
            if let Some(max) = self.max_dims[d] {
                if dims[d] > max {
                    return Err(FbankError::format_violation(format!(
                        "dimension {d} extent {} exceeds maximum {max}",
                        dims[d]
                    )));
                }
            }
        }

        Ok(Self {
            dims,
            max_dims: self.max_dims,
        })
    }

    /// Проверяет, что `slab` лежит внутри пространства и покрывает
    /// строки целиком (полный диапазон по IF и частоте).
    pub fn check_row_slab(
        &self,
        slab: &Hyperslab,
    ) -> FbankResult<()> {
        for d in 0..RANK {
            let end = slab.offset[d].checked_add(slab.count[d]);
            if !matches!(end, Some(end) if end <= self.dims[d]) {
                return Err(FbankError::format_violation(format!(
                    "selection {:?}+{:?} is outside extent {:?}",
                    slab.offset, slab.count, self.dims
                )));
            }
        }

        if slab.offset[1] != 0
            || slab.offset[2] != 0
            || slab.count[1] != self.dims[1]
            || slab.count[2] != self.dims[2]
        {
            return Err(FbankError::format_violation(
                "only whole-row selections (full IF and frequency extents) are supported",
            ));
        }

        Ok(())
    }
}

impl Hyperslab {
    /// Область из `count` целых строк, начиная со строки `start`.
    pub fn rows(
        start: u64,
        count: u64,
        space: &Dataspace,
    ) -> Self {
        Self {
            offset: [start, 0, 0],
            count: [count, space.dims[1], space.dims[2]],
        }
    }

    pub fn num_elements(&self) -> u64 {
        self.count.iter().product()
    }
}

impl DatasetLayout {
    /// Проверяет согласованность формы чанка с пространством.
    pub fn validate(&self) -> FbankResult<()> {
        if self.chunk[0] != 1 {
            return Err(FbankError::format_violation(format!(
                "time chunk must be 1 integration, got {}",
                self.chunk[0]
            )));
        }

        for d in 0..RANK {
            if self.chunk[d] == 0 {
                return Err(FbankError::format_violation(format!(
                    "chunk dimension {d} is zero"
                )));
            }
            if let Some(max) = self.space.max_dims[d] {
                if self.chunk[d] > max {
                    return Err(FbankError::format_violation(format!(
                        "chunk dimension {d} ({}) exceeds extent {max}",
                        self.chunk[d]
                    )));
                }
            }
        }

        for d in 1..RANK {
            if self.space.max_dims[d].is_none() {
                return Err(FbankError::format_violation(format!(
                    "only the time axis may be unlimited (dimension {d})"
                )));
            }
        }

        Ok(())
    }

    /// Размер сырого чанка в байтах.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk.iter().product::<u64>() as usize * self.element.size()
    }

    /// Размер одной строки (интеграции) в байтах.
    pub fn row_bytes(&self) -> usize {
        (self.space.dims[1] * self.space.dims[2]) as usize * self.element.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> Dataspace {
        Dataspace::new([0, 2, 1024], [None, Some(2), Some(1024)])
    }

    #[test]
    fn test_extended_grows_time_only() {
        let grown = space().extended([5, 2, 1024]).unwrap();
        assert_eq!(grown.dims, [5, 2, 1024]);
        assert_eq!(grown.num_elements(), 5 * 2 * 1024);

        assert!(grown.extended([4, 2, 1024]).is_err(), "shrink");
        assert!(grown.extended([6, 3, 1024]).is_err(), "over max");
    }

    #[test]
    fn test_row_slab_checks() {
        let s = space().extended([4, 2, 1024]).unwrap();

        s.check_row_slab(&Hyperslab::rows(1, 3, &s)).unwrap();
        assert!(s.check_row_slab(&Hyperslab::rows(2, 3, &s)).is_err());

        let partial = Hyperslab {
            offset: [0, 0, 10],
            count: [1, 2, 100],
        };
        assert!(s.check_row_slab(&partial).is_err());
    }

    #[test]
    fn test_layout_validation() {
        let mut layout = DatasetLayout {
            name: "data".to_string(),
            element: ElementType::F32,
            space: space(),
            chunk: [1, 2, 512],
            filters: FilterPipeline::default(),
        };
        layout.validate().unwrap();
        assert_eq!(layout.chunk_bytes(), 2 * 512 * 4);
        assert_eq!(layout.row_bytes(), 2 * 1024 * 4);

        layout.chunk = [2, 2, 512];
        assert!(layout.validate().is_err());

        layout.chunk = [1, 2, 2048];
        assert!(layout.validate().is_err());

        layout.chunk = [1, 0, 512];
        assert!(layout.validate().is_err());
    }
}
