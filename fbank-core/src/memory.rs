//! Хранилище в памяти с журналом вызовов.
//!
//! Клоны [`MemoryStore`] разделяют одно состояние, поэтому вызывающая
//! сторона может отдать хранилище сессии и смотреть журнал после закрытия.

use std::sync::{Arc, Mutex, MutexGuard};

use fbank_types::{AttrValue, Attribute, FbankError, FbankResult};

use crate::store::{ArrayStore, DatasetLayout, Dataspace, Hyperslab, RANK};

/// Запись журнала: один вызов хранилища.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    SetRootAttr(String),
    CreateDataset { dims: [u64; RANK], chunk: [u64; RANK] },
    SetDatasetAttr(String),
    LabelDimension(usize, String),
    Extend { dims: [u64; RANK] },
    WriteSlab { offset: [u64; RANK], count: [u64; RANK], bytes: usize },
    CloseDataset,
    Close,
}

/// Вызов, который должен завершиться ошибкой (для проверки отказов).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    CreateDataset,
    SetDatasetAttr,
    Extend,
    WriteSlab,
    /// Запись успевает положить первые `rows` строк и падает
    PartialWriteSlab { rows: u64 },
    Close,
}

/// Содержимое хранилища.
#[derive(Debug, Default)]
pub struct MemoryContents {
    pub root_attrs: Vec<Attribute>,
    pub layout: Option<DatasetLayout>,
    pub attrs: Vec<Attribute>,
    pub labels: [Option<String>; RANK],
    /// Все строки датасета подряд: time, IF, frequency
    pub data: Vec<u8>,
    pub journal: Vec<StoreOp>,
    pub dataset_closed: bool,
    pub closed: bool,
    fail_on: Option<FailPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryContents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Доступ к содержимому.
    pub fn contents(&self) -> MutexGuard<'_, MemoryContents> {
        // Отравленный мьютекс не мешает читать журнал
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Следующий вызов `point` вернёт ошибку.
    pub fn fail_next(
        &self,
        point: FailPoint,
    ) {
        self.contents().fail_on = Some(point);
    }

    /// Журнал только вызовов `extend`.
    pub fn extends(&self) -> Vec<[u64; RANK]> {
        self.contents()
            .journal
            .iter()
            .filter_map(|op| match op {
                StoreOp::Extend { dims } => Some(*dims),
                _ => None,
            })
            .collect()
    }
}

impl MemoryContents {
    fn check(
        &mut self,
        point: FailPoint,
    ) -> FbankResult<()> {
        if self.closed {
            return Err(FbankError::format_violation("memory store is closed"));
        }
        if self.fail_on == Some(point) {
            self.fail_on = None;
            return Err(injected(point));
        }
        Ok(())
    }

    /// Сколько строк записать до отказа, если взведён `PartialWriteSlab`.
    fn take_partial_rows(&mut self) -> Option<u64> {
        match self.fail_on {
            Some(FailPoint::PartialWriteSlab { rows }) => {
                self.fail_on = None;
                Some(rows)
            }
            _ => None,
        }
    }

    fn open_layout(&mut self) -> FbankResult<&mut DatasetLayout> {
        if self.dataset_closed {
            return Err(FbankError::format_violation("dataset is closed"));
        }
        self.layout
            .as_mut()
            .ok_or_else(|| FbankError::format_violation("no open dataset"))
    }

    pub fn attr(
        &self,
        name: &str,
    ) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn root_attr(
        &self,
        name: &str,
    ) -> Option<&AttrValue> {
        self.root_attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Текущие размеры датасета.
    pub fn dims(&self) -> Option<[u64; RANK]> {
        self.layout.as_ref().map(|l| l.space.dims)
    }
}

impl ArrayStore for MemoryStore {
    fn set_root_attr(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> FbankResult<()> {
        let mut c = self.contents();
        if c.closed {
            return Err(FbankError::format_violation("memory store is closed"));
        }
        c.root_attrs.push(Attribute {
            name: name.to_string(),
            value,
        });
        c.journal.push(StoreOp::SetRootAttr(name.to_string()));
        Ok(())
    }

    fn create_dataset(
        &mut self,
        layout: DatasetLayout,
    ) -> FbankResult<Dataspace> {
        let mut c = self.contents();
        c.check(FailPoint::CreateDataset)?;

        if c.layout.is_some() {
            return Err(FbankError::format_violation("dataset already exists"));
        }
        layout.validate()?;

        let space = layout.space;
        c.journal.push(StoreOp::CreateDataset {
            dims: space.dims,
            chunk: layout.chunk,
        });
        c.data = vec![0u8; space.num_elements() as usize * layout.element.size()];
        c.layout = Some(layout);

        Ok(space)
    }

    fn set_dataset_attr(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> FbankResult<()> {
        let mut c = self.contents();
        c.check(FailPoint::SetDatasetAttr)?;
        c.open_layout()?;

        c.attrs.push(Attribute {
            name: name.to_string(),
            value,
        });
        c.journal.push(StoreOp::SetDatasetAttr(name.to_string()));
        Ok(())
    }

    fn label_dimension(
        &mut self,
        dim: usize,
        label: &str,
    ) -> FbankResult<()> {
        let mut c = self.contents();
        c.open_layout()?;

        let slot = c
            .labels
            .get_mut(dim)
            .ok_or_else(|| FbankError::format_violation(format!("dimension {dim} out of rank")))?;
        *slot = Some(label.to_string());
        c.journal
            .push(StoreOp::LabelDimension(dim, label.to_string()));
        Ok(())
    }

    fn extend(
        &mut self,
        dims: [u64; RANK],
    ) -> FbankResult<Dataspace> {
        let mut c = self.contents();
        c.check(FailPoint::Extend)?;

        let layout = c.open_layout()?;
        layout.space = layout.space.extended(dims)?;
        let space = layout.space;
        let bytes = space.num_elements() as usize * layout.element.size();

        c.data.resize(bytes, 0);
        c.journal.push(StoreOp::Extend { dims });
        Ok(space)
    }

    fn write_slab(
        &mut self,
        slab: &Hyperslab,
        data: &[u8],
    ) -> FbankResult<()> {
        let mut c = self.contents();
        c.check(FailPoint::WriteSlab)?;

        let layout = c.open_layout()?;
        layout.space.check_row_slab(slab)?;
        let row_bytes = layout.row_bytes();
        let expected = slab.num_elements() as usize * layout.element.size();

        if data.len() != expected {
            return Err(FbankError::format_violation(format!(
                "selection needs {expected} bytes, buffer has {}",
                data.len()
            )));
        }

        let start = slab.offset[0] as usize * row_bytes;

        if let Some(rows) = c.take_partial_rows() {
            let written = rows.min(slab.count[0]) as usize * row_bytes;
            c.data[start..start + written].copy_from_slice(&data[..written]);
            return Err(injected(FailPoint::PartialWriteSlab { rows }));
        }

        c.data[start..start + data.len()].copy_from_slice(data);
        c.journal.push(StoreOp::WriteSlab {
            offset: slab.offset,
            count: slab.count,
            bytes: data.len(),
        });
        Ok(())
    }

    fn close_dataset(&mut self) -> FbankResult<()> {
        let mut c = self.contents();
        c.open_layout()?;
        c.dataset_closed = true;
        c.journal.push(StoreOp::CloseDataset);
        Ok(())
    }

    fn close(&mut self) -> FbankResult<()> {
        let mut c = self.contents();
        c.check(FailPoint::Close)?;
        c.closed = true;
        c.journal.push(StoreOp::Close);
        Ok(())
    }
}

fn injected(point: FailPoint) -> FbankError {
    FbankError::Io(std::io::Error::other(format!(
        "injected failure on {point:?}"
    )))
}
