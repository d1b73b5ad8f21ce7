//! Хранилище поверх HDF5: файл с одним растущим датасетом `data`.
//!
//! Каждый вызов доходит до файла сразу (`H5Fflush`), поэтому размеры
//! датасета, атрибуты и уже записанные интеграции видны читателю без
//! закрытия контейнера. Индекс чанков ведёт сама библиотека HDF5.
//!
//! Отсчёты во входном буфере - little-endian значения типа элемента.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use byteorder::{ByteOrder, LittleEndian};
use fbank_types::{AttrValue, ElementType, FbankError, FbankResult};
use hdf5::{
    types::{VarLenAscii, VarLenUnicode},
    Attribute, Dataset, File, H5Type, Location,
};
use log::debug;
use ndarray::{ArrayView1, ArrayView3};

use crate::store::{ArrayStore, DatasetLayout, Dataspace, Hyperslab, RANK};

/// Атрибут датасета с метками осей (раскладка `H5DSset_label`)
pub const DIMENSION_LABELS: &str = "DIMENSION_LABELS";

/// Открытый датасет и его текущая геометрия.
#[derive(Debug)]
struct OpenDataset {
    dataset: Dataset,
    element: ElementType,
    space: Dataspace,
    labels: [String; RANK],
    labels_attr: Option<Attribute>,
}

/// [`ArrayStore`] на HDF5-файле.
#[derive(Debug)]
pub struct Hdf5Store {
    path: PathBuf,
    file: Option<File>,
    dataset: Option<OpenDataset>,
}

impl Hdf5Store {
    /// Создаёт (перезаписывает) файл `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> FbankResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(storage)?;
        debug!("Created HDF5 container {path:?}");

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            dataset: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> FbankResult<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| FbankError::format_violation("container is closed"))
    }

    fn open_dataset(&mut self) -> FbankResult<&mut OpenDataset> {
        self.dataset
            .as_mut()
            .ok_or_else(|| FbankError::format_violation("no open dataset"))
    }

    fn flush(&self) -> FbankResult<()> {
        self.file()?.flush().map_err(storage)
    }
}

impl ArrayStore for Hdf5Store {
    fn set_root_attr(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> FbankResult<()> {
        write_attr(self.file()?, name, &value)?;
        self.flush()
    }

    fn create_dataset(
        &mut self,
        layout: DatasetLayout,
    ) -> FbankResult<Dataspace> {
        if self.dataset.is_some() {
            return Err(FbankError::format_violation("dataset already exists"));
        }
        layout.validate()?;

        let file = self.file()?;
        let [t0, nifs, nchans] = layout.space.dims.map(|d| d as usize);
        let [c0, c1, c2] = layout.chunk.map(|c| c as usize);

        let mut builder = match layout.element {
            ElementType::U8 => file.new_dataset::<u8>(),
            ElementType::U16 => file.new_dataset::<u16>(),
            ElementType::F32 => file.new_dataset::<f32>(),
            ElementType::F64 => file.new_dataset::<f64>(),
        }
        .shape((t0.., nifs, nchans))
        .chunk((c0, c1, c2));

        // Пользовательские фильтры крейт ставит опциональными: без плагина
        // чанк пишется нефильтрованным
        for filter in layout.filters.filters() {
            builder = builder.add_filter(filter.id() as _, &filter.params());
        }

        let dataset = builder.create(layout.name.as_str()).map_err(storage)?;
        debug!(
            "Created dataset {:?}: {} {:?}, chunk {:?} ({} B), filters {}",
            layout.name,
            layout.element,
            layout.space.dims,
            layout.chunk,
            layout.chunk_bytes(),
            layout.filters
        );

        self.dataset = Some(OpenDataset {
            dataset,
            element: layout.element,
            space: layout.space,
            labels: Default::default(),
            labels_attr: None,
        });
        self.flush()?;

        Ok(layout.space)
    }

    fn set_dataset_attr(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> FbankResult<()> {
        let ds = self.open_dataset()?;
        write_attr(&ds.dataset, name, &value)?;
        self.flush()
    }

    fn label_dimension(
        &mut self,
        dim: usize,
        label: &str,
    ) -> FbankResult<()> {
        let ds = self.open_dataset()?;
        let slot = ds
            .labels
            .get_mut(dim)
            .ok_or_else(|| FbankError::format_violation(format!("dimension {dim} out of rank")))?;
        *slot = label.to_string();

        let values = ds
            .labels
            .iter()
            .map(VarLenAscii::from_ascii)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FbankError::format_violation(format!("label {label:?}: {e}")))?;

        if ds.labels_attr.is_none() {
            let attr = ds
                .dataset
                .new_attr::<VarLenAscii>()
                .shape((RANK,))
                .create(DIMENSION_LABELS)
                .map_err(storage)?;
            ds.labels_attr = Some(attr);
        }
        if let Some(attr) = &ds.labels_attr {
            attr.write(ArrayView1::from(values.as_slice()))
                .map_err(storage)?;
        }

        self.flush()
    }

    fn extend(
        &mut self,
        dims: [u64; RANK],
    ) -> FbankResult<Dataspace> {
        let ds = self.open_dataset()?;
        let space = ds.space.extended(dims)?;

        let [t, i, f] = dims.map(|d| d as usize);
        ds.dataset.resize((t, i, f)).map_err(storage)?;
        ds.space = space;

        self.flush()?;
        Ok(space)
    }

    fn write_slab(
        &mut self,
        slab: &Hyperslab,
        data: &[u8],
    ) -> FbankResult<()> {
        let ds = self.open_dataset()?;
        ds.space.check_row_slab(slab)?;

        let n = slab.num_elements() as usize;
        let expected = n * ds.element.size();
        if data.len() != expected {
            return Err(FbankError::format_violation(format!(
                "selection needs {expected} bytes, buffer has {}",
                data.len()
            )));
        }
        if n == 0 {
            return Ok(());
        }

        match ds.element {
            ElementType::U8 => write_rows(&ds.dataset, slab, data)?,
            ElementType::U16 => {
                let mut values = vec![0u16; n];
                LittleEndian::read_u16_into(data, &mut values);
                write_rows(&ds.dataset, slab, &values)?;
            }
            ElementType::F32 => {
                let mut values = vec![0f32; n];
                LittleEndian::read_f32_into(data, &mut values);
                write_rows(&ds.dataset, slab, &values)?;
            }
            ElementType::F64 => {
                let mut values = vec![0f64; n];
                LittleEndian::read_f64_into(data, &mut values);
                write_rows(&ds.dataset, slab, &values)?;
            }
        }

        self.flush()
    }

    fn close_dataset(&mut self) -> FbankResult<()> {
        let ds = self
            .dataset
            .take()
            .ok_or_else(|| FbankError::format_violation("no open dataset"))?;
        debug!("Closing dataset at extent {:?}", ds.space.dims);
        drop(ds);

        self.flush()
    }

    fn close(&mut self) -> FbankResult<()> {
        self.dataset = None;
        let file = self
            .file
            .take()
            .ok_or_else(|| FbankError::format_violation("container is closed"))?;

        file.flush().map_err(storage)?;
        debug!("Closed HDF5 container {:?}", self.path);
        Ok(())
    }
}

/// Пишет скалярный атрибут с типом, соответствующим значению.
fn write_attr(
    location: &Location,
    name: &str,
    value: &AttrValue,
) -> FbankResult<()> {
    match value {
        AttrValue::Double(v) => location
            .new_attr::<f64>()
            .create(name)
            .and_then(|attr| attr.write_scalar(v)),
        AttrValue::Int(v) => {
            let v = i32::try_from(*v).map_err(|_| {
                FbankError::format_violation(format!("attribute {name} = {v} does not fit int"))
            })?;
            location
                .new_attr::<i32>()
                .create(name)
                .and_then(|attr| attr.write_scalar(&v))
        }
        AttrValue::Str(s) => {
            let v = VarLenUnicode::from_str(s).map_err(|e| {
                FbankError::format_violation(format!("attribute {name}: {e}"))
            })?;
            location
                .new_attr::<VarLenUnicode>()
                .create(name)
                .and_then(|attr| attr.write_scalar(&v))
        }
    }
    .map_err(storage)
}

/// Пишет целые строки `slab` из типизированного буфера.
fn write_rows<T: H5Type>(
    dataset: &Dataset,
    slab: &Hyperslab,
    values: &[T],
) -> FbankResult<()> {
    let [rows, nifs, nchans] = slab.count.map(|c| c as usize);
    let t0 = slab.offset[0] as usize;

    let view = ArrayView3::from_shape((rows, nifs, nchans), values)
        .map_err(|e| FbankError::format_violation(e.to_string()))?;

    dataset
        .write_slice(view, (t0..t0 + rows, .., ..))
        .map_err(storage)
}

fn storage(e: hdf5::Error) -> FbankError {
    FbankError::storage(e.to_string())
}
