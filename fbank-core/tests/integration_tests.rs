use std::path::{Path, PathBuf};

use fbank_core::{
    ArrayStore, ChunkPlanner, DatasetLayout, Dataspace, FilterPipeline, Hdf5Store, Hyperslab,
    MemoryStore, StoreOp, DATASET_NAME, DIMENSION_LABELS, FILTERBANK_CLASS, FILTERBANK_VERSION,
    RANK,
};
use fbank_types::{FilterPolicy, FilterbankHeader};
use hdf5::types::{VarLenAscii, VarLenUnicode};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tempfile::TempDir;

// ===========================================================================
// Helpers - детерминированные тест-данные
// ===========================================================================

/// Детерминированный заголовок: 2 IF × 1000 каналов, float32.
fn deterministic_header() -> FilterbankHeader {
    FilterbankHeader {
        nifs: 2,
        nchans: 1000,
        nbits: 32,
        ..FilterbankHeader::voyager1()
    }
}

/// Гладкий спектр float32 (полоса пропускания + слабая линия).
fn deterministic_spectra(
    rows: usize,
    nifs: usize,
    nchans: usize,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(rows * nifs * nchans * 4);

    for t in 0..rows {
        for i in 0..nifs {
            for f in 0..nchans {
                let bandpass = 1000.0 + (f / 50) as f32;
                let line = if f == 333 { 25.0 } else { 0.0 };
                out.extend_from_slice(&(bandpass + line + (t * 10 + i) as f32).to_le_bytes());
            }
        }
    }

    out
}

fn f32_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn layout_for(
    header: &FilterbankHeader,
    planner: ChunkPlanner,
    policy: FilterPolicy,
) -> DatasetLayout {
    let element = header.element_type().unwrap();
    let (nifs, nchans) = (header.nifs as u64, header.nchans as u64);

    DatasetLayout {
        name: DATASET_NAME.to_string(),
        element,
        space: Dataspace::new([0, nifs, nchans], [None, Some(nifs), Some(nchans)]),
        chunk: planner.plan(header),
        filters: FilterPipeline::from_policy(policy),
    }
}

/// Пишет все интеграции `data` по `per_write` строк за вызов.
fn write_container(
    path: &Path,
    header: &FilterbankHeader,
    planner: ChunkPlanner,
    policy: FilterPolicy,
    data: &[u8],
    per_write: usize,
) {
    let tint = header.integration_size().unwrap();
    let mut store = Hdf5Store::create(path).unwrap();
    store
        .set_root_attr("CLASS", FILTERBANK_CLASS.into())
        .unwrap();
    store
        .set_root_attr("VERSION", FILTERBANK_VERSION.into())
        .unwrap();

    let mut space = store
        .create_dataset(layout_for(header, planner, policy))
        .unwrap();
    store.set_dataset_attr("nchans", header.nchans.into()).unwrap();

    for slab in data.chunks(tint * per_write) {
        let count = (slab.len() / tint) as u64;
        let start = space.dims[0];
        space = store
            .extend([start + count, space.dims[1], space.dims[2]])
            .unwrap();
        store
            .write_slab(&Hyperslab::rows(start, count, &space), slab)
            .unwrap();
    }

    store.close_dataset().unwrap();
    store.close().unwrap();
}

fn temp_path(
    dir: &TempDir,
    name: &str,
) -> PathBuf {
    dir.path().join(name)
}

// ===========================================================================
// Test Vector #1 - без фильтров, несколько чанков по частоте
// ===========================================================================

#[test]
fn test_vector_1_layout_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "vector1.h5");
    let header = deterministic_header();
    let data = deterministic_spectra(3, 2, 1000);

    write_container(
        &path,
        &header,
        ChunkPlanner::new(2048),
        FilterPolicy::None,
        &data,
        1,
    );

    let file = hdf5::File::open(&path).unwrap();
    let class: VarLenUnicode = file.attr("CLASS").unwrap().read_scalar().unwrap();
    let version: VarLenUnicode = file.attr("VERSION").unwrap().read_scalar().unwrap();
    assert_eq!(class.as_str(), FILTERBANK_CLASS);
    assert_eq!(version.as_str(), FILTERBANK_VERSION);

    let ds = file.dataset(DATASET_NAME).unwrap();
    assert_eq!(ds.shape(), vec![3, 2, 1000]);
    // 2048 / (2 IF × 4 байта) = 256 → 4 части по 250 каналов
    assert_eq!(ds.chunk(), Some(vec![1, 2, 250]));
    assert!(ds.is_resizable());
    assert_eq!(ds.attr("nchans").unwrap().read_scalar::<i32>().unwrap(), 1000);
}

#[test]
fn test_vector_1_read_back() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "vector1.h5");
    let header = deterministic_header();
    let data = deterministic_spectra(5, 2, 1000);

    write_container(
        &path,
        &header,
        ChunkPlanner::new(2048),
        FilterPolicy::None,
        &data,
        2,
    );

    let ds = hdf5::File::open(&path)
        .unwrap()
        .dataset(DATASET_NAME)
        .unwrap();
    assert_eq!(ds.read_raw::<f32>().unwrap(), f32_le(&data));

    // Отдельная интеграция читается срезом по времени
    let row: ndarray::Array2<f32> = ds.read_slice((4, .., ..)).unwrap();
    assert_eq!(row.shape(), &[2, 1000]);
    assert_eq!(row[[1, 333]], 1000.0 + 6.0 + 25.0 + 41.0);
}

// ===========================================================================
// Test Vector #2 - фильтры bitshuffle (32008) и LZ4 (32004)
// ===========================================================================

#[test]
fn test_vector_2_filtered_read_back() {
    let dir = TempDir::new().unwrap();
    let header = deterministic_header();
    let data = deterministic_spectra(4, 2, 1000);

    for policy in [FilterPolicy::BitshuffleLz4, FilterPolicy::Lz4] {
        let path = temp_path(&dir, &format!("vector2_{policy}.h5"));
        write_container(
            &path,
            &header,
            ChunkPlanner::default(),
            policy,
            &data,
            4,
        );

        // Без плагина фильтр пропускается, чтение не меняется
        let ds = hdf5::File::open(&path)
            .unwrap()
            .dataset(DATASET_NAME)
            .unwrap();
        assert_eq!(ds.shape(), vec![4, 2, 1000], "{policy}");
        assert_eq!(ds.read_raw::<f32>().unwrap(), f32_le(&data), "{policy}");
    }
}

#[test]
fn test_vector_2_incompressible_rows() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "vector2_random.h5");
    let header = FilterbankHeader {
        nbits: 8,
        nifs: 1,
        nchans: 4096,
        ..FilterbankHeader::voyager1()
    };
    let mut rng = StdRng::seed_from_u64(7);
    let data: Vec<u8> = (0..3 * 4096).map(|_| rng.gen()).collect();

    write_container(
        &path,
        &header,
        ChunkPlanner::new(1024),
        FilterPolicy::BitshuffleLz4,
        &data,
        3,
    );

    let ds = hdf5::File::open(&path)
        .unwrap()
        .dataset(DATASET_NAME)
        .unwrap();
    assert_eq!(ds.chunk(), Some(vec![1, 1, 1024]));
    assert_eq!(ds.read_raw::<u8>().unwrap(), data);
}

// ===========================================================================
// Test Vector #3 - контейнер без close
// ===========================================================================

#[test]
fn test_vector_3_unclosed_container_is_readable() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "vector3.h5");
    let header = deterministic_header();
    let row = deterministic_spectra(1, 2, 1000);

    let mut store = Hdf5Store::create(&path).unwrap();
    store
        .set_root_attr("CLASS", FILTERBANK_CLASS.into())
        .unwrap();
    store
        .create_dataset(layout_for(&header, ChunkPlanner::default(), FilterPolicy::None))
        .unwrap();
    store.label_dimension(0, "time").unwrap();
    for t in 0..4u64 {
        let space = store.extend([t + 1, 2, 1000]).unwrap();
        store
            .write_slab(&Hyperslab::rows(t, 1, &space), &row)
            .unwrap();
    }
    drop(store);

    let ds = hdf5::File::open(&path)
        .unwrap()
        .dataset(DATASET_NAME)
        .unwrap();
    assert_eq!(ds.shape(), vec![4, 2, 1000]);
    let labels = ds
        .attr(DIMENSION_LABELS)
        .unwrap()
        .read_raw::<VarLenAscii>()
        .unwrap();
    assert_eq!(labels[0].as_str(), "time");
    assert_eq!(labels[2].as_str(), "");
}

// ===========================================================================
// Геометрия и хранилище в памяти
// ===========================================================================

#[test]
fn test_sub_byte_depth_one_byte_per_sample() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "two_bit.h5");
    let header = FilterbankHeader {
        nbits: 2,
        nifs: 1,
        nchans: 300,
        ..FilterbankHeader::voyager1()
    };
    let data: Vec<u8> = (0..2 * 300).map(|i| (i % 4) as u8).collect();

    write_container(
        &path,
        &header,
        ChunkPlanner::new(128),
        FilterPolicy::BitshuffleLz4,
        &data,
        1,
    );

    let ds = hdf5::File::open(&path)
        .unwrap()
        .dataset(DATASET_NAME)
        .unwrap();
    assert_eq!(ds.chunk(), Some(vec![1, 1, 100]));
    assert_eq!(ds.read_raw::<u8>().unwrap(), data);
}

#[test]
fn test_large_file_streaming() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "large.h5");
    let nchans = 1usize << 18;
    let header = FilterbankHeader {
        nifs: 1,
        nchans: nchans as u32,
        nbits: 32,
        ..FilterbankHeader::voyager1()
    };

    let mut store = Hdf5Store::create(&path).unwrap();
    let mut space = store
        .create_dataset(layout_for(&header, ChunkPlanner::default(), FilterPolicy::None))
        .unwrap();

    let row = deterministic_spectra(1, 1, nchans);
    for t in 0..8u64 {
        space = store.extend([t + 1, 1, nchans as u64]).unwrap();
        store
            .write_slab(&Hyperslab::rows(t, 1, &space), &row)
            .unwrap();
    }
    store.close_dataset().unwrap();
    store.close().unwrap();

    let ds = hdf5::File::open(&path)
        .unwrap()
        .dataset(DATASET_NAME)
        .unwrap();
    assert_eq!(ds.shape(), vec![8, 1, nchans]);
    assert_eq!(ds.chunk(), Some(vec![1, 1, nchans]));

    let last: ndarray::Array2<f32> = ds.read_slice((7, .., ..)).unwrap();
    assert_eq!(last.as_slice().unwrap(), f32_le(&row).as_slice());
}

#[test]
fn test_memory_store_journal() {
    let header = deterministic_header();
    let store = MemoryStore::new();
    let mut handle = store.clone();

    let space = handle
        .create_dataset(layout_for(&header, ChunkPlanner::default(), FilterPolicy::None))
        .unwrap();
    for (d, label) in ["time", "feed_id", "frequency"].iter().enumerate() {
        handle.label_dimension(d, label).unwrap();
    }

    let space = handle.extend([3, space.dims[1], space.dims[2]]).unwrap();
    let data = deterministic_spectra(3, 2, 1000);
    handle
        .write_slab(&Hyperslab::rows(0, 3, &space), &data)
        .unwrap();
    handle.close_dataset().unwrap();
    handle.close().unwrap();

    let c = store.contents();
    assert_eq!(c.data, data);
    assert_eq!(c.labels[2].as_deref(), Some("frequency"));
    assert_eq!(
        c.journal[c.journal.len() - 4..],
        [
            StoreOp::Extend { dims: [3, 2, 1000] },
            StoreOp::WriteSlab {
                offset: [0, 0, 0],
                count: [3, 2, 1000],
                bytes: data.len(),
            },
            StoreOp::CloseDataset,
            StoreOp::Close,
        ]
    );
    assert_eq!(RANK, 3);
}
