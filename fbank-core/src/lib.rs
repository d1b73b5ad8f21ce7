//! Контейнер fbank: раскладка датасета, фильтры, планировщик чанков и
//! хранилища массивов.
//!
//! Контейнер - HDF5-файл с атрибутами `CLASS`/`VERSION` и одним растущим
//! по времени датасетом `data` формы `[time, IF, frequency]` с
//! типизированными атрибутами. Данные режутся на чанки, каждый чанк
//! проходит фильтр bitshuffle (32008) или LZ4 (32004), если он выбран.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use fbank_core::{ArrayStore, ChunkPlanner, DatasetLayout, Dataspace, FilterPipeline,
//!     Hdf5Store, Hyperslab};
//! use fbank_types::{FilterPolicy, FilterbankHeader};
//!
//! let header = FilterbankHeader::voyager1();
//! let element = header.element_type()?;
//! let mut store = Hdf5Store::create("voyager.h5")?;
//!
//! store.create_dataset(DatasetLayout {
//!     name: "data".to_string(),
//!     element,
//!     space: Dataspace::new([0, 1, 65536], [None, Some(1), Some(65536)]),
//!     chunk: ChunkPlanner::default().plan(&header),
//!     filters: FilterPipeline::from_policy(FilterPolicy::BitshuffleLz4),
//! })?;
//!
//! let space = store.extend([1, 1, 65536])?;
//! store.write_slab(&Hyperslab::rows(0, 1, &space), &vec![0u8; 65536 * 4])?;
//! store.close_dataset()?;
//! store.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chunking;
pub mod filters;
pub mod hdf5_store;
pub mod memory;
pub mod store;

pub use chunking::*;
pub use filters::*;
pub use hdf5_store::*;
pub use memory::*;
pub use store::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Сессии на разных потоках владеют своими хранилищами
const _: () = {
    const fn assert_send<T: Send>() {}
    assert_send::<Hdf5Store>();
    assert_send::<MemoryStore>();
};
