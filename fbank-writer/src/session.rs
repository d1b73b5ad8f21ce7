//! Сессия записи: открытие контейнера, дозапись интеграций, закрытие.
//!
//! Жизненный цикл: `Uninitialized -> Open -> (write)* -> Closed`. Повторное
//! открытие возможно только из неактивного состояния. Сессия владеет
//! хранилищем от `open` до `close` и не держит буферы вызывающей стороны.

use std::path::Path;

use fbank_core::{
    ArrayStore, ChunkPlanner, DatasetLayout, Dataspace, FilterPipeline, Hdf5Store, Hyperslab,
    DATASET_NAME, FILTERBANK_CLASS, FILTERBANK_VERSION, RANK,
};
use fbank_types::{ElementType, FilterPolicy, FilterbankHeader};
use log::{debug, error, info, warn};

use crate::{
    attributes::{header_attributes, AXIS_LABELS},
    SessionOptions, WriterError, WriterResult,
};

/// Состояние сессии.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Ещё ни разу не открывалась
    #[default]
    Uninitialized,
    /// Контейнер открыт, запись разрешена
    Open,
    /// Контейнер закрыт, сессию можно открыть снова
    Closed,
}

/// Сессия записи filterbank-наблюдения в один контейнер.
///
/// По умолчанию пишет в [`Hdf5Store`]; любое другое [`ArrayStore`]
/// подключается через [`Session::open_with`].
#[derive(Debug)]
pub struct Session<S: ArrayStore = Hdf5Store> {
    state: SessionState,
    store: Option<S>,
    dataspace: Option<Dataspace>,
    elem_type: Option<ElementType>,
    elem_size: usize,
    tint_size: usize,
    chunk_dims: [u64; RANK],
    filter_policy: FilterPolicy,
    offset_dims: [u64; RANK],
    filesz_dims: [u64; RANK],
    byte_count: u64,
    dump_count: u64,
    diagnostics: bool,
}

/// Всё, что выводится из заголовка до обращения к хранилищу.
struct OpenPlan {
    layout: DatasetLayout,
    tint_size: usize,
    policy: FilterPolicy,
}

impl<S: ArrayStore> Session<S> {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            store: None,
            dataspace: None,
            elem_type: None,
            elem_size: 0,
            tint_size: 0,
            chunk_dims: [0; RANK],
            filter_policy: FilterPolicy::None,
            offset_dims: [0; RANK],
            filesz_dims: [0; RANK],
            byte_count: 0,
            dump_count: 0,
            diagnostics: false,
        }
    }

    /// Открывает сессию поверх уже созданного хранилища.
    ///
    /// `integration_hint` - ожидаемое число интеграций; используется
    /// только политикой [`FilterPolicy::Auto`].
    pub fn open_with(
        &mut self,
        store: S,
        header: &FilterbankHeader,
        integration_hint: u64,
        options: SessionOptions,
    ) -> WriterResult<()> {
        self.plan_open(header, integration_hint, &options)
            .and_then(|plan| self.open_store(store, header, plan, &options))
            .inspect_err(|e| error!("Session open failed: {e}"))
    }

    /// Дописывает одну или несколько интеграций из `buffer`.
    ///
    /// Буфер упорядочен по времени, затем по IF, затем по частоте; его длина
    /// должна быть положительным кратным размера интеграции. Каждый вызов
    /// делает ровно одно расширение датасета и одну запись.
    pub fn write(
        &mut self,
        header: &FilterbankHeader,
        buffer: &[u8],
    ) -> WriterResult<()> {
        self.write_inner(header, buffer)
            .inspect_err(|e| error!("Session write failed: {e}"))
    }

    /// Закрывает датасет и контейнер, сбрасывает сессию.
    ///
    /// Сессия сбрасывается даже при ошибке освобождения; возвращается
    /// первая ошибка.
    pub fn close(&mut self) -> WriterResult<()> {
        self.close_inner()
            .inspect_err(|e| error!("Session close failed: {e}"))
    }

    /// Выводит состояние сессии на уровне debug.
    pub fn show_context(
        &self,
        label: &str,
    ) {
        debug!("---- session context: {label} ----");
        debug!("  state         : {}", self.state);
        debug!(
            "  element       : {} ({} B)",
            self.elem_type
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.elem_size
        );
        debug!("  tint size     : {} B", self.tint_size);
        debug!("  chunk dims    : {:?}", self.chunk_dims);
        debug!("  filters       : {}", self.filter_policy);
        debug!("  offset dims   : {:?}", self.offset_dims);
        debug!("  filesz dims   : {:?}", self.filesz_dims);
        debug!("  byte count    : {}", self.byte_count);
        debug!("  dump count    : {}", self.dump_count);
        if let Some(space) = &self.dataspace {
            debug!("  dataspace     : {:?} max {:?}", space.dims, space.max_dims);
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Геттеры
    ////////////////////////////////////////////////////////////////////////////

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.elem_type
    }

    pub fn element_size(&self) -> usize {
        self.elem_size
    }

    /// Размер одной интеграции в байтах.
    pub fn integration_size(&self) -> usize {
        self.tint_size
    }

    pub fn chunk_dims(&self) -> [u64; RANK] {
        self.chunk_dims
    }

    /// Политика сжатия после разрешения `Auto`.
    pub fn filter_policy(&self) -> FilterPolicy {
        self.filter_policy
    }

    pub fn offset_dims(&self) -> [u64; RANK] {
        self.offset_dims
    }

    /// Текущий размер датасета.
    pub fn filesz_dims(&self) -> [u64; RANK] {
        self.filesz_dims
    }

    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Число записанных интеграций.
    pub fn dump_count(&self) -> u64 {
        self.dump_count
    }

    pub fn dataspace(&self) -> Option<&Dataspace> {
        self.dataspace.as_ref()
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    ////////////////////////////////////////////////////////////////////////////
    // Внутренние шаги
    ////////////////////////////////////////////////////////////////////////////

    fn trace(
        &self,
        label: &str,
    ) {
        if self.diagnostics {
            self.show_context(label);
        }
    }

    fn ensure_state(
        &self,
        op: &'static str,
        allowed: &[SessionState],
    ) -> WriterResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WriterError::InvalidState {
                op,
                state: self.state,
            })
        }
    }

    /// Проверки и вычисления без побочных эффектов.
    fn plan_open(
        &self,
        header: &FilterbankHeader,
        integration_hint: u64,
        options: &SessionOptions,
    ) -> WriterResult<OpenPlan> {
        self.ensure_state("open", &[SessionState::Uninitialized, SessionState::Closed])?;

        if header.nchans == 0 || header.nifs == 0 {
            return Err(WriterError::UnsupportedConfig(format!(
                "empty integration: nchans={}, nifs={}",
                header.nchans, header.nifs
            )));
        }

        let element = element_type_for(header.nbits)?;
        let tint_size = integration_size_of(header)?;
        let (nifs, nchans) = (header.nifs as u64, header.nchans as u64);

        let mut layout = DatasetLayout {
            name: DATASET_NAME.to_string(),
            element,
            space: Dataspace::new([0, nifs, nchans], [None, Some(nifs), Some(nchans)]),
            chunk: ChunkPlanner::new(options.chunk_target_bytes).plan(header),
            filters: FilterPipeline::default(),
        };

        let expected_bytes = integration_hint.saturating_mul(tint_size as u64);
        let policy = options
            .filter_policy
            .resolve(expected_bytes, layout.chunk_bytes() as u64);
        layout.filters = FilterPipeline::from_policy(policy);

        Ok(OpenPlan {
            layout,
            tint_size,
            policy,
        })
    }

    fn open_store(
        &mut self,
        mut store: S,
        header: &FilterbankHeader,
        plan: OpenPlan,
        options: &SessionOptions,
    ) -> WriterResult<()> {
        let OpenPlan {
            layout,
            tint_size,
            policy,
        } = plan;
        let (element, chunk) = (layout.element, layout.chunk);

        store.set_root_attr("CLASS", FILTERBANK_CLASS.into())?;
        store.set_root_attr("VERSION", FILTERBANK_VERSION.into())?;

        let space = store.create_dataset(layout)?;

        for (name, value) in header_attributes(header) {
            store.set_dataset_attr(name, value)?;
        }
        for (dim, label) in AXIS_LABELS.iter().enumerate() {
            store.label_dimension(dim, label)?;
        }

        self.state = SessionState::Open;
        self.store = Some(store);
        self.dataspace = Some(space);
        self.elem_type = Some(element);
        self.elem_size = element.size();
        self.tint_size = tint_size;
        self.chunk_dims = chunk;
        self.filter_policy = policy;
        self.offset_dims = [0; RANK];
        self.filesz_dims = space.dims;
        self.byte_count = 0;
        self.dump_count = 0;
        self.diagnostics = options.diagnostics;

        info!(
            "Opened session: {} x {} x {}, chunk {:?}, filters {}",
            header.nifs, header.nchans, element, chunk, policy
        );
        self.trace("open");

        Ok(())
    }

    fn write_inner(
        &mut self,
        header: &FilterbankHeader,
        buffer: &[u8],
    ) -> WriterResult<()> {
        self.ensure_state("write", &[SessionState::Open])?;

        let found = integration_size_of(header)?;
        if found != self.tint_size {
            return Err(WriterError::HeaderMismatch {
                expected: self.tint_size,
                found,
            });
        }

        if buffer.is_empty() || buffer.len() % self.tint_size != 0 {
            return Err(WriterError::MalformedBuffer {
                len: buffer.len(),
                integration_size: self.tint_size,
            });
        }

        let count = (buffer.len() / self.tint_size) as u64;
        let start = self.offset_dims[0];
        let dims = [
            start + count,
            self.filesz_dims[1],
            self.filesz_dims[2],
        ];

        let store = self.store.as_mut().ok_or(WriterError::InvalidState {
            op: "write",
            state: self.state,
        })?;

        let space = store.extend(dims)?;
        store.write_slab(&Hyperslab::rows(start, count, &space), buffer)?;

        self.dataspace = Some(space);
        self.offset_dims[0] += count;
        self.filesz_dims = space.dims;
        self.byte_count += buffer.len() as u64;
        self.dump_count += count;

        debug!(
            "Wrote {count} integration(s) at t={start}, extent {}",
            self.filesz_dims[0]
        );
        self.trace("write");

        Ok(())
    }

    fn close_inner(&mut self) -> WriterResult<()> {
        self.ensure_state("close", &[SessionState::Open])?;
        self.trace("close");

        let (bytes, dumps) = (self.byte_count, self.dump_count);
        let store = self.store.take();
        self.reset();

        let Some(mut store) = store else {
            return Ok(());
        };

        let dataset = store.close_dataset();
        let container = store.close();
        dataset.and(container)?;

        info!("Closed session: {dumps} integration(s), {bytes} bytes");

        Ok(())
    }

    /// Обнуляет все поля и переводит сессию в `Closed`.
    fn reset(&mut self) {
        self.state = SessionState::Closed;
        self.store = None;
        self.dataspace = None;
        self.elem_type = None;
        self.elem_size = 0;
        self.tint_size = 0;
        self.chunk_dims = [0; RANK];
        self.filter_policy = FilterPolicy::None;
        self.offset_dims = [0; RANK];
        self.filesz_dims = [0; RANK];
        self.byte_count = 0;
        self.dump_count = 0;
        self.diagnostics = false;
    }
}

impl Session<Hdf5Store> {
    /// Создаёт (перезаписывает) HDF5-контейнер `destination` и открывает
    /// сессию.
    ///
    /// Файл создаётся только после проверки заголовка; если ошибка
    /// возникла позже, частично заполненный файл остаётся на диске.
    pub fn open(
        &mut self,
        header: &FilterbankHeader,
        integration_hint: u64,
        destination: &Path,
        options: SessionOptions,
    ) -> WriterResult<()> {
        self.plan_open(header, integration_hint, &options)
            .and_then(|plan| {
                let store = Hdf5Store::create(destination)?;
                self.open_store(store, header, plan, &options)
            })
            .inspect_err(|e| error!("Session open of {destination:?} failed: {e}"))
    }
}

impl<S: ArrayStore> Default for Session<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ArrayStore> Drop for Session<S> {
    fn drop(&mut self) {
        if self.is_active() {
            warn!("Session dropped while open, closing container");
            if let Err(e) = self.close_inner() {
                warn!("Implicit close failed: {e}");
            }
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

fn element_type_for(nbits: u32) -> WriterResult<ElementType> {
    ElementType::from_nbits(nbits).map_err(|_| WriterError::UnsupportedBitDepth(nbits))
}

/// Размер интеграции по заголовку.
fn integration_size_of(header: &FilterbankHeader) -> WriterResult<usize> {
    header
        .integration_size()
        .map_err(|_| WriterError::UnsupportedBitDepth(header.nbits))
}
