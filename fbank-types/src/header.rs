use crate::{ElementType, FbankResult};

/// Заголовок наблюдения (поля filterbank/SIGPROC).
///
/// Заполняется вызывающей стороной один раз на сессию.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterbankHeader {
    /// Идентификатор телескопа (6 = GBT)
    pub telescope_id: i32,
    /// Идентификатор бэкенда
    pub machine_id: i32,
    /// Тип данных (1 = filterbank)
    pub data_type: i32,
    /// Имя исходного raw-файла
    pub rawdatafile: String,
    /// Имя источника
    pub source_name: String,
    /// Азимут на начало наблюдения, градусы
    pub az_start: f64,
    /// Зенитное расстояние на начало наблюдения, градусы
    pub za_start: f64,
    /// Прямое восхождение источника (hhmmss.s)
    pub src_raj: f64,
    /// Склонение источника (ddmmss.s)
    pub src_dej: f64,
    /// Время первого отсчёта, MJD
    pub tstart: f64,
    /// Время интеграции, секунды
    pub tsamp: f64,
    /// Разрядность отсчёта
    pub nbits: u32,
    /// Частота первого канала, МГц
    pub fch1: f64,
    /// Ширина канала, МГц (может быть отрицательной)
    pub foff: f64,
    /// Число частотных каналов
    pub nchans: u32,
    /// Число тонких каналов на грубый канал
    pub nfpc: u32,
    /// Число IF (поляризаций / фидов)
    pub nifs: u32,
    /// Номер луча
    pub ibeam: i32,
    /// Число лучей
    pub nbeams: i32,
}

impl FilterbankHeader {
    /// Эталонный заголовок: наблюдение Voyager 1 на GBT.
    pub fn voyager1() -> Self {
        FilterbankHeader {
            telescope_id: 6,
            machine_id: 42,
            data_type: 1,
            rawdatafile: "guppi_57650_67573_Voyager1_0002.0000.raw".to_string(),
            source_name: "Voyager1".to_string(),
            az_start: 0.0,
            za_start: 0.0,
            src_raj: 171003.984,
            src_dej: 121058.8,
            tstart: 57650.78209490741,
            tsamp: 18.253611008,
            nbits: 32,
            fch1: 8421.386717353016,
            foff: -2.7939677238464355e-06,
            nchans: 65536,
            nfpc: 1,
            nifs: 1,
            ibeam: 1,
            nbeams: 1,
        }
    }

    /// Тип элемента по `nbits`.
    pub fn element_type(&self) -> FbankResult<ElementType> {
        ElementType::from_nbits(self.nbits)
    }

    /// Размер одной интеграции в байтах: `nifs × nchans × elem_size`.
    pub fn integration_size(&self) -> FbankResult<usize> {
        let elem = self.element_type()?;

        Ok(self.nifs as usize * self.nchans as usize * elem.size())
    }
}
