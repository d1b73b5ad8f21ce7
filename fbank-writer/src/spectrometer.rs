use fbank_types::{ElementType, FilterbankHeader};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{WriterError, WriterResult};

/// Синтетический спектрометр: полоса пропускания, шум и дрейфующая
/// несущая (как у сигнала Voyager 1).
pub struct SimulatedSpectrometer {
    nifs: usize,
    nchans: usize,
    nbits: u32,
    element: ElementType,
    integration_size: usize,
    /// Канал несущей на первой интеграции
    pub tone_channel: f64,
    /// Дрейф несущей, каналов на интеграцию
    pub drift_per_tint: f64,
    tint: u64,
    rng: StdRng,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedSpectrometer {
    pub fn new(
        header: &FilterbankHeader,
        seed: u64,
    ) -> WriterResult<Self> {
        let unsupported = |_| WriterError::UnsupportedBitDepth(header.nbits);
        let element = ElementType::from_nbits(header.nbits).map_err(unsupported)?;
        let integration_size = header.integration_size().map_err(unsupported)?;

        Ok(Self {
            nifs: header.nifs as usize,
            nchans: header.nchans as usize,
            nbits: header.nbits,
            element,
            integration_size,
            tone_channel: header.nchans as f64 / 3.0,
            drift_per_tint: 0.5,
            tint: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Размер одной интеграции в байтах.
    pub fn integration_size(&self) -> usize {
        self.integration_size
    }

    /// Генерирует `count` интеграций подряд (время, IF, частота).
    pub fn next_integrations(
        &mut self,
        count: usize,
    ) -> Vec<u8> {
        let mut data = Vec::with_capacity(count * self.integration_size());

        for _ in 0..count {
            let tone = self.tone_channel + self.drift_per_tint * self.tint as f64;

            for _ in 0..self.nifs {
                for f in 0..self.nchans {
                    let x = f as f64 / self.nchans.max(1) as f64;
                    let bandpass = 0.6 + 0.4 * (std::f64::consts::PI * x).sin();
                    let carrier = if (f as f64 - tone).abs() < 0.5 { 4.0 } else { 0.0 };
                    let noise: f64 = self.rng.gen_range(-0.05..0.05);

                    self.push_sample(&mut data, bandpass + carrier + noise);
                }
            }

            self.tint += 1;
        }

        data
    }

    /// Кладёт отсчёт (в условных единицах ~[0, 5]) в формате элемента.
    fn push_sample(
        &self,
        data: &mut Vec<u8>,
        power: f64,
    ) {
        match self.element {
            ElementType::U8 => {
                let max = ((1u32 << self.nbits.min(8)) - 1) as f64;
                let v = (power / 5.0 * max).clamp(0.0, max) as u8;
                data.push(v);
            }
            ElementType::U16 => {
                let v = (power / 5.0 * u16::MAX as f64).clamp(0.0, u16::MAX as f64) as u16;
                data.extend_from_slice(&v.to_le_bytes());
            }
            ElementType::F32 => data.extend_from_slice(&((power * 1e6) as f32).to_le_bytes()),
            ElementType::F64 => data.extend_from_slice(&(power * 1e6).to_le_bytes()),
        }
    }
}
