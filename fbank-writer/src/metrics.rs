use std::time::Instant;

/// Итог сессии записи для вывода в конце работы.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub duration_secs: f64,
    pub integrations: u64,
    pub bytes_written: u64,
    pub file_bytes: u64,
    pub write_speed_mbps: f64,
    pub compression_ratio: f64,
}

impl WriteSummary {
    /// Сводка по счётчикам сессии и размеру итогового файла.
    pub fn new(
        started: &Instant,
        integrations: u64,
        bytes_written: u64,
        file_bytes: u64,
    ) -> Self {
        let secs = started.elapsed().as_secs_f64();

        let write_speed_mbps = if secs < 1e-9 {
            0.0
        } else {
            bytes_written as f64 / secs / 1_000_000.0
        };

        let compression_ratio = if file_bytes == 0 {
            0.0
        } else {
            bytes_written as f64 / file_bytes as f64
        };

        Self {
            duration_secs: secs,
            integrations,
            bytes_written,
            file_bytes,
            write_speed_mbps,
            compression_ratio,
        }
    }
}

impl std::fmt::Display for WriteSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━ Session Summary ━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.3} s", self.duration_secs)?;
        writeln!(f, "  Integrations  : {}", self.integrations)?;
        writeln!(
            f,
            "  Data written  : {:.2} MB",
            self.bytes_written as f64 / 1_000_000.0
        )?;
        writeln!(
            f,
            "  File size     : {:.2} MB",
            self.file_bytes as f64 / 1_000_000.0
        )?;
        writeln!(f, "  Write speed   : {:.1} MB/s", self.write_speed_mbps)?;
        write!(f, "  Ratio         : {:.2}x", self.compression_ratio)
    }
}
