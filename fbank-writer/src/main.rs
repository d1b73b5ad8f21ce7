use std::{path::PathBuf, time::Instant};

use clap::Parser;
use fbank_types::{FilterPolicy, FilterbankHeader};
use fbank_writer::{parse_size_bytes, Session, SessionOptions, SimulatedSpectrometer, WriteSummary};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "fbank-simon",
    version = env!("CARGO_PKG_VERSION"),
    about = "Write a simulated Voyager 1 filterbank observation to an HDF5 filterbank file",
    long_about = None,
)]
struct Cli {
    /// Путь к выходному файлу
    #[arg(short, long, default_value = "voyager1.h5")]
    output: PathBuf,
    /// Число частотных каналов
    #[arg(long, default_value = "65536")]
    nchans: u32,
    /// Число IF (поляризаций)
    #[arg(long, default_value = "1")]
    nifs: u32,
    /// Разрядность отсчёта: 1, 2, 4, 8, 16, 32, 64
    #[arg(long, default_value = "32")]
    nbits: u32,
    /// Число интеграций
    #[arg(short = 'n', long, default_value = "16")]
    ntints: u64,
    /// Интеграций в одном вызове записи
    #[arg(long, default_value = "1")]
    per_write: u64,
    /// Сжатие: none, lz4, bitshuffle, auto
    #[arg(long, default_value = "bitshuffle")]
    filter: String,
    /// Целевой размер чанка (1MiB, 256KiB, 65536)
    #[arg(long, default_value = "1MiB")]
    chunk_target: String,
    /// Seed генератора синтетических спектров
    #[arg(long, default_value = "1")]
    seed: u64,
    /// Подробные дампы состояния сессии
    #[arg(short, long)]
    diagnostics: bool,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = match (cli.quiet, cli.diagnostics) {
        (true, _) => log::LevelFilter::Error,
        (false, true) => log::LevelFilter::Debug,
        (false, false) => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let filter_policy: FilterPolicy = match cli.filter.parse() {
        Ok(p) => p,
        Err(e) => {
            error!("--filter: {e}");
            std::process::exit(1);
        }
    };

    let chunk_target_bytes = match parse_size_bytes(&cli.chunk_target) {
        Ok(n) => n,
        Err(e) => {
            error!("--chunk-target: {e}");
            std::process::exit(1);
        }
    };

    if cli.per_write == 0 {
        error!("--per-write must be at least 1");
        std::process::exit(1);
    }

    let header = FilterbankHeader {
        nchans: cli.nchans,
        nifs: cli.nifs,
        nbits: cli.nbits,
        ..FilterbankHeader::voyager1()
    };

    let mut spectrometer = match SimulatedSpectrometer::new(&header, cli.seed) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let options = SessionOptions::default()
        .with_diagnostics(cli.diagnostics)
        .with_filter_policy(filter_policy)
        .with_chunk_target(chunk_target_bytes);

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Source        : {}", header.source_name);
    info!("  Channels      : {} x {} IF", header.nchans, header.nifs);
    info!("  Bit depth     : {}", header.nbits);
    info!("  fch1 / foff   : {} MHz / {} MHz", header.fch1, header.foff);
    info!("  Integrations  : {} ({} per write)", cli.ntints, cli.per_write);
    info!("  Filters       : {filter_policy}");
    info!("  Output        : {:?}", cli.output);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let started = Instant::now();
    let mut session: Session = Session::new();

    if let Err(e) = session.open(&header, cli.ntints, &cli.output, options) {
        error!("Failed to open {:?}: {e}", cli.output);
        std::process::exit(1);
    }

    let mut remaining = cli.ntints;
    while remaining > 0 {
        let count = remaining.min(cli.per_write);
        let buffer = spectrometer.next_integrations(count as usize);

        if let Err(e) = session.write(&header, &buffer) {
            error!("Write failed after {} integrations: {e}", session.dump_count());
            std::process::exit(1);
        }
        remaining -= count;
    }

    let (integrations, bytes) = (session.dump_count(), session.byte_count());

    if let Err(e) = session.close() {
        error!("Failed to close {:?}: {e}", cli.output);
        std::process::exit(1);
    }

    let file_bytes = std::fs::metadata(&cli.output)
        .map(|m| m.len())
        .unwrap_or(0);
    let summary = WriteSummary::new(&started, integrations, bytes, file_bytes);
    info!("\n{summary}");
    info!("✓ Observation written: {:?}", cli.output);
}
