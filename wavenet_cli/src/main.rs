use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ndarray::Axis;
use std::path::{Path, PathBuf};
use wavenet_core::{OutputMode, Preprocess, PreprocessConfig, Target, Validation};
use wavenet_tools::{Corpus, ljspeech_paths, vctk_paths};

#[derive(Parser)]
#[command(name = "wavenet")]
#[command(about = "Preprocessing tools for autoregressive waveform models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess one audio file and print shape and value statistics
    Inspect {
        path: PathBuf,
        /// JSON preprocessing config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        n_fft: Option<usize>,
        #[arg(long)]
        hop_length: Option<usize>,
        #[arg(long)]
        n_mels: Option<usize>,
        #[arg(long)]
        top_db: Option<f32>,
        /// Model input length in samples
        #[arg(long, conflicts_with = "full_length")]
        length: Option<usize>,
        /// Keep the whole trimmed clip instead of padding or cropping
        #[arg(long)]
        full_length: bool,
        /// Number of amplitude bins for categorical targets
        #[arg(long)]
        categorical: Option<usize>,
        /// Seed for the crop offset
        #[arg(long)]
        seed: Option<u64>,
        /// Clamp spectrogram bins to at most this many dB below the peak
        #[arg(long)]
        spectrogram_top_db: Option<f32>,
        /// Fail on silent or truncated input instead of warning
        #[arg(long)]
        strict: bool,
    },
    /// List the audio and transcript paths of a corpus checkout
    List {
        corpus: Corpus,
        root: PathBuf,
        /// Emit one JSON document instead of plain lines
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect {
            path,
            config,
            sample_rate,
            n_fft,
            hop_length,
            n_mels,
            top_db,
            length,
            full_length,
            categorical,
            seed,
            spectrogram_top_db,
            strict,
        } => {
            let mut config = match config {
                Some(file) => PreprocessConfig::from_json_file(&file)
                    .with_context(|| format!("failed to load config: {}", file.display()))?,
                None => PreprocessConfig::default(),
            };
            if let Some(v) = sample_rate {
                config.sample_rate = v;
            }
            if let Some(v) = n_fft {
                config.n_fft = v;
            }
            if let Some(v) = hop_length {
                config.hop_length = v;
            }
            if let Some(v) = n_mels {
                config.n_mels = v;
            }
            if let Some(v) = top_db {
                config.top_db = v;
            }
            if full_length {
                config.target_length = None;
            } else if length.is_some() {
                config.target_length = length;
            }
            if categorical.is_some() {
                config.output_mode = OutputMode::from_categorical_dim(categorical);
            }
            if spectrogram_top_db.is_some() {
                config = config.with_spectrogram_top_db(spectrogram_top_db);
            }
            if strict {
                config.validation = Validation::Strict;
            }

            inspect(&path, config, seed)
        }
        Commands::List { corpus, root, json } => list(corpus, &root, json),
    }
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("wavenet_core=info,wavenet_tools=info,wavenet=info"))
        .context("failed to parse tracing filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

fn inspect(path: &Path, config: PreprocessConfig, seed: Option<u64>) -> Result<()> {
    tracing::info!(path = %path.display(), ?config, "preprocessing");

    let preprocess = Preprocess::new(config);
    let sample = match seed {
        Some(seed) => preprocess.transform(path, &mut StdRng::seed_from_u64(seed)),
        None => preprocess.process(path),
    }
    .with_context(|| format!("failed to preprocess {}", path.display()))?;

    let spec = &sample.spectrogram;
    let min = spec.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = spec.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let nan_count = spec.iter().filter(|x| x.is_nan()).count();

    println!("input shape: {:?}", sample.input.dim());
    println!("spectrogram shape: {:?}", spec.dim());
    println!("mel stats: min={min}, max={max}, nan_count={nan_count}");

    let mel = spec.index_axis(Axis(0), 0);
    for t in [0, 10].into_iter().filter(|&t| t < mel.ncols()) {
        println!("frame {t}: {:?}", mel.column(t).to_vec());
    }

    match &sample.target {
        Target::Continuous(t) => {
            let finite = t.iter().filter(|x| x.is_finite()).count();
            println!("target: continuous {:?}, finite={finite}", t.dim());
        }
        Target::Categorical(t) => {
            let lo = t.iter().copied().min().unwrap_or(0);
            let hi = t.iter().copied().max().unwrap_or(0);
            println!("target: categorical {:?}, bins used {lo}..={hi}", t.dim());
        }
    }

    for degeneracy in &sample.degeneracies {
        println!("degenerate: {degeneracy}");
    }
    Ok(())
}

fn list(corpus: Corpus, root: &Path, json: bool) -> Result<()> {
    match corpus {
        Corpus::LjSpeech => {
            let paths = ljspeech_paths(root);
            if json {
                serde_json::to_writer_pretty(std::io::stdout().lock(), &paths)?;
                println!();
                return Ok(());
            }
            for wav in &paths.wavs {
                println!("{}", wav.display());
            }
            println!("metadata: {}", paths.metadata.display());
            tracing::info!(wavs = paths.wavs.len(), "listed LJSpeech");
        }
        Corpus::Vctk => {
            let paths = vctk_paths(root);
            if json {
                serde_json::to_writer_pretty(std::io::stdout().lock(), &paths)?;
                println!();
                return Ok(());
            }
            for wav in &paths.wavs {
                println!("{}", wav.display());
            }
            for txt in &paths.transcripts {
                println!("transcript: {}", txt.display());
            }
            tracing::info!(
                wavs = paths.wavs.len(),
                transcripts = paths.transcripts.len(),
                "listed VCTK"
            );
        }
    }
    Ok(())
}
