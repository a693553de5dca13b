use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use ndarray::s;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wavenet_core::quantize::{digitize, quantization_levels};
use wavenet_core::{
    Degeneracy, Error, Preprocess, PreprocessConfig, Target, Validation,
};

const SR: u32 = 22050;

/// Write a 16-bit mono WAV at `sample_rate`.
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &x in samples {
        writer
            .write_sample((x * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

fn tone(seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (seconds * sample_rate as f32) as usize;
    (0..len)
        .map(|n| 0.5 * (2.0 * PI * 440.0 * n as f32 / sample_rate as f32).sin())
        .collect()
}

fn tone_file(dir: &Path, name: &str, seconds: f32) -> PathBuf {
    let path = dir.join(name);
    write_wav(&path, &tone(seconds, SR), SR);
    path
}

fn config(target_length: Option<usize>, categorical: Option<usize>) -> PreprocessConfig {
    PreprocessConfig::new(SR, 1024, 256, 80, 60.0, target_length, categorical)
}

#[test]
fn continuous_sample_has_model_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "three_seconds.wav", 3.0);

    let preprocess = Preprocess::new(config(Some(16000), None));
    let sample = preprocess
        .transform(&path, &mut StdRng::seed_from_u64(1))
        .expect("preprocess");

    assert_eq!(sample.input.dim(), (1, 16000, 1));
    assert_eq!(sample.target.dim(), (1, 16000, 1));
    assert_eq!(sample.spectrogram.dim(), (1, 80, 16001 / 256));
    assert!(!sample.is_degenerate());

    let target = sample.target.as_continuous().expect("continuous target");
    assert_eq!(
        sample.input.slice(s![.., 1.., ..]),
        target.slice(s![.., ..-1, ..])
    );
    assert!(sample.input.iter().all(|x| (-1.0..=1.0).contains(x)));
    assert!(target.iter().all(|x| (-1.0..=1.0).contains(x)));
}

#[test]
fn categorical_targets_are_bin_indices() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "three_seconds.wav", 3.0);

    let preprocess = Preprocess::new(config(Some(16000), Some(256)));
    assert_eq!(preprocess.config().output_dim(), 256);
    let sample = preprocess
        .transform(&path, &mut StdRng::seed_from_u64(1))
        .expect("preprocess");

    let target = sample.target.as_categorical().expect("categorical target");
    assert_eq!(target.dim(), sample.input.dim());
    assert!(target.iter().all(|&bin| (0..=256).contains(&bin)));

    let levels = quantization_levels(256);
    for t in 0..100 {
        let next = sample.input[[0, t + 1, 0]];
        assert_eq!(target[[0, t, 0]], digitize(next, &levels) as i64);
    }
}

#[test]
fn short_input_is_zero_padded_at_the_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "short.wav", 0.2);
    let voiced = (0.2 * SR as f32) as usize;

    let continuous = Preprocess::new(config(Some(16000), None))
        .transform(&path, &mut StdRng::seed_from_u64(0))
        .expect("preprocess");
    assert_eq!(continuous.input.dim(), (1, 16000, 1));
    assert!(continuous.input.slice(s![0, voiced.., 0]).iter().all(|&x| x == 0.0));
    let target = continuous.target.as_continuous().expect("continuous target");
    assert!(target.slice(s![0, voiced - 1.., 0]).iter().all(|&x| x == 0.0));
    assert!(target.slice(s![0, ..voiced - 1, 0]).iter().any(|&x| x != 0.0));

    let categorical = Preprocess::new(config(Some(16000), Some(256)))
        .transform(&path, &mut StdRng::seed_from_u64(0))
        .expect("preprocess");
    let zero_bin = digitize(0.0, &quantization_levels(256)) as i64;
    let bins = categorical.target.as_categorical().expect("categorical target");
    assert!(bins.slice(s![0, voiced - 1.., 0]).iter().all(|&b| b == zero_bin));
}

#[test]
fn unconstrained_length_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "one_second.wav", 1.0);

    let preprocess = Preprocess::new(config(None, None));
    let first = preprocess.process(&path).expect("first pass");
    let second = preprocess.process(&path).expect("second pass");

    assert_eq!(first, second);
    assert_eq!(first.input.dim(), (1, SR as usize - 1, 1));
    assert_eq!(first.spectrogram.dim(), (1, 80, 1 + SR as usize / 256));
}

#[test]
fn seeded_crops_repeat_and_differ_across_seeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ramp.wav");
    let ramp: Vec<f32> = (0..SR as usize * 2)
        .map(|n| 0.9 * ((n % 200) as f32 / 100.0 - 1.0))
        .collect();
    write_wav(&path, &ramp, SR);

    let preprocess = Preprocess::new(config(Some(4000), None));
    let a = preprocess.transform(&path, &mut StdRng::seed_from_u64(3)).expect("a");
    let b = preprocess.transform(&path, &mut StdRng::seed_from_u64(3)).expect("b");
    assert_eq!(a, b);

    let crops: Vec<_> = (0..8)
        .map(|seed| {
            preprocess
                .transform(&path, &mut StdRng::seed_from_u64(seed))
                .expect("crop")
                .input
        })
        .collect();
    assert!(crops.iter().any(|c| c != &crops[0]));
}

#[test]
fn resampled_input_matches_configured_rate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("44k.wav");
    write_wav(&path, &tone(1.0, 44100), 44100);

    let sample = Preprocess::new(config(None, None))
        .process(&path)
        .expect("preprocess");
    let len = sample.input.dim().1 + 1;
    assert!(
        (len as i64 - SR as i64).abs() < 1024,
        "expected about {SR} samples, got {len}"
    );
}

#[test]
fn silent_input_is_reported_in_permissive_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("silence.wav");
    write_wav(&path, &vec![0.0; SR as usize], SR);

    let sample = Preprocess::new(config(Some(8000), None))
        .process(&path)
        .expect("permissive preprocess");
    assert_eq!(sample.degeneracies, vec![Degeneracy::Silent]);
    assert!(sample.input.iter().any(|x| !x.is_finite()));
    assert!(matches!(sample.target, Target::Continuous(_)));
}

#[test]
fn silent_input_fails_in_strict_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("silence.wav");
    write_wav(&path, &vec![0.0; SR as usize], SR);

    let strict = config(Some(8000), None).with_validation(Validation::Strict);
    let err = Preprocess::new(strict).process(&path).unwrap_err();
    assert!(matches!(err, Error::Degenerate(Degeneracy::Silent)));
}

#[test]
fn missing_file_is_a_decode_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.wav");

    let err = Preprocess::new(config(Some(16000), None))
        .process(&path)
        .unwrap_err();
    match err {
        Error::Decode { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("expected decode error, got {other}"),
    }
}

#[test]
fn non_audio_file_is_a_decode_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.wav");
    std::fs::write(&path, b"definitely not RIFF data").expect("write file");

    let err = Preprocess::new(config(None, None)).process(&path).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

fn trim_everything(target_length: Option<usize>) -> PreprocessConfig {
    // No frame can sit above 0 dB relative to the loudest one.
    let mut config = config(target_length, Some(256));
    config.top_db = 0.0;
    config
}

#[test]
fn fully_trimmed_input_is_zero_padded_in_permissive_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "one_second.wav", 1.0);

    let sample = Preprocess::new(trim_everything(Some(1000)))
        .process(&path)
        .expect("permissive preprocess");
    assert_eq!(sample.degeneracies, vec![Degeneracy::EmptyAfterTrim]);
    assert_eq!(sample.input.dim(), (1, 1000, 1));
    assert!(sample.input.iter().all(|&x| x == 0.0));
}

#[test]
fn fully_trimmed_input_without_length_has_no_spectrogram() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "one_second.wav", 1.0);

    let err = Preprocess::new(trim_everything(None)).process(&path).unwrap_err();
    assert!(matches!(err, Error::EmptySignal), "{err}");
}

#[test]
fn fully_trimmed_input_fails_in_strict_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = tone_file(dir.path(), "one_second.wav", 1.0);

    let strict = trim_everything(Some(1000)).with_validation(Validation::Strict);
    let err = Preprocess::new(strict).process(&path).unwrap_err();
    assert!(matches!(err, Error::Degenerate(Degeneracy::EmptyAfterTrim)), "{err}");
}

#[test]
fn spectrogram_floor_clamps_quiet_bins_to_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tone_then_silence.wav");
    let mut samples = tone(0.5, SR);
    samples.extend(vec![0.0; SR as usize / 2]);
    samples.extend(tone(0.1, SR));
    write_wav(&path, &samples, SR);

    let floored = config(None, None).with_spectrogram_top_db(Some(80.0));
    assert_eq!(floored.spectrogram_top_db, Some(80.0));
    let sample = Preprocess::new(floored).process(&path).expect("preprocess");

    assert!(sample.spectrogram.iter().all(|&v| v >= 0.0));
    let peak = sample.spectrogram.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert!((peak - 1.0).abs() < 1e-6);

    let unclamped = Preprocess::new(config(None, None)).process(&path).expect("preprocess");
    assert!(unclamped.spectrogram.iter().any(|&v| v < 0.0));
}
