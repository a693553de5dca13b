use anyhow::{anyhow, Context, Result};
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Decode an audio file to mono f32 samples at `sample_rate` Hz.
///
/// Channels are averaged; the clip is resampled only when the file's own
/// rate differs from `sample_rate`.
pub fn decode_to_f32_mono<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let (interleaved, sr_in, ch_in) = decode_interleaved(path)?;

    tracing::debug!(
        path = %path.display(),
        sample_rate = sr_in,
        channels = ch_in,
        samples = interleaved.len(),
        "decoded audio"
    );

    let mono = downmix(interleaved, ch_in);

    if sr_in == sample_rate {
        return Ok(mono);
    }
    resample_mono(&mono, sr_in as usize, sample_rate as usize)
}

/// Run the first decodable track of `path` through Symphonia.
///
/// Returns interleaved samples, the input sample rate and the channel count.
fn decode_interleaved(path: &Path) -> Result<(Vec<f32>, u32, usize)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("unsupported format or unreadable container")?;

    let mut format = detected.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("no supported audio tracks found"))?;

    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create decoder for selected track")?;

    let mut interleaved: Vec<f32> = Vec::new();

    // Codec params usually know the rate; the first decoded buffer is the fallback.
    let mut input_sample_rate: Option<u32> = track.codec_params.sample_rate;
    let mut input_channels: Option<usize> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!("decoder reset required (chained streams)"));
            }
            Err(SymphoniaError::IoError(_)) => break, // end of stream
            Err(e) => return Err(e).context("error reading next packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::IoError(_)) => continue,
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::warn!(path = %path.display(), "skipping corrupt packet: {msg}");
                continue;
            }
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!("decoder reset required mid-stream"));
            }
            Err(e) => return Err(e).context("unrecoverable decode error"),
        };

        input_sample_rate.get_or_insert(decoded.spec().rate);
        input_channels.get_or_insert(decoded.spec().channels.count());

        let mut sbuf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sbuf.copy_interleaved_ref(decoded);

        interleaved.extend_from_slice(sbuf.samples());
    }

    let sr_in = input_sample_rate.ok_or_else(|| anyhow!("could not determine input sample rate"))?;
    let ch_in = input_channels.ok_or_else(|| anyhow!("could not determine channel count"))?;

    if interleaved.is_empty() {
        return Err(anyhow!("decoded audio was empty"));
    }

    Ok((interleaved, sr_in, ch_in))
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample a whole mono clip with rubato's synchronous FFT resampler.
fn resample_mono(mono: &[f32], sr_in: usize, sr_out: usize) -> Result<Vec<f32>> {
    let chunk_size: usize = 1024;
    let sub_chunks: usize = 1;

    let mut resampler = Fft::<f32>::new(sr_in, sr_out, chunk_size, sub_chunks, 1, FixedSync::Input)
        .context("failed to construct FFT resampler")?;

    let input_len_frames = mono.len();
    let out_len_frames = resampler.process_all_needed_output_len(input_len_frames);

    let mut out = vec![0.0f32; out_len_frames];

    let input_adapter =
        InterleavedSlice::new(mono, 1, input_len_frames).context("bad input adapter")?;
    let mut output_adapter =
        InterleavedSlice::new_mut(&mut out, 1, out_len_frames).context("bad output adapter")?;

    let (_frames_read, frames_written) = resampler.process_all_into_buffer(
        &input_adapter,
        &mut output_adapter,
        input_len_frames,
        None,
    )?;

    out.truncate(frames_written);
    tracing::debug!(sr_in, sr_out, samples = out.len(), "resampled audio");
    Ok(out)
}
