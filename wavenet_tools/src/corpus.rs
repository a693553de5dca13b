use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Speech corpora with a known on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corpus {
    /// `<root>/wavs/*.wav` plus `<root>/metadata.csv`
    LjSpeech,
    /// `<root>/wav48/*/*.wav` plus `<root>/txt/*/*.txt`
    Vctk,
}

impl Corpus {
    /// Sorted audio files of this corpus under `root`.
    pub fn audio_paths<P: AsRef<Path>>(&self, root: P) -> Vec<PathBuf> {
        match self {
            Corpus::LjSpeech => ljspeech_paths(root).wavs,
            Corpus::Vctk => vctk_paths(root).wavs,
        }
    }
}

impl std::str::FromStr for Corpus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ljspeech" => Ok(Corpus::LjSpeech),
            "vctk" => Ok(Corpus::Vctk),
            other => Err(anyhow::anyhow!("unknown corpus: {other} (expected ljspeech or vctk)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LjSpeechPaths {
    pub wavs: Vec<PathBuf>,
    /// Always `<root>/metadata.csv`, whether or not it exists
    pub metadata: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VctkPaths {
    pub wavs: Vec<PathBuf>,
    pub transcripts: Vec<PathBuf>,
}

/// Enumerate an LJSpeech checkout. File contents are not read.
pub fn ljspeech_paths<P: AsRef<Path>>(root: P) -> LjSpeechPaths {
    let root = root.as_ref();
    LjSpeechPaths {
        wavs: files_at_depth(&root.join("wavs"), 1, "wav"),
        metadata: root.join("metadata.csv"),
    }
}

/// Enumerate a VCTK checkout, one sub-directory per speaker.
pub fn vctk_paths<P: AsRef<Path>>(root: P) -> VctkPaths {
    let root = root.as_ref();
    VctkPaths {
        wavs: files_at_depth(&root.join("wav48"), 2, "wav"),
        transcripts: files_at_depth(&root.join("txt"), 2, "txt"),
    }
}

/// Files exactly `depth` levels below `dir` with extension `ext`, sorted by
/// their path string. Symlinked files and directories are followed but
/// listed under their link path. A missing `dir` yields nothing.
fn files_at_depth(dir: &Path, depth: usize, ext: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "corpus directory not found");
        return Vec::new();
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(depth)
        .max_depth(depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|e| e == ext))
        .collect();

    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    tracing::debug!(dir = %dir.display(), count = paths.len(), "enumerated corpus files");
    paths
}
