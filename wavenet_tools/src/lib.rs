//! Dataset path discovery for the LJSpeech and VCTK speech corpora.

pub mod corpus;

pub use corpus::{Corpus, LjSpeechPaths, VctkPaths, ljspeech_paths, vctk_paths};
