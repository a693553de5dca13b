//! Conversion of samples into burn tensors for the model

use burn::tensor::{Int, Tensor, TensorData, backend::Backend};
use ndarray::Array3;

use crate::preprocess::{Sample, Target};

/// Target tensor matching the configured output mode.
#[derive(Debug, Clone)]
pub enum TargetTensor<B: Backend> {
    Continuous(Tensor<B, 3>),
    Categorical(Tensor<B, 3, Int>),
}

impl Sample {
    /// Move the sample onto `device`, keeping the (1, N-1, 1) waveform and
    /// (1, n_mels, frames) spectrogram layouts.
    pub fn into_tensors<B: Backend>(
        self,
        device: &B::Device,
    ) -> (Tensor<B, 3>, Tensor<B, 3>, TargetTensor<B>) {
        let (input, spectrogram, target) = self.into_parts();
        let target = match target {
            Target::Continuous(t) => TargetTensor::Continuous(Tensor::from_data(to_data(t), device)),
            Target::Categorical(t) => {
                TargetTensor::Categorical(Tensor::from_data(to_data(t), device))
            }
        };
        (
            Tensor::from_data(to_data(input), device),
            Tensor::from_data(to_data(spectrogram), device),
            target,
        )
    }
}

fn to_data<E: burn::tensor::Element>(array: Array3<E>) -> TensorData {
    let shape = array.shape().to_vec();
    let values: Vec<E> = array.iter().cloned().collect();
    TensorData::new(values, shape)
}
