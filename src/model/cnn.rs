//! CNN Model Architectures for Plant Disease Classification
//!
//! Two unrelated networks live here:
//! - [`PlantClassifier`]: the multi-class model served over HTTP. Its weights
//!   are produced elsewhere and loaded from a record file at startup.
//! - [`BinaryLeafClassifier`]: the small sequential network trained by the
//!   `train` command (two conv/pool stages, dense head, sigmoid output).

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{activation, backend::Backend, Tensor},
};

/// Configuration for the served [`PlantClassifier`]
#[derive(Config, Debug)]
pub struct PlantClassifierConfig {
    /// Number of output classes, taken from the class-index file
    pub num_classes: usize,

    /// Dropout rate before the output layer
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Filters of the first convolutional block, doubled per block
    #[config(default = "32")]
    pub base_filters: usize,
}

/// Conv2d, BatchNorm, ReLU, and 2x2 MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
    pub relu: Relu,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Multi-class plant disease classifier
///
/// Architecture:
/// - 4 convolutional blocks (filters base, 2x, 4x, 8x), each halving resolution
/// - Global average pooling, so the input size only has to be divisible by 16
/// - Dense head with dropout
#[derive(Module, Debug)]
pub struct PlantClassifier<B: Backend> {
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,
    pub conv4: ConvBlock<B>,
    pub global_pool: AdaptiveAvgPool2d,
    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc2: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> PlantClassifier<B> {
    pub fn new(config: &PlantClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        Self {
            conv1: ConvBlock::new(config.in_channels, base, device),
            conv2: ConvBlock::new(base, base * 2, device),
            conv3: ConvBlock::new(base * 2, base * 4, device),
            conv4: ConvBlock::new(base * 4, base * 8, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(base * 8, 256).init(device),
            dropout: DropoutConfig::new(config.dropout_rate).init(),
            fc2: LinearConfig::new(256, config.num_classes).init(device),
            num_classes: config.num_classes,
        }
    }

    /// Logits of shape [batch_size, num_classes] for input [batch_size, 3, H, W]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Class probabilities
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        activation::softmax(self.forward(x), 1)
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

/// Configuration for the trained [`BinaryLeafClassifier`]
#[derive(Config, Debug)]
pub struct BinaryLeafClassifierConfig {
    /// Input image size (square)
    #[config(default = "150")]
    pub input_size: usize,

    #[config(default = "32")]
    pub conv1_filters: usize,

    #[config(default = "64")]
    pub conv2_filters: usize,

    #[config(default = "128")]
    pub dense_units: usize,

    #[config(default = "0.5")]
    pub dropout_rate: f64,
}

impl BinaryLeafClassifierConfig {
    /// Spatial size after two (valid 3x3 conv, 2x2 pool) stages
    pub fn feature_map_size(&self) -> usize {
        let after_first = (self.input_size - 2) / 2;
        (after_first - 2) / 2
    }

    /// Length of the flattened feature vector fed to the dense layer
    pub fn flattened_features(&self) -> usize {
        let side = self.feature_map_size();
        self.conv2_filters * side * side
    }
}

/// Sequential binary classifier:
/// conv(32) → pool → conv(64) → pool → flatten → dense(128) → dropout → dense(1)
#[derive(Module, Debug)]
pub struct BinaryLeafClassifier<B: Backend> {
    pub conv1: Conv2d<B>,
    pub pool1: MaxPool2d,
    pub conv2: Conv2d<B>,
    pub pool2: MaxPool2d,
    pub dense: Linear<B>,
    pub dropout: Dropout,
    pub output: Linear<B>,
}

impl<B: Backend> BinaryLeafClassifier<B> {
    pub fn new(config: &BinaryLeafClassifierConfig, device: &B::Device) -> Self {
        Self {
            conv1: Conv2dConfig::new([3, config.conv1_filters], [3, 3]).init(device),
            pool1: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            conv2: Conv2dConfig::new([config.conv1_filters, config.conv2_filters], [3, 3])
                .init(device),
            pool2: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            dense: LinearConfig::new(config.flattened_features(), config.dense_units).init(device),
            dropout: DropoutConfig::new(config.dropout_rate).init(),
            output: LinearConfig::new(config.dense_units, 1).init(device),
        }
    }

    /// Logits of shape [batch_size, 1]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = Relu::new().forward(self.conv1.forward(x));
        let x = self.pool1.forward(x);
        let x = Relu::new().forward(self.conv2.forward(x));
        let x = self.pool2.forward(x);

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = Relu::new().forward(self.dense.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Sigmoid output: probability of class 1
    pub fn forward_probability(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        activation::sigmoid(self.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_plant_classifier_output_shape() {
        let device = Default::default();
        let config = PlantClassifierConfig::new(5).with_base_filters(4);
        let model = PlantClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 160, 160], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 5]);
        assert_eq!(model.num_classes(), 5);
    }

    #[test]
    fn test_plant_classifier_softmax_sums_to_one() {
        let device = Default::default();
        let config = PlantClassifierConfig::new(3).with_base_filters(4);
        let model = PlantClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let probs: Vec<f32> = model.forward_softmax(input).into_data().to_vec().unwrap();

        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_binary_feature_size() {
        let config = BinaryLeafClassifierConfig::new();
        // 150 -> 148 -> 74 -> 72 -> 36
        assert_eq!(config.feature_map_size(), 36);
        assert_eq!(config.flattened_features(), 64 * 36 * 36);
    }

    #[test]
    fn test_binary_classifier_output_shape() {
        let device = Default::default();
        let config = BinaryLeafClassifierConfig::new().with_input_size(30);
        let model = BinaryLeafClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([4, 3, 30, 30], &device);
        assert_eq!(model.forward(input.clone()).dims(), [4, 1]);

        let probs: Vec<f32> = model.forward_probability(input).into_data().to_vec().unwrap();
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
