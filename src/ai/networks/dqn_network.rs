use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Q-value network for a square board with `fields = size * size` cells.
///
/// ```text
/// Input:  [batch, 2 * fields]   (own plane, opponent plane)
/// FC1:    2 * fields -> hidden, ReLU
/// FC2:    hidden -> hidden / 2, ReLU
/// FC3:    hidden / 2 -> hidden / 2, ReLU
/// Out:    hidden / 2 -> fields  (Q-values, one per field)
/// ```
#[derive(Module, Debug)]
pub struct DqnNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    out: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct DqnNetworkConfig {
    pub fields: usize,
    #[config(default = 256)]
    pub hidden_size: usize,
}

impl DqnNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DqnNetwork<B> {
        let half = (self.hidden_size / 2).max(1);
        DqnNetwork {
            fc1: LinearConfig::new(2 * self.fields, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, half).init(device),
            fc3: LinearConfig::new(half, half).init(device),
            out: LinearConfig::new(half, self.fields).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> DqnNetwork<B> {
    /// Forward pass: input [batch, 2 * fields] -> output [batch, fields] Q-values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        let x = self.relu.forward(self.fc3.forward(x));
        self.out.forward(x)
    }
}
