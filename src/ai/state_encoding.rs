use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{Board, Side};

/// Encode a board as a tensor of shape [1, 2 * fields], relative to `side`.
///
/// Plane 0: `side`'s stones (1.0 where placed)
/// Plane 1: opponent's stones (1.0 where placed)
pub fn encode_state<B: Backend>(board: &Board, side: Side, device: &B::Device) -> Tensor<B, 2> {
    encode_states_batch(std::slice::from_ref(board), side, device)
}

/// Encode multiple boards of the same size as a tensor of shape
/// [batch, 2 * fields].
pub fn encode_states_batch<B: Backend>(
    boards: &[Board],
    side: Side,
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch_size = boards.len();
    let width = boards.first().map_or(0, |b| 2 * b.cells().len());
    let mut flat = Vec::with_capacity(batch_size * width);
    for board in boards {
        flat.extend(encode_state_flat(board, side));
    }
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([batch_size as i32, width as i32])
}

/// Produce the flat [2 * fields] f32 vector for a single board.
pub fn encode_state_flat(board: &Board, side: Side) -> Vec<f32> {
    let cells = board.cells();
    let fields = cells.len();
    let own = side.mark();
    let opponent = side.other().mark();

    let mut data = vec![0.0f32; 2 * fields];
    for (idx, &cell) in cells.iter().enumerate() {
        if cell == own {
            data[idx] = 1.0;
        } else if cell == opponent {
            data[fields + idx] = 1.0;
        }
    }
    data
}
