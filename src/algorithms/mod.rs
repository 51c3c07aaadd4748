pub mod ensemble;
pub mod moving_average;
pub mod normalize;
pub mod segments;
pub mod topk;
