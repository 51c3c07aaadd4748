pub mod cosine;
pub mod dtw;
pub mod pearson;
