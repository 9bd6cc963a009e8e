//! Trait classifier: positional CSV dataset → multinomial logistic regression
//! → single-sample prediction with a fail-soft "Unknown" fallback.

pub mod dataset;
pub mod logistic;
pub mod model;
pub mod request;

pub use model::TrainedModel;
pub use request::PredictionRequest;
