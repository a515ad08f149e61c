//! The Astrometers engine: a pure pipeline from (natal chart, transit
//! chart, date, meter configs, calibration table) to a panel of
//! normalized meter readings.

pub mod aggregate;
pub mod detector;
pub mod error;
pub mod evaluator;
pub mod normalize;
pub mod reading;
pub mod scoring;

pub use aggregate::{group_scores, reading_trend, scalar_trend, unified_score, TrendKind};
pub use detector::{detect_aspects, ActiveAspect};
pub use error::MetersError;
pub use evaluator::{
    evaluate_all, evaluate_meter, top_contributions, AspectContribution, RawEvaluation,
};
pub use normalize::normalize;
pub use reading::{compute_all_meters, compute_meter, compute_trends, TOP_ASPECT_COUNT};
pub use scoring::{clamp_sensitivity, weightage};
