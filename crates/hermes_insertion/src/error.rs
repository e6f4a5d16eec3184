use thiserror::Error;

use crate::problem::job::JobIdx;

#[derive(Error, Debug)]
pub enum InsertionError {
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),
    #[error("route level insertion cannot be used with shipments")]
    RouteLevelWithShipments,
    #[error("cannot apply a missing insertion for job {0}")]
    InvalidInsertion(JobIdx),
    #[error("unsupported job {job}: {reason}")]
    UnsupportedJob { job: JobIdx, reason: &'static str },
    #[error("insertion worker failed: {0}")]
    WorkerFailed(String),
    #[error("insertion cancelled")]
    Cancelled,
    #[error("invalid insertion params: {0}")]
    InvalidParams(#[from] serde_json::Error),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
