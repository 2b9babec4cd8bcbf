use std::io;
use thiserror::Error;

use crate::graph::types::Gid;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("gid {0} is claimed by this fragment but cannot be resolved")]
    GidResolution(Gid),
    #[error("transport failure: {0}")]
    Transport(&'static str),
    #[error("thread pool: {0}")]
    ThreadPool(String),
}
