/// Errors emitted by clustering, estimation and frame I/O.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error("insufficient data for {stage}: need at least {required}, found {found}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        found: usize,
    },
    #[error("keypoint index {index} out of range for {len} keypoints")]
    InvalidMatchIndex { index: usize, len: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Font(#[from] ab_glyph::InvalidFont),
}

pub type Result<T> = std::result::Result<T, FusionError>;

impl FusionError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, FusionError::InsufficientData { .. })
    }
}
