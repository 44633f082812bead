use uuid::Uuid;

/// Stage at which a generation run stopped. The display text is what callers
/// show to the user.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("image {0} was not found for this user")]
    ImageNotFound(Uuid),

    #[error("could not load the image record: {0:#}")]
    Lookup(anyhow::Error),

    #[error("could not read the source image: {0:#}")]
    Normalize(anyhow::Error),

    #[error("image analysis failed: {0:#}")]
    Describe(anyhow::Error),

    #[error("tattoo generation failed: {0:#}")]
    Generate(anyhow::Error),

    #[error("could not save the generated tattoo: {0:#}")]
    Materialize(anyhow::Error),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::ImageNotFound(_) | PipelineError::Lookup(_) => "lookup",
            PipelineError::Normalize(_) => "normalize",
            PipelineError::Describe(_) => "describe",
            PipelineError::Generate(_) => "generate",
            PipelineError::Materialize(_) => "materialize",
        }
    }
}
