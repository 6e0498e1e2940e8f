use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("harvester error: {0}")]
    Harvester(#[from] regwatch_harvester::HarvesterError),

    #[error("blob storage error: {0}")]
    Blob(#[from] std::io::Error),

    #[error("job not found: {0}")]
    JobNotFound(uuid::Uuid),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
