use thiserror::Error;

/// Failures while bringing up a test container.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("testcontainers: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis client: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{service} still not answering after {attempts} probes")]
    NotReady { service: &'static str, attempts: u32 },
}

pub type Result<T, E = TestInfraError> = std::result::Result<T, E>;
