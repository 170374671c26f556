use hydro_graph::GraphError;
use hydro_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// A derived value could not be computed.
    #[error("chart computation failed: {0}")]
    Graph(#[from] GraphError),

    #[error("invalid chart input: {0}")]
    Model(#[from] ModelError),

    #[error("invalid time window: {0}")]
    Window(#[from] anyhow::Error),

    #[error("invalid chart configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChartError>;
