use net_state_api::BusError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("dispatch: {0}")]
    Dispatch(#[from] BusError),
}
