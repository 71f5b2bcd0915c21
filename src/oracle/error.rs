use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    #[error("RPC call failed: {0}")]
    Rpc(#[from] bitcoincore_rpc::Error),

    #[error("RPC task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
