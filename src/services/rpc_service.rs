use serde_json::Value;

use crate::config::Secrets;
use crate::config::secrets::names;
use crate::error::AppResult;
use crate::external::SolanaRpcClient;

/// Forwards JSON-RPC calls to the configured Solana node.
#[derive(Clone)]
pub struct RpcService {
    client: SolanaRpcClient,
    secrets: Secrets,
}

impl RpcService {
    pub fn new(client: SolanaRpcClient, secrets: Secrets) -> Self {
        Self { client, secrets }
    }

    pub async fn call(&self, method: &str, params: &Value) -> AppResult<Value> {
        let rpc_url = self.secrets.require(names::HELIUS_RPC_URL)?;
        tracing::debug!(method, "forwarding rpc call");
        self.client.call(&rpc_url, method, params).await
    }
}
