//! Clients for the third-party APIs behind the edge functions.

mod client;
pub mod dexscreener;
pub mod price;
pub mod solana_rpc;
pub mod supabase;
pub mod twitter;

pub use client::build_http_client;
pub use dexscreener::{DexscreenerClient, PairToken, TokenPair};
pub use price::{PriceClient, SolPrice};
pub use solana_rpc::SolanaRpcClient;
pub use supabase::{AgentView, LaunchpadStore, MemoryStore, PostgrestStore, VanityCounts};
pub use twitter::{SocialPost, TwitterClient};
