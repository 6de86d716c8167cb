use serde::{Deserialize, Serialize};

use super::transaction::SignedTxnInBlock;

/// Network identity reported by the block source at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub id: String,
    pub network: String,
    pub proto: String,
    /// Base32/base64 digest identifying the network; used to guard a data
    /// directory against being reused for a different network.
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(rename = "rnd", default)]
    pub round: u64,
    #[serde(rename = "prev", default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(rename = "seed", default, skip_serializing_if = "String::is_empty")]
    pub seed: String,
    #[serde(rename = "ts", default)]
    pub timestamp: i64,
    #[serde(rename = "gen", default, skip_serializing_if = "String::is_empty")]
    pub genesis_id: String,
    #[serde(rename = "gh", default, skip_serializing_if = "String::is_empty")]
    pub genesis_hash: String,
    #[serde(rename = "tc", default)]
    pub txn_counter: u64,
    #[serde(rename = "proto", default, skip_serializing_if = "String::is_empty")]
    pub current_protocol: String,
}

/// Agreement certificate for the block. Carried through the pipeline untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "rnd", default)]
    pub round: u64,
    #[serde(rename = "per", default)]
    pub period: u64,
    #[serde(rename = "step", default)]
    pub step: u64,
    #[serde(rename = "prop", default, skip_serializing_if = "String::is_empty")]
    pub proposal: String,
    #[serde(rename = "vote", default, skip_serializing_if = "Vec::is_empty")]
    pub votes: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDelta {
    pub address: String,
    #[serde(default)]
    pub micro_algos: u64,
    #[serde(default)]
    pub status: String,
}

/// Ledger state changes applied by a round. Only fetched in follower mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(default)]
    pub accounts: Vec<AccountDelta>,
    #[serde(default)]
    pub modified_apps: Vec<u64>,
    #[serde(default)]
    pub modified_assets: Vec<u64>,
    #[serde(default)]
    pub prev_timestamp: i64,
    #[serde(default)]
    pub total_micro_algos: u64,
}

/// Everything the pipeline knows about one round.
///
/// Owned by exactly one stage at a time: the importer creates it, each
/// processor takes it by value and hands it back, the exporter borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    #[serde(rename = "block")]
    pub header: BlockHeader,
    #[serde(default)]
    pub payset: Vec<SignedTxnInBlock>,
    #[serde(rename = "cert", default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<StateDelta>,
}

impl BlockData {
    pub fn round(&self) -> u64 {
        self.header.round
    }

    /// Empty block for `round`.
    pub fn empty(round: u64) -> Self {
        Self {
            header: BlockHeader {
                round,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_json_shape() {
        let raw = r#"{
            "block": {"rnd": 42, "ts": 1700000000, "gen": "testnet-v1.0", "tc": 9},
            "payset": [{"txn": {"type": "pay", "snd": "A"}}],
            "cert": {"rnd": 42, "step": 2}
        }"#;
        let block: BlockData = serde_json::from_str(raw).unwrap();

        assert_eq!(block.round(), 42);
        assert_eq!(block.header.genesis_id, "testnet-v1.0");
        assert_eq!(block.payset.len(), 1);
        assert_eq!(block.certificate.as_ref().map(|c| c.step), Some(2));
        assert!(block.delta.is_none());
    }
}
