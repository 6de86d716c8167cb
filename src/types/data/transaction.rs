//! Signed transaction schema carried in a block's payset.
//!
//! Field names on the wire follow the ledger's short codec tags (`snd`, `rcv`,
//! `amt`, ...). Zero values and empty strings are omitted when serializing.

use serde::{Deserialize, Serialize};

/// Transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "pay")]
    Payment,
    #[serde(rename = "keyreg")]
    KeyRegistration,
    #[serde(rename = "acfg")]
    AssetConfig,
    #[serde(rename = "axfer")]
    AssetTransfer,
    #[serde(rename = "afrz")]
    AssetFreeze,
    #[serde(rename = "appl")]
    ApplicationCall,
    #[serde(rename = "stpf")]
    StateProof,
    /// Any tag this build does not know, such as one added by a newer protocol.
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Payment => "pay",
            TxType::KeyRegistration => "keyreg",
            TxType::AssetConfig => "acfg",
            TxType::AssetTransfer => "axfer",
            TxType::AssetFreeze => "afrz",
            TxType::ApplicationCall => "appl",
            TxType::StateProof => "stpf",
            TxType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// The unsigned transaction body.
///
/// A flat record: fields that belong to a transaction type other than
/// `tx_type` are left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub tx_type: TxType,
    #[serde(rename = "snd")]
    pub sender: String,
    #[serde(rename = "fee", default, skip_serializing_if = "is_zero")]
    pub fee: u64,
    #[serde(rename = "fv", default, skip_serializing_if = "is_zero")]
    pub first_valid: u64,
    #[serde(rename = "lv", default, skip_serializing_if = "is_zero")]
    pub last_valid: u64,
    #[serde(rename = "note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "gen", default, skip_serializing_if = "Option::is_none")]
    pub genesis_id: Option<String>,
    #[serde(rename = "grp", default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(rename = "lx", default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<String>,
    #[serde(rename = "rekey", default, skip_serializing_if = "Option::is_none")]
    pub rekey_to: Option<String>,

    // Payment
    #[serde(rename = "rcv", default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(rename = "amt", default, skip_serializing_if = "is_zero")]
    pub amount: u64,
    #[serde(rename = "close", default, skip_serializing_if = "Option::is_none")]
    pub close_remainder_to: Option<String>,

    // Key registration
    #[serde(rename = "nonpart", default, skip_serializing_if = "is_false")]
    pub nonparticipation: bool,

    // Asset transfer
    #[serde(rename = "xaid", default, skip_serializing_if = "is_zero")]
    pub xfer_asset: u64,
    #[serde(rename = "aamt", default, skip_serializing_if = "is_zero")]
    pub asset_amount: u64,
    #[serde(rename = "asnd", default, skip_serializing_if = "Option::is_none")]
    pub asset_sender: Option<String>,
    #[serde(rename = "arcv", default, skip_serializing_if = "Option::is_none")]
    pub asset_receiver: Option<String>,
    #[serde(rename = "aclose", default, skip_serializing_if = "Option::is_none")]
    pub asset_close_to: Option<String>,

    // Asset config
    #[serde(rename = "caid", default, skip_serializing_if = "is_zero")]
    pub config_asset: u64,

    // Asset freeze
    #[serde(rename = "fadd", default, skip_serializing_if = "Option::is_none")]
    pub freeze_account: Option<String>,
    #[serde(rename = "faid", default, skip_serializing_if = "is_zero")]
    pub freeze_asset: u64,
    #[serde(rename = "afrz", default, skip_serializing_if = "is_false")]
    pub asset_frozen: bool,

    // Application call
    #[serde(rename = "apid", default, skip_serializing_if = "is_zero")]
    pub application_id: u64,
    #[serde(rename = "apan", default, skip_serializing_if = "is_zero")]
    pub on_completion: u64,
    #[serde(rename = "apaa", default, skip_serializing_if = "Vec::is_empty")]
    pub application_args: Vec<String>,
    #[serde(rename = "apat", default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
    #[serde(rename = "apfa", default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_apps: Vec<u64>,
    #[serde(rename = "apas", default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_assets: Vec<u64>,
}

impl Transaction {
    /// A bare transaction of the given type; everything else unset.
    pub fn new(tx_type: TxType, sender: impl Into<String>) -> Self {
        Self {
            tx_type,
            sender: sender.into(),
            fee: 0,
            first_valid: 0,
            last_valid: 0,
            note: None,
            genesis_id: None,
            group: None,
            lease: None,
            rekey_to: None,
            receiver: None,
            amount: 0,
            close_remainder_to: None,
            nonparticipation: false,
            xfer_asset: 0,
            asset_amount: 0,
            asset_sender: None,
            asset_receiver: None,
            asset_close_to: None,
            config_asset: 0,
            freeze_account: None,
            freeze_asset: 0,
            asset_frozen: false,
            application_id: 0,
            on_completion: 0,
            application_args: Vec::new(),
            accounts: Vec::new(),
            foreign_apps: Vec::new(),
            foreign_assets: Vec::new(),
        }
    }
}

/// State changes and inner transactions produced by an application call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalDelta {
    #[serde(rename = "lg", default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
    #[serde(rename = "itx", default, skip_serializing_if = "Vec::is_empty")]
    pub inner_txns: Vec<SignedTxnWithAD>,
}

/// Results of applying a transaction to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyData {
    #[serde(rename = "ca", default, skip_serializing_if = "is_zero")]
    pub closing_amount: u64,
    #[serde(rename = "aca", default, skip_serializing_if = "is_zero")]
    pub asset_closing_amount: u64,
    #[serde(rename = "rs", default, skip_serializing_if = "is_zero")]
    pub sender_rewards: u64,
    #[serde(rename = "rr", default, skip_serializing_if = "is_zero")]
    pub receiver_rewards: u64,
    /// Asset created by this transaction, if any.
    #[serde(rename = "caid", default, skip_serializing_if = "is_zero")]
    pub config_asset: u64,
    /// Application created by this transaction, if any.
    #[serde(rename = "apid", default, skip_serializing_if = "is_zero")]
    pub application_id: u64,
    #[serde(rename = "dt", default)]
    pub eval_delta: EvalDelta,
}

/// A signed transaction together with its apply data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTxnWithAD {
    #[serde(rename = "txn")]
    pub txn: Transaction,
    #[serde(rename = "sig", default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(rename = "sgnr", default, skip_serializing_if = "Option::is_none")]
    pub auth_addr: Option<String>,
    #[serde(flatten)]
    pub apply_data: ApplyData,
}

impl SignedTxnWithAD {
    pub fn new(txn: Transaction) -> Self {
        Self {
            txn,
            sig: None,
            auth_addr: None,
            apply_data: ApplyData::default(),
        }
    }

    /// Inner transactions issued by this transaction (one level deep).
    pub fn inner_txns(&self) -> &[SignedTxnWithAD] {
        &self.apply_data.eval_delta.inner_txns
    }
}

/// Payset entry: a signed transaction as it appears in a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTxnInBlock {
    #[serde(flatten)]
    pub signed: SignedTxnWithAD,
    #[serde(rename = "hgi", default, skip_serializing_if = "is_false")]
    pub has_genesis_id: bool,
    #[serde(rename = "hgh", default, skip_serializing_if = "is_false")]
    pub has_genesis_hash: bool,
}

impl From<SignedTxnWithAD> for SignedTxnInBlock {
    fn from(signed: SignedTxnWithAD) -> Self {
        Self {
            signed,
            has_genesis_id: false,
            has_genesis_hash: false,
        }
    }
}
