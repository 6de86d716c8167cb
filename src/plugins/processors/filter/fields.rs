//! Field identifiers the filter can match on.
//!
//! Every identifier maps to a `TxnField`, resolved once when the filter is
//! compiled. A field is addressed either by its codec tag path (`txn.snd`) or by
//! its name (`Sender`).

use super::error::FilterError;
use crate::types::data::SignedTxnWithAD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Uint,
    Bool,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::Uint => f.write_str("uint"),
            FieldKind::Bool => f.write_str("bool"),
        }
    }
}

/// A field read from one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Uint(u64),
    Bool(bool),
    /// Optional text field that is not set.
    Absent,
}

impl FieldValue<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Uint(_) => "uint",
            FieldValue::Bool(_) => "bool",
            FieldValue::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnField {
    AuthAddr,
    Type,
    Sender,
    Fee,
    FirstValid,
    LastValid,
    Note,
    GenesisId,
    Group,
    Lease,
    RekeyTo,
    Receiver,
    Amount,
    CloseRemainderTo,
    Nonparticipation,
    XferAsset,
    AssetAmount,
    AssetSender,
    AssetReceiver,
    AssetCloseTo,
    ConfigAsset,
    FreezeAccount,
    FreezeAsset,
    AssetFrozen,
    ApplicationId,
    OnCompletion,
    ClosingAmount,
    AssetClosingAmount,
    CreatedAssetId,
    CreatedApplicationId,
}

struct FieldEntry {
    tag: &'static str,
    name: &'static str,
    field: TxnField,
}

const fn entry(tag: &'static str, name: &'static str, field: TxnField) -> FieldEntry {
    FieldEntry { tag, name, field }
}

const FIELDS: &[FieldEntry] = &[
    entry("sgnr", "AuthAddr", TxnField::AuthAddr),
    entry("txn.type", "Type", TxnField::Type),
    entry("txn.snd", "Sender", TxnField::Sender),
    entry("txn.fee", "Fee", TxnField::Fee),
    entry("txn.fv", "FirstValid", TxnField::FirstValid),
    entry("txn.lv", "LastValid", TxnField::LastValid),
    entry("txn.note", "Note", TxnField::Note),
    entry("txn.gen", "GenesisID", TxnField::GenesisId),
    entry("txn.grp", "Group", TxnField::Group),
    entry("txn.lx", "Lease", TxnField::Lease),
    entry("txn.rekey", "RekeyTo", TxnField::RekeyTo),
    entry("txn.rcv", "Receiver", TxnField::Receiver),
    entry("txn.amt", "Amount", TxnField::Amount),
    entry("txn.close", "CloseRemainderTo", TxnField::CloseRemainderTo),
    entry("txn.nonpart", "Nonparticipation", TxnField::Nonparticipation),
    entry("txn.xaid", "XferAsset", TxnField::XferAsset),
    entry("txn.aamt", "AssetAmount", TxnField::AssetAmount),
    entry("txn.asnd", "AssetSender", TxnField::AssetSender),
    entry("txn.arcv", "AssetReceiver", TxnField::AssetReceiver),
    entry("txn.aclose", "AssetCloseTo", TxnField::AssetCloseTo),
    entry("txn.caid", "ConfigAsset", TxnField::ConfigAsset),
    entry("txn.fadd", "FreezeAccount", TxnField::FreezeAccount),
    entry("txn.faid", "FreezeAsset", TxnField::FreezeAsset),
    entry("txn.afrz", "AssetFrozen", TxnField::AssetFrozen),
    entry("txn.apid", "ApplicationID", TxnField::ApplicationId),
    entry("txn.apan", "OnCompletion", TxnField::OnCompletion),
    entry("ca", "ClosingAmount", TxnField::ClosingAmount),
    entry("aca", "AssetClosingAmount", TxnField::AssetClosingAmount),
    entry("caid", "CreatedAssetID", TxnField::CreatedAssetId),
    entry("apid", "CreatedApplicationID", TxnField::CreatedApplicationId),
];

/// Resolve a configured identifier (tag path or field name).
pub fn resolve_field(identifier: &str) -> Result<TxnField, FilterError> {
    let identifier = identifier.trim();
    FIELDS
        .iter()
        .find(|e| e.tag == identifier || e.name == identifier)
        .map(|e| e.field)
        .ok_or_else(|| FilterError::UnknownField(identifier.to_string()))
}

/// All tag paths, in table order.
pub fn field_tags() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|e| e.tag)
}

fn text(value: &Option<String>) -> FieldValue<'_> {
    match value {
        Some(s) => FieldValue::Text(s.as_str()),
        None => FieldValue::Absent,
    }
}

impl TxnField {
    pub fn kind(&self) -> FieldKind {
        use TxnField::*;
        match self {
            AuthAddr | Type | Sender | Note | GenesisId | Group | Lease | RekeyTo | Receiver
            | CloseRemainderTo | AssetSender | AssetReceiver | AssetCloseTo | FreezeAccount => {
                FieldKind::Text
            }
            Nonparticipation | AssetFrozen => FieldKind::Bool,
            Fee | FirstValid | LastValid | Amount | XferAsset | AssetAmount | ConfigAsset
            | FreezeAsset | ApplicationId | OnCompletion | ClosingAmount | AssetClosingAmount
            | CreatedAssetId | CreatedApplicationId => FieldKind::Uint,
        }
    }

    pub fn tag(&self) -> &'static str {
        FIELDS
            .iter()
            .find(|e| e.field == *self)
            .map(|e| e.tag)
            .unwrap_or("?")
    }

    /// Read this field from one signed transaction.
    pub fn read<'a>(&self, stxn: &'a SignedTxnWithAD) -> FieldValue<'a> {
        let txn = &stxn.txn;
        let ad = &stxn.apply_data;
        match self {
            TxnField::AuthAddr => text(&stxn.auth_addr),
            TxnField::Type => FieldValue::Text(txn.tx_type.as_str()),
            TxnField::Sender => FieldValue::Text(&txn.sender),
            TxnField::Fee => FieldValue::Uint(txn.fee),
            TxnField::FirstValid => FieldValue::Uint(txn.first_valid),
            TxnField::LastValid => FieldValue::Uint(txn.last_valid),
            TxnField::Note => text(&txn.note),
            TxnField::GenesisId => text(&txn.genesis_id),
            TxnField::Group => text(&txn.group),
            TxnField::Lease => text(&txn.lease),
            TxnField::RekeyTo => text(&txn.rekey_to),
            TxnField::Receiver => text(&txn.receiver),
            TxnField::Amount => FieldValue::Uint(txn.amount),
            TxnField::CloseRemainderTo => text(&txn.close_remainder_to),
            TxnField::Nonparticipation => FieldValue::Bool(txn.nonparticipation),
            TxnField::XferAsset => FieldValue::Uint(txn.xfer_asset),
            TxnField::AssetAmount => FieldValue::Uint(txn.asset_amount),
            TxnField::AssetSender => text(&txn.asset_sender),
            TxnField::AssetReceiver => text(&txn.asset_receiver),
            TxnField::AssetCloseTo => text(&txn.asset_close_to),
            TxnField::ConfigAsset => FieldValue::Uint(txn.config_asset),
            TxnField::FreezeAccount => text(&txn.freeze_account),
            TxnField::FreezeAsset => FieldValue::Uint(txn.freeze_asset),
            TxnField::AssetFrozen => FieldValue::Bool(txn.asset_frozen),
            TxnField::ApplicationId => FieldValue::Uint(txn.application_id),
            TxnField::OnCompletion => FieldValue::Uint(txn.on_completion),
            TxnField::ClosingAmount => FieldValue::Uint(ad.closing_amount),
            TxnField::AssetClosingAmount => FieldValue::Uint(ad.asset_closing_amount),
            TxnField::CreatedAssetId => FieldValue::Uint(ad.config_asset),
            TxnField::CreatedApplicationId => FieldValue::Uint(ad.application_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::data::{Transaction, TxType};
    use std::collections::HashSet;

    #[test]
    fn test_tags_and_names_are_unique() {
        let mut seen = HashSet::new();
        for e in FIELDS {
            assert!(seen.insert(e.tag), "duplicate identifier {}", e.tag);
            assert!(seen.insert(e.name), "duplicate identifier {}", e.name);
        }
    }

    #[test]
    fn test_every_tag_resolves_and_round_trips() {
        for tag in field_tags() {
            let field = resolve_field(tag).unwrap();
            assert_eq!(field.tag(), tag);
        }
    }

    #[test]
    fn test_resolve_by_name_or_tag() {
        assert_eq!(resolve_field("Type").unwrap(), TxnField::Type);
        assert_eq!(resolve_field("txn.type").unwrap(), TxnField::Type);
        assert_eq!(resolve_field(" txn.amt ").unwrap(), TxnField::Amount);
        assert!(matches!(
            resolve_field("txn.nope"),
            Err(FilterError::UnknownField(f)) if f == "txn.nope"
        ));
    }

    #[test]
    fn test_read_values() {
        let mut txn = Transaction::new(TxType::Payment, "ALICE");
        txn.receiver = Some("BOB".to_string());
        txn.amount = 12;
        let mut stxn = SignedTxnWithAD::new(txn);
        stxn.apply_data.closing_amount = 3;

        assert_eq!(TxnField::Type.read(&stxn), FieldValue::Text("pay"));
        assert_eq!(TxnField::Receiver.read(&stxn), FieldValue::Text("BOB"));
        assert_eq!(TxnField::Amount.read(&stxn), FieldValue::Uint(12));
        assert_eq!(TxnField::ClosingAmount.read(&stxn), FieldValue::Uint(3));
        assert_eq!(TxnField::AuthAddr.read(&stxn), FieldValue::Absent);
        assert_eq!(TxnField::AssetFrozen.read(&stxn), FieldValue::Bool(false));
        assert_eq!(TxnField::XferAsset.kind(), FieldKind::Uint);
    }
}
