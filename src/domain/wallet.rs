use serde::{Deserialize, Serialize};

use super::{require_text, Editable, Entity, Family};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub name: String,
    pub address: String,
    pub chain: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub gas_logs: Vec<GasLog>,
    #[serde(default)]
    pub interaction_logs: Vec<InteractionLog>,
    #[serde(default)]
    pub nft_holdings: Vec<NftHolding>,
    #[serde(default)]
    pub transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GasLog {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionLog {
    pub id: String,
    pub date: String,
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftHolding {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: String,
    pub hash: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Wallet {
    pub fn short_address(&self) -> String {
        let address = self.address.trim();
        if address.chars().count() <= 12 {
            return address.to_string();
        }
        let head: String = address.chars().take(6).collect();
        let tail: String = address
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{head}…{tail}")
    }

    pub fn total_gas(&self) -> f64 {
        self.gas_logs.iter().map(|log| log.amount).sum()
    }
}

impl Entity for Wallet {
    const FAMILY: Family = Family::Wallets;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Wallet {
    type Draft = NewWallet;
    type Patch = WalletPatch;

    fn validate_draft(draft: &NewWallet) -> Result<(), String> {
        require_text("wallet name", &draft.name)?;
        require_text("wallet address", &draft.address)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewWallet {
    pub name: String,
    pub address: String,
    pub chain: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub hash: String,
    pub date: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewGasLog {
    pub amount: f64,
    pub currency: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Wallet;

    fn wallet(address: &str) -> Wallet {
        Wallet {
            id: "w-1".to_string(),
            name: "Main".to_string(),
            address: address.to_string(),
            chain: "ethereum".to_string(),
            is_archived: false,
            gas_logs: Vec::new(),
            interaction_logs: Vec::new(),
            nft_holdings: Vec::new(),
            transactions: Vec::new(),
        }
    }

    #[test]
    fn short_address_keeps_head_and_tail() {
        let long = wallet("0x1234567890abcdef1234567890abcdef12345678");
        assert_eq!(long.short_address(), "0x1234…5678");
        assert_eq!(wallet("0xabc").short_address(), "0xabc");
    }
}
