// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use jsonrpsee::core::Serialize;
use serde::Deserialize;
use strum::{self, IntoEnumIterator};

/// The versions of the Bank JSON-RPC API implemented by this server.
/// The version numbers are independent of the crate version, so the ledger
/// library can change without breaking the wire API (or vice versa).
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    strum::EnumIter,
)]
pub enum BankRpcApiVersion {
    #[strum(serialize = "0.1")]
    V0_1,
}

// Serialized through the strum variant strings (eg. "0.1") rather than the
// enum member names serde would derive (eg. "V0_1").

impl serde::ser::Serialize for BankRpcApiVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl<'de> serde::de::Deserialize<'de> for BankRpcApiVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<BankRpcApiVersion, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BankRpcApiVersion::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// List of RPC version numbers for which a deprecation warning has to be issued.
pub static BANK_RPC_API_VERSIONS_DEPRECATED: &[BankRpcApiVersion] = &[];

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BankRpcApiVersionsInfo {
    pub versions_supported: Vec<BankRpcApiVersion>,
    pub versions_deprecated: Vec<BankRpcApiVersion>,
}

pub fn bank_rpc_api_versions_info() -> BankRpcApiVersionsInfo {
    BankRpcApiVersionsInfo {
        versions_supported: BankRpcApiVersion::iter().collect::<Vec<_>>(),
        versions_deprecated: BANK_RPC_API_VERSIONS_DEPRECATED.to_vec(),
    }
}
