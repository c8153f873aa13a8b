//! Maps chain display names shown by the app to price API chain ids.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Display names (upper case) and the price API id for each known chain
const KNOWN_CHAINS: &[(&str, &str)] = &[
    ("ETHEREUM", "ethereum"),
    ("BASE", "base"),
    ("BSC", "bsc"),
    ("SOLANA", "solana"),
    ("ARBITRUM", "arbitrum"),
    ("AVALANCHE", "avalanche"),
    ("POLYGON", "polygon"),
    ("OPTIMISM", "optimism"),
    ("SUI", "sui"),
    ("TON", "ton"),
    ("CELO", "celo"),
    ("PULSECHAIN", "pulsechain"),
    ("OSMOSIS", "osmosis"),
    ("MANTLE", "mantle"),
    ("SEIV2", "seiv2"),
    ("FANTOM", "fantom"),
    ("BLAST", "blast"),
    ("APTOS", "aptos"),
    ("LINEA", "linea"),
    ("CRONOS", "cronos"),
    ("STARKNET", "starknet"),
    ("CORE", "core"),
    ("TRON", "tron"),
    ("HEDERA", "hedera"),
    ("MOONBEAM", "moonbeam"),
    ("SCROLL", "scroll"),
    ("METIS", "metis"),
    ("CARDANO", "cardano"),
    ("ZKSYNC", "zksync"),
    ("GNOSIS CHAIN", "gnosischain"),
    ("NEAR", "near"),
    ("ALGORAND", "algorand"),
    ("MULTIVERSX", "multiversx"),
    ("POLYGON ZKEVM", "polygonzkevm"),
    ("MANTA", "manta"),
    ("HYPER LIQUID", "hyperliquid"),
    ("MERLIN CHAIN", "merlinchain"),
    ("FLARE", "flare"),
    ("WORLD CHAIN", "worldchain"),
    ("KAVA", "kava"),
    ("IOTEX", "iotex"),
    ("OPBNB", "opbnb"),
    ("AURORA", "aurora"),
    ("CONFLUX", "conflux"),
    ("CANTO", "canto"),
    ("MODE", "mode"),
    ("APECHAIN", "apechain"),
    ("ICP", "icp"),
    ("ASTAR", "astar"),
    ("INJECTIVE", "injective"),
    ("BEAM", "beam"),
    ("BOUNCEBIT", "bouncebit"),
    ("MOONRIVER", "moonriver"),
    ("FILECOIN", "filecoin"),
];

static DEFAULT_TABLE: Lazy<HashMap<String, String>> = Lazy::new(|| {
    KNOWN_CHAINS
        .iter()
        .map(|(name, id)| (name.to_string(), id.to_string()))
        .collect()
});

/// Case-insensitive chain name lookup over an injected table
#[derive(Debug, Clone)]
pub struct ChainResolver {
    table: HashMap<String, String>,
}

impl ChainResolver {
    /// Build from `display name -> chain id` pairs; names are matched case-insensitively
    pub fn new(table: HashMap<String, String>) -> Self {
        let table = table
            .into_iter()
            .map(|(name, id)| (name.trim().to_uppercase(), id.to_lowercase()))
            .collect();
        Self { table }
    }

    pub fn is_known(&self, display_name: &str) -> bool {
        self.table.contains_key(&display_name.trim().to_uppercase())
    }

    /// Chain id for a display name; empty when the name is not mapped
    pub fn resolve(&self, display_name: &str) -> String {
        self.table
            .get(&display_name.trim().to_uppercase())
            .cloned()
            .unwrap_or_default()
    }

    /// First candidate that names a known chain
    pub fn find_chain_name<'a, I>(&self, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().find(|c| self.is_known(c))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE.clone())
    }
}
