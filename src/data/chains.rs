use crate::data::types::ChainTarget;

/// Unified endpoint of the v2 explorer API.
pub const V2_API_URL: &str = "https://api.etherscan.io/v2/api";

static CHAINS: [ChainTarget; 5] = [
    ChainTarget {
        name: "mainnet",
        display_name: "Mainnet",
        chain_id: 1,
        api_url: "https://api.etherscan.io/api",
        symbol: "ETH",
    },
    ChainTarget {
        name: "sepolia",
        display_name: "Sepolia",
        chain_id: 11155111,
        api_url: "https://api-sepolia.etherscan.io/api",
        symbol: "ETH",
    },
    ChainTarget {
        name: "holesky",
        display_name: "Holesky",
        chain_id: 17000,
        api_url: "https://api-holesky.etherscan.io/api",
        symbol: "ETH",
    },
    ChainTarget {
        name: "arbitrum-sepolia",
        display_name: "Arbitrum Sepolia",
        chain_id: 421614,
        api_url: "https://api-sepolia.arbiscan.io/api",
        symbol: "ETH",
    },
    ChainTarget {
        name: "base-sepolia",
        display_name: "Base Sepolia",
        chain_id: 84532,
        api_url: "https://api-sepolia.basescan.org/api",
        symbol: "ETH",
    },
];

/// Look up a chain by name or alias (case-insensitive).
pub fn get_chain(name: &str) -> Option<&'static ChainTarget> {
    let name = name.trim().to_lowercase();
    let canonical = match name.as_str() {
        "ethereum" | "eth" => "mainnet",
        "arbitrum sepolia" => "arbitrum-sepolia",
        "base sepolia" => "base-sepolia",
        other => other,
    };
    CHAINS.iter().find(|c| c.name == canonical)
}

/// Return a list of all supported chain names.
pub fn supported_chains() -> Vec<&'static str> {
    CHAINS.iter().map(|c| c.name).collect()
}

pub fn all_chains() -> &'static [ChainTarget] {
    &CHAINS
}
