use crate::errors::ErrorCode;

pub const GWEI: u128 = 1_000_000_000;

/// Priority fee suggested when a node exposes a base fee
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS: u128 = 1_500_000_000;

/// Estimation failures callers usually want to see as they are.
pub const DEFAULT_FORWARDED_ERRORS: [ErrorCode; 3] = [
    ErrorCode::InsufficientFunds,
    ErrorCode::NonceExpired,
    ErrorCode::ReplacementUnderpriced,
];

// Chains the hardware wallet helpers know by name
pub const MAINNET_CHAIN_ID: u64 = 1;
pub const GOERLI_CHAIN_ID: u64 = 5;
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const HOLESKY_CHAIN_ID: u64 = 17_000;

pub const KNOWN_CHAINS: [(&str, u64); 4] = [
    ("mainnet", MAINNET_CHAIN_ID),
    ("goerli", GOERLI_CHAIN_ID),
    ("sepolia", SEPOLIA_CHAIN_ID),
    ("holesky", HOLESKY_CHAIN_ID),
];
