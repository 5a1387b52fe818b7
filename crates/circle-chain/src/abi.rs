//! # Contract ABI Codec
//!
//! Minimal Solidity ABI encoding for the view functions this service calls
//! on `LendingCircle`, `CreditRegistry` and `LendingCircleFactory`, and
//! decoding for their return types (`uint256`, `uint8`, `address`, `bool`,
//! `address[]`, and the static credit-profile tuple).
//!
//! Function selectors are the first four bytes of
//! `keccak256(signature)`, precomputed below.

use circle_core::{Address, CircleStatus, CreditProfile, U256};

/// Size of one ABI word in bytes.
const WORD: usize = 32;

/// A contract view function this service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Function {
    /// Function name, used in logs and error messages.
    pub name: &'static str,
    /// Canonical Solidity signature.
    pub signature: &'static str,
    /// First four bytes of `keccak256(signature)`.
    pub selector: [u8; 4],
}

/// `LendingCircle.getCandidates(uint256) returns (address[])`.
pub const GET_CANDIDATES: Function = Function {
    name: "getCandidates",
    signature: "getCandidates(uint256)",
    selector: [0x3e, 0x39, 0xa7, 0xa5],
};

/// `LendingCircle.getCandidateVotes(uint256,address) returns (uint256)`.
pub const GET_CANDIDATE_VOTES: Function = Function {
    name: "getCandidateVotes",
    signature: "getCandidateVotes(uint256,address)",
    selector: [0x05, 0xea, 0x87, 0x9c],
};

/// `LendingCircle.getWinner(uint256) returns (address)`.
pub const GET_WINNER: Function = Function {
    name: "getWinner",
    signature: "getWinner(uint256)",
    selector: [0x41, 0x29, 0xb2, 0xc9],
};

/// `LendingCircle.isVotingPeriodEnded(uint256) returns (bool)`.
pub const IS_VOTING_PERIOD_ENDED: Function = Function {
    name: "isVotingPeriodEnded",
    signature: "isVotingPeriodEnded(uint256)",
    selector: [0x34, 0x10, 0x52, 0x38],
};

/// `LendingCircle.creditRegistry() returns (address)`.
pub const CREDIT_REGISTRY: Function = Function {
    name: "creditRegistry",
    signature: "creditRegistry()",
    selector: [0xb0, 0x15, 0xa5, 0xe8],
};

/// `LendingCircle.currentMonth() returns (uint256)`.
pub const CURRENT_MONTH: Function = Function {
    name: "currentMonth",
    signature: "currentMonth()",
    selector: [0x86, 0x2a, 0x4d, 0x47],
};

/// `LendingCircle.totalParticipants() returns (uint256)`.
pub const TOTAL_PARTICIPANTS: Function = Function {
    name: "totalParticipants",
    signature: "totalParticipants()",
    selector: [0xa2, 0x6d, 0xbf, 0x26],
};

/// `CreditRegistry.getCreditScore(address) returns (uint256)`.
pub const GET_CREDIT_SCORE: Function = Function {
    name: "getCreditScore",
    signature: "getCreditScore(address)",
    selector: [0xd3, 0xdd, 0x2b, 0xdf],
};

/// `LendingCircle.creator() returns (address)`.
pub const CREATOR: Function = Function {
    name: "creator",
    signature: "creator()",
    selector: [0x02, 0xd0, 0x5d, 0x3f],
};

/// `LendingCircle.monthlyContribution() returns (uint256)`.
pub const MONTHLY_CONTRIBUTION: Function = Function {
    name: "monthlyContribution",
    signature: "monthlyContribution()",
    selector: [0x53, 0xed, 0xad, 0x65],
};

/// `LendingCircle.durationInMonths() returns (uint256)`.
pub const DURATION_IN_MONTHS: Function = Function {
    name: "durationInMonths",
    signature: "durationInMonths()",
    selector: [0x67, 0x09, 0x7a, 0x4b],
};

/// `LendingCircle.minParticipants() returns (uint256)`.
pub const MIN_PARTICIPANTS: Function = Function {
    name: "minParticipants",
    signature: "minParticipants()",
    selector: [0xa5, 0x4c, 0xd4, 0xf7],
};

/// `LendingCircle.maxParticipants() returns (uint256)`.
pub const MAX_PARTICIPANTS: Function = Function {
    name: "maxParticipants",
    signature: "maxParticipants()",
    selector: [0x24, 0x92, 0x4b, 0xf7],
};

/// `LendingCircle.reservePercentage() returns (uint256)`.
pub const RESERVE_PERCENTAGE: Function = Function {
    name: "reservePercentage",
    signature: "reservePercentage()",
    selector: [0xf7, 0x00, 0xc8, 0x29],
};

/// `LendingCircle.status() returns (uint8)`.
pub const STATUS: Function = Function {
    name: "status",
    signature: "status()",
    selector: [0x20, 0x0d, 0x2e, 0xd2],
};

/// `LendingCircle.poolBalance() returns (uint256)`.
pub const POOL_BALANCE: Function = Function {
    name: "poolBalance",
    signature: "poolBalance()",
    selector: [0x96, 0x36, 0x5d, 0x44],
};

/// `CreditRegistry.getCreditProfile(address) returns
/// (uint256,uint256,uint256,uint256,uint256,uint256,bool)`.
pub const GET_CREDIT_PROFILE: Function = Function {
    name: "getCreditProfile",
    signature: "getCreditProfile(address)",
    selector: [0x07, 0x9b, 0xaf, 0xe3],
};

/// `LendingCircleFactory.getCircleCount() returns (uint256)`.
pub const GET_CIRCLE_COUNT: Function = Function {
    name: "getCircleCount",
    signature: "getCircleCount()",
    selector: [0xe1, 0xf2, 0xdf, 0xce],
};

/// `LendingCircleFactory.getCircles(uint256,uint256) returns (address[])`.
pub const GET_CIRCLES: Function = Function {
    name: "getCircles",
    signature: "getCircles(uint256,uint256)",
    selector: [0xa2, 0x3b, 0x7d, 0xd5],
};

/// `LendingCircleFactory.getUserCircles(address) returns (address[])`.
pub const GET_USER_CIRCLES: Function = Function {
    name: "getUserCircles",
    signature: "getUserCircles(address)",
    selector: [0x88, 0xe8, 0x1d, 0x8a],
};

/// A static argument value.
#[derive(Debug, Clone)]
pub enum Token {
    /// `uint256`.
    Uint(U256),
    /// `address`, left-padded to a word.
    Address(Address),
}

/// Decoding failures for return data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("return data too short: need {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },
    #[error("address word has non-zero high bytes")]
    DirtyAddress,
    #[error("bool word is neither 0 nor 1")]
    InvalidBool,
    #[error("dynamic offset or length out of range")]
    OutOfRange,
    #[error("unknown circle status {0}")]
    UnknownStatus(U256),
}

/// Encode calldata: selector followed by one word per argument.
pub fn encode_call(function: &Function, args: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD * args.len());
    out.extend_from_slice(&function.selector);
    for arg in args {
        let mut word = [0u8; WORD];
        match arg {
            Token::Uint(value) => value.to_big_endian(&mut word),
            Token::Address(addr) => word[WORD - 20..].copy_from_slice(addr.as_bytes()),
        }
        out.extend_from_slice(&word);
    }
    out
}

/// Encode calldata as a `0x`-prefixed hex string for `eth_call`.
pub fn encode_call_hex(function: &Function, args: &[Token]) -> String {
    format!("0x{}", hex::encode(encode_call(function, args)))
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(WORD).ok_or(AbiError::OutOfRange)?;
    data.get(offset..end).ok_or(AbiError::TooShort {
        needed: end,
        got: data.len(),
    })
}

fn uint_at(data: &[u8], offset: usize) -> Result<U256, AbiError> {
    word_at(data, offset).map(U256::from_big_endian)
}

fn address_from_word(word: &[u8]) -> Result<Address, AbiError> {
    if word[..WORD - 20].iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyAddress);
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[WORD - 20..]);
    Ok(Address::from_bytes(bytes))
}

/// Convert a word to a `usize` bounded by `limit`.
fn bounded_usize(value: U256, limit: usize) -> Result<usize, AbiError> {
    if value > U256::from(limit) {
        return Err(AbiError::OutOfRange);
    }
    Ok(value.low_u64() as usize)
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<U256, AbiError> {
    uint_at(data, 0)
}

/// Decode a single `address` return value.
pub fn decode_address(data: &[u8]) -> Result<Address, AbiError> {
    address_from_word(word_at(data, 0)?)
}

/// Decode a single `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, AbiError> {
    let value = uint_at(data, 0)?;
    if value.is_zero() {
        Ok(false)
    } else if value == U256::one() {
        Ok(true)
    } else {
        Err(AbiError::InvalidBool)
    }
}

/// Decode a `uint8` circle status.
pub fn decode_status(data: &[u8]) -> Result<CircleStatus, AbiError> {
    let value = uint_at(data, 0)?;
    if value > U256::from(u8::MAX) {
        return Err(AbiError::UnknownStatus(value));
    }
    CircleStatus::from_code(value.low_u32() as u8).ok_or(AbiError::UnknownStatus(value))
}

/// Decode the `getCreditProfile` tuple. Every member is static, so the
/// tuple is laid out inline as seven words.
pub fn decode_credit_profile(data: &[u8]) -> Result<CreditProfile, AbiError> {
    let has_defaulted = decode_bool(word_at(data, 6 * WORD)?)?;
    Ok(CreditProfile {
        credit_score: uint_at(data, 0)?,
        circles_joined: uint_at(data, WORD)?,
        circles_completed: uint_at(data, 2 * WORD)?,
        on_time_payments: uint_at(data, 3 * WORD)?,
        late_payments: uint_at(data, 4 * WORD)?,
        defaults: uint_at(data, 5 * WORD)?,
        has_defaulted,
    })
}

/// Decode a single `address[]` return value.
pub fn decode_address_array(data: &[u8]) -> Result<Vec<Address>, AbiError> {
    let offset = bounded_usize(uint_at(data, 0)?, data.len())?;
    let len = bounded_usize(uint_at(data, offset)?, data.len() / WORD)?;
    let start = offset + WORD;
    (0..len)
        .map(|i| word_at(data, start + i * WORD).and_then(address_from_word))
        .collect()
}
