// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custody controller and reward token ABIs, plus receipt log decoding.

use alloy::{
    primitives::{Address, Log, U256},
    sol,
    sol_types::SolEvent,
};

use super::types::{RewardIssued, SessionRecord};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct SessionState {
        uint256 id;
        address user;
        string proof;
        bool confirmed;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IController {
        event UploadData(string docId, uint256 sessionId);
        event GeneNFTMinted(address indexed owner, uint256 tokenId);
        event PCSPRewarded(address indexed user, uint256 amount);

        function uploadData(string docId) external returns (uint256);
        function confirm(
            string docId,
            string contentHash,
            string proof,
            uint256 sessionId,
            uint256 riskScore
        ) external;
        function getSession(uint256 sessionId) external view returns (SessionState memory);
        function pcspToken() external view returns (address);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Reward token decimals (OpenZeppelin ERC-20 default).
pub const PCSP_DECIMALS: u8 = 18;

impl From<SessionState> for SessionRecord {
    fn from(session: SessionState) -> Self {
        Self {
            id: session.id.to_string(),
            user: session.user.to_checksum(None),
            proof: session.proof,
            confirmed: session.confirmed,
        }
    }
}

/// Find the session id of the `UploadData` event for `doc_id` emitted by
/// `controller`.
pub fn find_session_id(logs: &[Log], controller: Address, doc_id: &str) -> Option<U256> {
    logs.iter()
        .filter(|log| log.address == controller)
        .filter_map(|log| IController::UploadData::decode_log_data(&log.data).ok())
        .find(|event| event.docId == doc_id)
        .map(|event| event.sessionId)
}

/// First NFT mint event emitted by `controller`, if any.
pub fn find_minted_token(logs: &[Log], controller: Address) -> Option<U256> {
    logs.iter()
        .filter(|log| log.address == controller)
        .find_map(|log| IController::GeneNFTMinted::decode_log_data(&log.data).ok())
        .map(|event| event.tokenId)
}

/// First reward event emitted by `controller`, if any.
pub fn find_reward(logs: &[Log], controller: Address) -> Option<RewardIssued> {
    logs.iter()
        .filter(|log| log.address == controller)
        .find_map(|log| IController::PCSPRewarded::decode_log_data(&log.data).ok())
        .map(|event| RewardIssued {
            user: event.user.to_checksum(None),
            amount: event.amount.to_string(),
        })
}

/// Format a token balance with the specified decimals.
pub fn format_token_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
        }
    }
}

/// Build an event log as the controller would emit it.
#[cfg(test)]
pub(crate) fn controller_log<E: SolEvent>(controller: Address, event: &E) -> Log {
    Log {
        address: controller,
        data: event.encode_log_data(),
    }
}
