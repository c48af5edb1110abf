//! Test helpers: mock chain gateway and parsed-transaction fixtures

use crate::rpc::{ChainGateway, RpcError};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// In-memory stand-in for the RPC provider.
///
/// Transactions are keyed by signature string; absent signatures behave
/// like a provider that has not indexed them yet.
pub struct MockGateway {
    blockhash: Hash,
    last_valid_block_height: u64,
    supply: Mutex<Option<f64>>,
    balances: DashMap<String, f64>,
    transactions: DashMap<String, EncodedConfirmedTransactionWithStatusMeta>,
    fee: Mutex<Option<u64>>,
    fail_blockhash: AtomicBool,
    fee_calls: AtomicU32,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            last_valid_block_height: 1_000,
            supply: Mutex::new(None),
            balances: DashMap::new(),
            transactions: DashMap::new(),
            fee: Mutex::new(None),
            fail_blockhash: AtomicBool::new(false),
            fee_calls: AtomicU32::new(0),
        }
    }

    pub fn with_prioritization_fee(self, fee: u64) -> Self {
        *self.fee.lock() = Some(fee);
        self
    }

    pub fn with_supply(self, supply: f64) -> Self {
        *self.supply.lock() = Some(supply);
        self
    }

    pub fn with_balance(self, owner: &Pubkey, balance: f64) -> Self {
        self.balances.insert(owner.to_string(), balance);
        self
    }

    pub fn with_failing_blockhash(self) -> Self {
        self.fail_blockhash.store(true, Ordering::SeqCst);
        self
    }

    pub fn insert_transaction(
        &self,
        signature: &str,
        transaction: EncodedConfirmedTransactionWithStatusMeta,
    ) {
        self.transactions.insert(signature.to_string(), transaction);
    }

    pub fn set_balance(&self, owner: &Pubkey, balance: f64) {
        self.balances.insert(owner.to_string(), balance);
    }

    pub fn prioritization_fee_calls(&self) -> u32 {
        self.fee_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), RpcError> {
        if self.fail_blockhash.load(Ordering::SeqCst) {
            return Err(RpcError::Transport {
                endpoint: "mock".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok((self.blockhash, self.last_valid_block_height))
    }

    async fn parsed_transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta, RpcError> {
        self.transactions
            .get(&signature.to_string())
            .map(|t| t.clone())
            .ok_or_else(|| RpcError::NotYetIndexed {
                signature: signature.to_string(),
            })
    }

    async fn token_supply(&self, _mint: &Pubkey) -> Result<f64, RpcError> {
        (*self.supply.lock()).ok_or_else(|| RpcError::Response {
            endpoint: "mock".to_string(),
            message: "no supply configured".to_string(),
        })
    }

    async fn token_balance(&self, owner: &Pubkey, _mint: &Pubkey) -> Result<f64, RpcError> {
        Ok(self
            .balances
            .get(&owner.to_string())
            .map(|b| *b)
            .unwrap_or(0.0))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError> {
        Ok(self.transactions.get(&signature.to_string()).map(|t| {
            match t.transaction.meta.as_ref().and_then(|m| m.err.clone()) {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }))
    }

    async fn prioritization_fee(&self) -> Result<u64, RpcError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        (*self.fee.lock()).ok_or_else(|| RpcError::Response {
            endpoint: "mock".to_string(),
            message: "no fee configured".to_string(),
        })
    }
}

/// Parameters for a parsed-transaction fixture
pub struct BurnFixture {
    wallet: Pubkey,
    mint: Pubkey,
    ui_amount: f64,
    decimals: u8,
    failed: bool,
    include_burn: bool,
    checked: bool,
}

impl BurnFixture {
    pub fn new(wallet: &Pubkey, mint: &Pubkey, ui_amount: f64) -> Self {
        Self {
            wallet: *wallet,
            mint: *mint,
            ui_amount,
            decimals: 9,
            failed: false,
            include_burn: true,
            checked: true,
        }
    }

    /// The transaction failed on-chain
    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    /// The transaction contains no burn instruction at all
    pub fn without_burn(mut self) -> Self {
        self.include_burn = false;
        self
    }

    /// Use the plain `burn` form (raw base-unit amount) instead of
    /// `burnChecked`
    pub fn plain(mut self) -> Self {
        self.checked = false;
        self
    }
}

/// Build an `EncodedConfirmedTransactionWithStatusMeta` the way the RPC
/// returns it for a jsonParsed burn transaction.
///
/// Deserializing the RPC wire shape keeps the fixture stable against
/// non-breaking struct additions upstream.
pub fn burn_fixture(fx: BurnFixture) -> EncodedConfirmedTransactionWithStatusMeta {
    let token_account = Pubkey::new_unique().to_string();
    let raw_amount = (fx.ui_amount * 10f64.powi(fx.decimals as i32)).round() as u64;

    let mut instructions = vec![
        // Compute budget instructions come back partially decoded
        json!({
            "programId": "ComputeBudget111111111111111111111111111111",
            "accounts": [],
            "data": "3QAwFKa1HYPk",
            "stackHeight": null,
        }),
    ];

    if fx.include_burn {
        let parsed = if fx.checked {
            json!({
                "type": "burnChecked",
                "info": {
                    "account": token_account,
                    "mint": fx.mint.to_string(),
                    "authority": fx.wallet.to_string(),
                    "tokenAmount": {
                        "amount": raw_amount.to_string(),
                        "decimals": fx.decimals,
                        "uiAmount": fx.ui_amount,
                        "uiAmountString": fx.ui_amount.to_string(),
                    },
                },
            })
        } else {
            json!({
                "type": "burn",
                "info": {
                    "account": token_account,
                    "mint": fx.mint.to_string(),
                    "authority": fx.wallet.to_string(),
                    "amount": raw_amount.to_string(),
                },
            })
        };
        instructions.push(json!({
            "program": "spl-token",
            "programId": spl_token::id().to_string(),
            "parsed": parsed,
            "stackHeight": null,
        }));
    }

    let err = if fx.failed {
        json!({ "InstructionError": [0, { "Custom": 1 }] })
    } else {
        json!(null)
    };
    let status = if fx.failed {
        json!({ "Err": { "InstructionError": [0, { "Custom": 1 }] } })
    } else {
        json!({ "Ok": null })
    };

    let value = json!({
        "slot": 246_813_579u64,
        "blockTime": 1_722_000_000i64,
        "transaction": {
            "version": "legacy",
            "meta": {
                "err": err,
                "status": status,
                "fee": 5000,
                "preBalances": [],
                "postBalances": [],
                "innerInstructions": [],
                "logMessages": [],
                "preTokenBalances": [],
                "postTokenBalances": [],
                "rewards": [],
                "loadedAddresses": { "writable": [], "readonly": [] },
                "computeUnitsConsumed": 4_500,
            },
            "transaction": {
                "signatures": [Signature::from([9u8; 64]).to_string()],
                "message": {
                    "accountKeys": [
                        {
                            "pubkey": fx.wallet.to_string(),
                            "writable": true,
                            "signer": true,
                            "source": "transaction",
                        },
                    ],
                    "recentBlockhash": Hash::new_unique().to_string(),
                    "instructions": instructions,
                    "addressTableLookups": null,
                },
            },
        },
    });

    serde_json::from_value(value).expect("fixture matches the RPC wire shape")
}
