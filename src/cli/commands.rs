//! CLI commands for the token ledger
//!
//! Implements all command handlers for the CLI interface.

use crate::deploy::{self, DeployConfig};
use crate::dispatch::{Call, Query};
use crate::runtime::{ExecutionError, Runtime};
use crate::storage::{self, Storage, StorageConfig};
use crate::token::Ledger;
use alloy_primitives::{Address, U256};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub runtime: Runtime,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the ledger stored in `data_dir`
    pub fn open(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        if !storage.exists() {
            return Err(format!(
                "no ledger found in {:?}; run `erc20 deploy` first",
                data_dir
            )
            .into());
        }

        let ledger = storage.load()?;
        log::debug!("Loaded ledger {} from {:?}", ledger.address, data_dir);

        Ok(Self {
            runtime: Runtime::new(ledger),
            storage,
            data_dir,
        })
    }

    /// Persist the committed state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.runtime.snapshot()?)?;
        Ok(())
    }
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Parse a 20-byte hex address (with or without `0x`)
pub fn parse_address(value: &str) -> CliResult<Address> {
    Address::from_str(value.trim()).map_err(|e| format!("invalid address {:?}: {}", value, e).into())
}

/// Parse an amount: decimal, or hex with a `0x` prefix
pub fn parse_amount(value: &str) -> CliResult<U256> {
    U256::from_str(value.trim()).map_err(|e| format!("invalid amount {:?}: {}", value, e).into())
}

/// Deploy a new ledger
pub fn cmd_deploy(data_dir: &Path, config: &DeployConfig, nonce: u64, force: bool) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;

    if storage.exists() && !force {
        println!("⚠️  A ledger already exists at {:?}", data_dir);
        println!("   Use --force to replace it (this will delete existing data)");
        return Ok(());
    }

    let deployment = deploy::deploy(config, nonce)?;
    storage.save(&deployment.ledger)?;

    let ledger = &deployment.ledger;
    println!("✅ Token deployed!");
    println!("   📍 Address: {}", deployment.address);
    println!("   🏷️  {} ({})", ledger.name(), ledger.symbol());
    println!("   🔢 Decimals: {}", ledger.decimals());
    println!("   💰 Total supply: {}", ledger.total_supply());
    for (holder, amount) in ledger.holders() {
        println!("   ├─ {}: {}", holder, amount);
    }
    println!("   📁 Data directory: {:?}", data_dir);

    Ok(())
}

/// Show ledger information
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let ledger = state.runtime.snapshot()?;

    println!("🪙 Token ledger");
    println!("   ├─ Address: {}", ledger.address);
    println!("   ├─ Name: {}", ledger.name());
    println!("   ├─ Symbol: {}", ledger.symbol());
    println!("   ├─ Decimals: {}", ledger.decimals());
    println!("   ├─ Total supply: {}", ledger.total_supply());
    println!("   ├─ Holders: {}", ledger.holder_count());
    println!("   ├─ Deployer: {}", ledger.metadata.deployer);
    println!("   └─ Created: {}", ledger.metadata.created_at);

    if !ledger.check_invariants() {
        println!("\n❌ Balances do not add up to the total supply!");
    }

    Ok(())
}

pub fn cmd_total_supply(state: &AppState) -> CliResult<()> {
    println!("{}", state.runtime.total_supply()?);
    Ok(())
}

pub fn cmd_balance(state: &AppState, account: &str) -> CliResult<()> {
    let account = parse_address(account)?;
    println!("{}", state.runtime.balance_of(account)?);
    Ok(())
}

pub fn cmd_allowance(state: &AppState, owner: &str, spender: &str) -> CliResult<()> {
    let owner = parse_address(owner)?;
    let spender = parse_address(spender)?;
    println!("{}", state.runtime.allowance(owner, spender)?);
    Ok(())
}

/// Transfer tokens from the caller
pub fn cmd_transfer(state: &AppState, caller: &str, to: &str, amount: &str) -> CliResult<()> {
    let caller = parse_address(caller)?;
    let to = parse_address(to)?;
    let amount = parse_amount(amount)?;

    commit(state, state.runtime.transfer(caller, to, amount))?;

    println!("✅ Transferred {} from {} to {}", amount, caller, to);
    println!("   New balance: {}", state.runtime.balance_of(caller)?);
    Ok(())
}

/// Set an allowance
pub fn cmd_approve(state: &AppState, caller: &str, spender: &str, amount: &str) -> CliResult<()> {
    let caller = parse_address(caller)?;
    let spender = parse_address(spender)?;
    let amount = parse_amount(amount)?;

    commit(state, state.runtime.approve(caller, spender, amount))?;

    println!("✅ {} may now spend {} of {}'s tokens", spender, amount, caller);
    Ok(())
}

/// Spend an allowance
pub fn cmd_transfer_from(
    state: &AppState,
    caller: &str,
    from: &str,
    to: &str,
    amount: &str,
) -> CliResult<()> {
    let caller = parse_address(caller)?;
    let from = parse_address(from)?;
    let to = parse_address(to)?;
    let amount = parse_amount(amount)?;

    commit(state, state.runtime.transfer_from(caller, from, to, amount))?;

    println!("✅ {} moved {} from {} to {}", caller, amount, from, to);
    println!("   Remaining allowance: {}", state.runtime.allowance(from, caller)?);
    Ok(())
}

/// Send raw calldata through the dispatcher
pub fn cmd_call(state: &AppState, caller: &str, data: &str) -> CliResult<()> {
    let caller = parse_address(caller)?;
    let calldata = hex::decode(data.trim().trim_start_matches("0x"))?;
    let mutating = Call::decode(&calldata).is_ok_and(|call| call.is_mutating());

    match state.runtime.execute(caller, &calldata) {
        Ok(output) => {
            if mutating {
                state.save()?;
            }
            println!("✅ Success");
            println!("   Return data: 0x{}", hex::encode(output));
            Ok(())
        }
        Err(err) => {
            if err.is_rejected_at_dispatch() {
                println!("⛔ Rejected: {}", err);
            } else {
                println!("❌ Reverted: {}", err);
            }
            if let Some(data) = err.revert_data() {
                println!("   Revert data: 0x{}", hex::encode(data));
            }
            Err(err.into())
        }
    }
}

/// Print the ABI-encoded answer of a query
pub fn cmd_query(state: &AppState, query: Query) -> CliResult<()> {
    let output = state.runtime.query(query)?;
    println!("0x{}", hex::encode(output));
    Ok(())
}

/// Show recent events
pub fn cmd_events(state: &AppState, count: usize) -> CliResult<()> {
    let events = state.runtime.events()?;

    if events.is_empty() {
        println!("📭 No events recorded.");
        return Ok(());
    }

    let skip = events.len().saturating_sub(count);
    println!("📜 Recent events ({} of {}):", events.len() - skip, events.len());
    for event in events.iter().skip(skip) {
        println!("   [{}] {}", event.timestamp().format("%Y-%m-%d %H:%M:%S"), event);
    }

    Ok(())
}

/// Export the ledger to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    storage::save_to_file(&state.runtime.snapshot()?, path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Replace the ledger with one read from a file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let ledger = storage::load_from_file(path)?;
    replace_ledger(state, ledger)?;
    println!("📥 Ledger imported from {:?}", path);
    Ok(())
}

/// List stored backups
pub fn cmd_backups(state: &AppState) -> CliResult<()> {
    let backups = state.storage.list_backups();

    if backups.is_empty() {
        println!("📭 No backups in {:?}", state.data_dir);
        return Ok(());
    }

    println!("🗄️  Backups (0 is the most recent):");
    for index in backups {
        println!("   └─ {}", index);
    }
    Ok(())
}

/// Roll the ledger back to a backup
pub fn cmd_restore(state: &mut AppState, backup: usize) -> CliResult<()> {
    let ledger = state.storage.restore_backup(backup)?;
    replace_ledger(state, ledger)?;
    println!("⏪ Restored backup {}", backup);
    Ok(())
}

fn replace_ledger(state: &mut AppState, ledger: Ledger) -> CliResult<()> {
    println!("   📍 Address: {}", ledger.address);
    println!("   💰 Total supply: {}", ledger.total_supply());
    println!("   👛 Holders: {}", ledger.holder_count());

    state.runtime = Runtime::new(ledger);
    state.save()
}

/// Persist after a committed mutation; report and pass through failures
fn commit(state: &AppState, result: Result<(), ExecutionError>) -> CliResult<()> {
    match result {
        Ok(()) => state.save(),
        Err(err) => {
            println!("❌ {}", err);
            if let Some(data) = err.revert_data() {
                println!("   Revert data: 0x{}", hex::encode(data));
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Mutation;
    use alloy_sol_types::{sol, SolCall};

    sol! {
        function mint(address to, uint256 amount);
    }

    const A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn deployed(dir: &Path) -> AppState {
        let config = DeployConfig::new(
            "CLI Token".into(),
            "CLI".into(),
            parse_address(A).unwrap(),
            U256::from(1000u64),
        );
        cmd_deploy(dir, &config, 0, false).unwrap();
        AppState::open(dir.to_path_buf()).unwrap()
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_address(A).unwrap(), Address::repeat_byte(0xaa));
        assert!(parse_address("0x1234").is_err());
        assert_eq!(parse_amount("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_amount("0x10").unwrap(), U256::from(16u64));
        assert!(parse_amount("-1").is_err());
    }

    #[test]
    fn test_open_without_ledger() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppState::open(dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_transfer_persists() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());

        cmd_transfer(&state, A, B, "250").unwrap();

        let reopened = AppState::open(dir.path().to_path_buf()).unwrap();
        let b = parse_address(B).unwrap();
        assert_eq!(reopened.runtime.balance_of(b).unwrap(), U256::from(250u64));
    }

    #[test]
    fn test_failed_transfer_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());

        assert!(cmd_transfer(&state, B, A, "1").is_err());
        assert!(cmd_transfer(&state, A, "0x0000000000000000000000000000000000000000", "1").is_err());

        let reopened = AppState::open(dir.path().to_path_buf()).unwrap();
        let a = parse_address(A).unwrap();
        assert_eq!(reopened.runtime.balance_of(a).unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_raw_mint_call_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());

        let calldata = mintCall {
            to: parse_address(B).unwrap(),
            amount: U256::from(5u64),
        }
        .abi_encode();

        assert!(cmd_call(&state, B, &hex::encode(calldata)).is_err());
        assert_eq!(state.runtime.total_supply().unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_deploy_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());
        cmd_transfer(&state, A, B, "1").unwrap();

        let config = DeployConfig::new(
            "Other".into(),
            "OTH".into(),
            parse_address(B).unwrap(),
            U256::from(5u64),
        );
        cmd_deploy(dir.path(), &config, 0, false).unwrap();

        let reopened = AppState::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.runtime.total_supply().unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_raw_transfer_call_persists() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());

        let call = Call::Mutation(Mutation::Transfer {
            to: parse_address(B).unwrap(),
            amount: U256::from(40u64),
        });
        cmd_call(&state, A, &hex::encode(call.encode())).unwrap();

        let reopened = AppState::open(dir.path().to_path_buf()).unwrap();
        let b = parse_address(B).unwrap();
        assert_eq!(reopened.runtime.balance_of(b).unwrap(), U256::from(40u64));
        assert_eq!(reopened.runtime.total_supply().unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_deploy_force_replaces_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());
        cmd_transfer(&state, A, B, "1").unwrap();

        let config = DeployConfig::new(
            "Other".into(),
            "OTH".into(),
            parse_address(B).unwrap(),
            U256::from(5u64),
        );
        cmd_deploy(dir.path(), &config, 1, true).unwrap();

        let reopened = AppState::open(dir.path().to_path_buf()).unwrap();
        let ledger = reopened.runtime.snapshot().unwrap();
        assert_eq!(ledger.name(), "Other");
        assert_eq!(ledger.total_supply(), U256::from(5u64));
        assert_eq!(ledger.balance_of(parse_address(B).unwrap()), U256::from(5u64));
        assert_eq!(ledger.balance_of(parse_address(A).unwrap()), U256::ZERO);
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed(dir.path());
        cmd_approve(&state, A, B, "70").unwrap();

        let export = dir.path().join("export.json");
        cmd_export(&state, &export).unwrap();

        let other = tempfile::tempdir().unwrap();
        let mut target = deployed(other.path());
        cmd_transfer(&target, A, B, "999").unwrap();
        cmd_import(&mut target, &export).unwrap();

        let reopened = AppState::open(other.path().to_path_buf()).unwrap();
        let (a, b) = (parse_address(A).unwrap(), parse_address(B).unwrap());
        assert_eq!(reopened.runtime.balance_of(a).unwrap(), U256::from(1000u64));
        assert_eq!(reopened.runtime.allowance(a, b).unwrap(), U256::from(70u64));
    }

    #[test]
    fn test_import_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(dir.path());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"not\": \"a ledger\"}").unwrap();

        assert!(cmd_import(&mut state, &path).is_err());
        assert_eq!(state.runtime.total_supply().unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_restore_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(dir.path());
        cmd_transfer(&state, A, B, "10").unwrap();
        cmd_transfer(&state, A, B, "10").unwrap();

        assert!(!state.storage.list_backups().is_empty());
        cmd_backups(&state).unwrap();

        // Backup 0 holds the state before the second transfer
        cmd_restore(&mut state, 0).unwrap();

        let reopened = AppState::open(dir.path().to_path_buf()).unwrap();
        let b = parse_address(B).unwrap();
        assert_eq!(reopened.runtime.balance_of(b).unwrap(), U256::from(10u64));
        assert!(cmd_restore(&mut state, 42).is_err());
    }
}
