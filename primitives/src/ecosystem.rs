//! Ecosystem Constants for the Bastion Treasury Pallets
//!
//! This module centralizes all system-level constants: dedicated pallet IDs for
//! treasury coordination accounts and the fundamental policy parameters.
//!
//! These constants are the single source of truth for the treasury policy and are
//! re-used across all runtime configurations via the primitives crate.

/// Balance type alias for consistency across ecosystem
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// These IDs are used by Polkadot SDK's `PalletId::into_account_truncating()`
/// to deterministically generate accounts for pallet-specific custody.
pub mod pallet_ids {
  /// Treasury Ledger pallet ID (buffer custody account)
  pub const TREASURY_LEDGER_PALLET_ID: &[u8; 8] = b"ty/ledgr";

  /// Allocation Router pallet ID (inflow partitioning engine)
  pub const ALLOCATION_ROUTER_PALLET_ID: &[u8; 8] = b"ty/alloc";

  /// Buyback Engine pallet ID (buyback pool custody)
  pub const BUYBACK_ENGINE_PALLET_ID: &[u8; 8] = b"ty/bybck";

  /// Accumulation pallet ID (reserve-asset conversion agent)
  pub const ACCUMULATION_PALLET_ID: &[u8; 8] = b"ty/accum";

  /// Note Issuance pallet ID (note subscription ingress)
  pub const NOTE_ISSUANCE_PALLET_ID: &[u8; 8] = b"ty/notes";
}

/// Policy parameters defining the treasury's mathematical constants and thresholds.
///
/// These parameters are global across all pallets and coordinate the solvency
/// and allocation behavior of the system.
pub mod params {
  use super::Balance;
  use sp_arithmetic::Permill;

  /// Precision scalar for all mathematical calculations (10^12).
  ///
  /// All prices, ratio calculations and policy metrics use this precision
  /// to maintain consistency and prevent rounding errors.
  pub const PRECISION: Balance = 1_000_000_000_000;

  /// Minimum months of operating-expense coverage the buffer must hold (6).
  ///
  /// Below this threshold the allocation router tops the buffer up before
  /// anything else, and buybacks are gated off entirely.
  pub const RUNWAY_THRESHOLD_MONTHS: u32 = 6;

  /// Coverage-ratio threshold as an integer rational (120/100 = 1.2x).
  ///
  /// Total treasury value must cover outstanding note principal by this
  /// margin before risk-bearing actions run. Kept as a numerator/denominator
  /// pair so the gate compares with cross-multiplication instead of division.
  pub const COVERAGE_THRESHOLD_NUM: Balance = 120;
  pub const COVERAGE_THRESHOLD_DEN: Balance = 100;

  /// Burn share of buyback proceeds while both solvency gates pass (85%).
  ///
  /// The single governed default for the burn/retain split; deployments
  /// re-tune it through the solvency-gates pallet, never at call sites.
  pub const BURN_RATIO_HEALTHY: Permill = Permill::from_percent(85);

  /// Burn share of buyback proceeds while any solvency gate fails (50%).
  pub const BURN_RATIO_REDUCED: Permill = Permill::from_percent(50);

  /// Accumulation (DCA) share of the router's residual split (40%).
  ///
  /// The buyback share is the exact complement, taken by subtraction so the
  /// two legs always sum to the residual.
  pub const DCA_RESIDUAL_SHARE: Permill = Permill::from_percent(40);

  /// Maximum age of the reserve-asset reference price (~1h at 6s blocks).
  ///
  /// Once a quote is older than this, every price-dependent decision fails
  /// closed: coverage gates report failing and conversions are skipped.
  pub const PRICE_STALENESS_BLOCKS: u32 = 600;

  /// Scheduling period of the cycle orchestrator (~1 week at 6s blocks).
  pub const CYCLE_PERIOD_BLOCKS: u32 = 100_800;

  /// Buyback volume-participation cap (10% of trailing venue volume).
  ///
  /// Caps a single execution's spend to avoid self-inflicted slippage.
  pub const VOLUME_PARTICIPATION_CAP: Permill = Permill::from_percent(10);

  /// Per-cycle ceiling on accumulation (DCA) conversion (50,000 units).
  pub const DEFAULT_DCA_CYCLE_CEILING: Balance = 50_000 * PRECISION;

  /// Per-cycle ceiling on buyback-pool funding (100,000 units).
  pub const DEFAULT_BUYBACK_FUNDING_CEILING: Balance = 100_000 * PRECISION;

  /// Per-cycle ceiling on the liquidity-pairing reservation (25,000 units).
  pub const DEFAULT_LIQUIDITY_BUDGET_CEILING: Balance = 25_000 * PRECISION;

  /// Minimum external pool depth required before buybacks execute.
  pub const MIN_POOL_DEPTH: Balance = 50_000 * PRECISION;

  /// Target share of accumulation holdings kept staked (50%).
  pub const TARGET_STAKING_RATIO: Permill = Permill::from_percent(50);

  /// Maximum slippage tolerated on venue executions (2%).
  pub const MAX_EXECUTION_SLIPPAGE: Permill = Permill::from_percent(2);

  /// Note subscription bounds per request.
  pub const NOTE_MIN_SUBSCRIPTION: Balance = 100 * PRECISION;
  pub const NOTE_MAX_SUBSCRIPTION: Balance = 250_000 * PRECISION;

  /// Blocks per calendar month used for note terms (30 days at 6s blocks).
  pub const BLOCKS_PER_MONTH: u32 = 432_000;
}
