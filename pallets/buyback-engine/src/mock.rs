extern crate alloc;

use crate as pallet_buyback_engine;
use pallet_allocation_router::PolRegistry;
use pallet_solvency_gates::{GateStatus, SolvencyGates};
use pallet_treasury_ledger::{AccumulationHoldings, HaltKind, TreasuryInspect, TreasuryMutate};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU128, Get, fungible::Mutate},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult, Permill,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{AssetInspector, AssetKind, ecosystem::params::PRECISION, well_known};
use std::cell::RefCell;
use std::collections::BTreeMap;

// State containers for stateful doubles
thread_local! {
    // Treasury double
    pub static BUFFERS: RefCell<BTreeMap<AssetKind, u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static REFERENCE_PRICE: RefCell<Option<u128>> = const { RefCell::new(None) };

    // Gate double
    pub static RUNWAY_OK: RefCell<bool> = const { RefCell::new(true) };
    pub static COVERAGE_OK: RefCell<bool> = const { RefCell::new(true) };
    pub static BURN_RATIO: RefCell<Permill> = const { RefCell::new(Permill::from_percent(85)) };

    // POL registry double
    pub static POL_UNDERWEIGHT: RefCell<bool> = const { RefCell::new(false) };
    pub static RESERVED_BUDGET: RefCell<u128> = const { RefCell::new(0) };
    pub static CONTRIBUTIONS: RefCell<Vec<(u128, u128, u128)>> = const { RefCell::new(Vec::new()) };

    // Venue doubles
    pub static PURCHASE_FAILS: RefCell<bool> = const { RefCell::new(false) };
    pub static PURCHASE_ZERO_FILL: RefCell<bool> = const { RefCell::new(false) };
    pub static PAIRING_FAILS: RefCell<bool> = const { RefCell::new(false) };
    pub static POOL_DEPTH: RefCell<u128> = const { RefCell::new(u128::MAX) };
    pub static TRAILING_VOLUME: RefCell<u128> = const { RefCell::new(u128::MAX / 1_000_000) };
}

pub const USDC: AssetKind = AssetKind::Local(well_known::USDC);

pub fn set_buffer(asset: AssetKind, amount: u128) {
  BUFFERS.with(|b| {
    b.borrow_mut().insert(asset, amount);
  });
}

pub fn buffer_of(asset: AssetKind) -> u128 {
  BUFFERS.with(|b| b.borrow().get(&asset).copied().unwrap_or(0))
}

pub fn set_reference_price(value: Option<u128>) {
  REFERENCE_PRICE.with(|v| *v.borrow_mut() = value);
}

pub fn set_gates(runway_ok: bool, coverage_ok: bool) {
  RUNWAY_OK.with(|v| *v.borrow_mut() = runway_ok);
  COVERAGE_OK.with(|v| *v.borrow_mut() = coverage_ok);
}

pub fn set_burn_ratio(ratio: Permill) {
  BURN_RATIO.with(|v| *v.borrow_mut() = ratio);
}

pub fn set_pol_underweight(value: bool) {
  POL_UNDERWEIGHT.with(|v| *v.borrow_mut() = value);
}

pub fn set_reserved_budget(value: u128) {
  RESERVED_BUDGET.with(|v| *v.borrow_mut() = value);
}

pub fn reserved_budget() -> u128 {
  RESERVED_BUDGET.with(|v| *v.borrow())
}

pub fn contributions() -> Vec<(u128, u128, u128)> {
  CONTRIBUTIONS.with(|v| v.borrow().clone())
}

pub fn set_purchase_fails(value: bool) {
  PURCHASE_FAILS.with(|v| *v.borrow_mut() = value);
}

pub fn set_purchase_zero_fill(value: bool) {
  PURCHASE_ZERO_FILL.with(|v| *v.borrow_mut() = value);
}

pub fn set_pairing_fails(value: bool) {
  PAIRING_FAILS.with(|v| *v.borrow_mut() = value);
}

pub fn set_pool_depth(value: u128) {
  POOL_DEPTH.with(|v| *v.borrow_mut() = value);
}

pub fn set_trailing_volume(value: u128) {
  TRAILING_VOLUME.with(|v| *v.borrow_mut() = value);
}

fn reset_doubles() {
  BUFFERS.with(|b| b.borrow_mut().clear());
  set_reference_price(Some(PRECISION));
  set_gates(true, true);
  set_burn_ratio(Permill::from_percent(85));
  set_pol_underweight(false);
  set_reserved_budget(0);
  CONTRIBUTIONS.with(|v| v.borrow_mut().clear());
  set_purchase_fails(false);
  set_purchase_zero_fill(false);
  set_pairing_fails(false);
  set_pool_depth(u128::MAX);
  set_trailing_volume(u128::MAX / 1_000_000);
}

pub struct MockLedger;
impl TreasuryInspect for MockLedger {
  fn buffer_balance(asset: AssetKind) -> u128 {
    buffer_of(asset)
  }
  fn buffer_total() -> u128 {
    BUFFERS.with(|b| b.borrow().values().sum())
  }
  fn is_buffer_asset(asset: AssetKind) -> bool {
    asset.is_stable()
  }
  fn accumulation() -> AccumulationHoldings {
    AccumulationHoldings::default()
  }
  fn outstanding_note_principal() -> u128 {
    0
  }
  fn monthly_obligation() -> u128 {
    0
  }
  fn reference_price() -> Option<u128> {
    REFERENCE_PRICE.with(|v| *v.borrow())
  }
  fn is_halted() -> bool {
    false
  }
}

impl TreasuryMutate for MockLedger {
  fn credit_buffer(asset: AssetKind, amount: u128) -> DispatchResult {
    BUFFERS.with(|b| {
      let mut buffers = b.borrow_mut();
      let balance = buffers.entry(asset).or_insert(0);
      *balance = balance.saturating_add(amount);
    });
    Ok(())
  }
  fn debit_buffer(asset: AssetKind, amount: u128) -> DispatchResult {
    BUFFERS.with(|b| {
      let mut buffers = b.borrow_mut();
      let balance = buffers.entry(asset).or_insert(0);
      *balance = balance
        .checked_sub(amount)
        .ok_or(DispatchError::Other("insufficient buffer"))?;
      Ok(())
    })
  }
  fn credit_accumulation_liquid(_amount: u128) -> DispatchResult {
    Ok(())
  }
  fn shift_liquid_to_staked(_amount: u128) -> DispatchResult {
    Ok(())
  }
  fn shift_staked_to_liquid(_amount: u128) -> DispatchResult {
    Ok(())
  }
  fn credit_accumulation_earned(_amount: u128) -> DispatchResult {
    Ok(())
  }
  fn increase_note_principal(_amount: u128) -> DispatchResult {
    Ok(())
  }
  fn decrease_note_principal(_amount: u128) -> DispatchResult {
    Ok(())
  }
  fn trip_halt(_cause: HaltKind) {}
}

pub struct MockGates;
impl SolvencyGates for MockGates {
  fn evaluate() -> GateStatus {
    GateStatus {
      runway_months: 12,
      runway_ok: RUNWAY_OK.with(|v| *v.borrow()),
      coverage_ok: COVERAGE_OK.with(|v| *v.borrow()),
      price_ok: REFERENCE_PRICE.with(|v| v.borrow().is_some()),
    }
  }
  fn burn_ratio_for(_status: &GateStatus) -> Permill {
    BURN_RATIO.with(|v| *v.borrow())
  }
  fn required_buffer() -> u128 {
    0
  }
  fn record_snapshot() {}
}

pub struct MockPol;
impl PolRegistry for MockPol {
  fn record_contribution(base: u128, pair: u128, lp_units: u128) -> DispatchResult {
    CONTRIBUTIONS.with(|v| v.borrow_mut().push((base, pair, lp_units)));
    Ok(())
  }
  fn consume_liquidity_budget(value: u128) -> u128 {
    RESERVED_BUDGET.with(|v| {
      let mut budget = v.borrow_mut();
      let consumed = value.min(*budget);
      *budget -= consumed;
      consumed
    })
  }
  fn restore_liquidity_budget(value: u128) {
    RESERVED_BUDGET.with(|v| *v.borrow_mut() += value);
  }
  fn pol_underweight() -> bool {
    POL_UNDERWEIGHT.with(|v| *v.borrow())
  }
}

pub struct MockPurchaseVenue;
impl pallet_buyback_engine::PurchaseVenue<u64> for MockPurchaseVenue {
  fn execute_bounded_purchase(
    who: &u64,
    spend: u128,
    _min_acquired: u128,
    _max_slippage: Permill,
  ) -> Result<u128, DispatchError> {
    if PURCHASE_FAILS.with(|v| *v.borrow()) {
      return Err(DispatchError::Other("venue unavailable"));
    }
    if PURCHASE_ZERO_FILL.with(|v| *v.borrow()) {
      return Ok(0);
    }
    let price = REFERENCE_PRICE
      .with(|v| *v.borrow())
      .ok_or(DispatchError::Other("no venue price"))?;
    let acquired = spend.saturating_mul(PRECISION) / price;
    Balances::mint_into(who, acquired)?;
    Ok(acquired)
  }

  fn pool_depth() -> u128 {
    POOL_DEPTH.with(|v| *v.borrow())
  }
}

pub struct MockLiquidityVenue;
impl pallet_buyback_engine::LiquidityVenue<u64> for MockLiquidityVenue {
  fn add_liquidity(
    who: &u64,
    native_amount: u128,
    pair_amount: u128,
  ) -> Result<u128, DispatchError> {
    if PAIRING_FAILS.with(|v| *v.borrow()) {
      return Err(DispatchError::Other("pairing unavailable"));
    }
    // Tokens leave custody for the pool; LP units mirror the paired value
    use polkadot_sdk::frame_support::traits::tokens::{Fortitude, Precision, Preservation};
    Balances::burn_from(
      who,
      native_amount,
      Preservation::Expendable,
      Precision::Exact,
      Fortitude::Polite,
    )?;
    Ok(native_amount.saturating_add(pair_amount))
  }
}

pub struct MockVolume;
impl pallet_buyback_engine::VolumeOracle for MockVolume {
  fn trailing_volume() -> u128 {
    TRAILING_VOLUME.with(|v| *v.borrow())
  }
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    BuybackEngine: pallet_buyback_engine,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

pub struct PalletIdStub;
impl Get<PalletId> for PalletIdStub {
  fn get() -> PalletId {
    PalletId(*primitives::ecosystem::pallet_ids::BUYBACK_ENGINE_PALLET_ID)
  }
}

pub struct PairAssetStub;
impl Get<AssetKind> for PairAssetStub {
  fn get() -> AssetKind {
    USDC
  }
}

pub struct MaxSlippageStub;
impl Get<Permill> for MaxSlippageStub {
  fn get() -> Permill {
    Permill::from_percent(2)
  }
}

pub struct ParticipationCapStub;
impl Get<Permill> for ParticipationCapStub {
  fn get() -> Permill {
    Permill::from_percent(10)
  }
}

impl pallet_buyback_engine::Config for Test {
  type Currency = Balances;
  type Ledger = MockLedger;
  type Gates = MockGates;
  type Pol = MockPol;
  type PurchaseVenue = MockPurchaseVenue;
  type LiquidityVenue = MockLiquidityVenue;
  type Volume = MockVolume;
  type PalletId = PalletIdStub;
  type PairAsset = PairAssetStub;
  type MaxSlippage = MaxSlippageStub;
  type DefaultParticipationCap = ParticipationCapStub;
  type DefaultMinPoolDepth = ConstU128<500>;
  type AdminOrigin = frame_system::EnsureRoot<u64>;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  pallet_buyback_engine::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  reset_doubles();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| System::set_block_number(1));
  ext
}
