extern crate alloc;

use crate as pallet_allocation_router;
use pallet_solvency_gates::{GateStatus, SolvencyGates};
use pallet_treasury_ledger::{AccumulationHoldings, HaltKind, TreasuryInspect, TreasuryMutate};
use polkadot_sdk::frame_support::{
  construct_runtime, derive_impl,
  traits::{ConstU64, ConstU128, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchResult, Permill,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{AssetInspector, AssetKind, well_known};
use std::cell::RefCell;
use std::collections::BTreeMap;

// State containers for stateful doubles
thread_local! {
    // Treasury double
    pub static BUFFERS: RefCell<BTreeMap<AssetKind, u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static HALTED: RefCell<Option<HaltKind>> = const { RefCell::new(None) };

    // Gate double
    pub static RUNWAY_OK: RefCell<bool> = const { RefCell::new(true) };
    pub static COVERAGE_OK: RefCell<bool> = const { RefCell::new(true) };
    pub static REQUIRED_BUFFER: RefCell<u128> = const { RefCell::new(0) };

    // Funding sink doubles
    pub static BUYBACK_FUNDED: RefCell<u128> = const { RefCell::new(0) };
    pub static DCA_FUNDED: RefCell<u128> = const { RefCell::new(0) };

    // Liquidity gauge double
    pub static POOL_DEPTH: RefCell<u128> = const { RefCell::new(u128::MAX) };
    pub static GAUGE_OWNERSHIP: RefCell<Permill> = const { RefCell::new(Permill::zero()) };
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

pub fn set_gates(runway_ok: bool, coverage_ok: bool) {
  RUNWAY_OK.with(|v| *v.borrow_mut() = runway_ok);
  COVERAGE_OK.with(|v| *v.borrow_mut() = coverage_ok);
}

pub fn set_required_buffer(value: u128) {
  REQUIRED_BUFFER.with(|v| *v.borrow_mut() = value);
}

pub fn buyback_funded() -> u128 {
  BUYBACK_FUNDED.with(|v| *v.borrow())
}

pub fn dca_funded() -> u128 {
  DCA_FUNDED.with(|v| *v.borrow())
}

pub fn set_pool_depth(value: u128) {
  POOL_DEPTH.with(|v| *v.borrow_mut() = value);
}

pub fn set_gauge_ownership(value: Permill) {
  GAUGE_OWNERSHIP.with(|v| *v.borrow_mut() = value);
}

pub fn halted_with() -> Option<HaltKind> {
  HALTED.with(|v| *v.borrow())
}

fn reset_doubles() {
  BUFFERS.with(|b| b.borrow_mut().clear());
  HALTED.with(|v| *v.borrow_mut() = None);
  set_gates(true, true);
  set_required_buffer(0);
  BUYBACK_FUNDED.with(|v| *v.borrow_mut() = 0);
  DCA_FUNDED.with(|v| *v.borrow_mut() = 0);
  set_pool_depth(u128::MAX);
  set_gauge_ownership(Permill::zero());
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
    None
  }
  fn is_halted() -> bool {
    halted_with().is_some()
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
        .ok_or(polkadot_sdk::sp_runtime::DispatchError::Other(
          "insufficient buffer",
        ))?;
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
  fn trip_halt(cause: HaltKind) {
    HALTED.with(|v| *v.borrow_mut() = Some(cause));
  }
}

pub struct MockGates;
impl SolvencyGates for MockGates {
  fn evaluate() -> GateStatus {
    GateStatus {
      runway_months: 0,
      runway_ok: RUNWAY_OK.with(|v| *v.borrow()),
      coverage_ok: COVERAGE_OK.with(|v| *v.borrow()),
      price_ok: true,
    }
  }
  fn burn_ratio_for(status: &GateStatus) -> Permill {
    if status.all_ok() {
      primitives::ecosystem::params::BURN_RATIO_HEALTHY
    } else {
      primitives::ecosystem::params::BURN_RATIO_REDUCED
    }
  }
  fn required_buffer() -> u128 {
    REQUIRED_BUFFER.with(|v| *v.borrow())
  }
  fn record_snapshot() {}
}

pub struct MockBuybackSink;
impl pallet_allocation_router::BuybackFunding for MockBuybackSink {
  fn fund(amount: u128) -> DispatchResult {
    BUYBACK_FUNDED.with(|v| *v.borrow_mut() += amount);
    Ok(())
  }
}

pub struct MockDcaSink;
impl pallet_allocation_router::AccumulationFunding for MockDcaSink {
  fn fund_budget(amount: u128) -> DispatchResult {
    DCA_FUNDED.with(|v| *v.borrow_mut() += amount);
    Ok(())
  }
}

pub struct MockLiquidityGauge;
impl pallet_allocation_router::PoolDepthOracle for MockLiquidityGauge {
  fn pool_depth() -> u128 {
    POOL_DEPTH.with(|v| *v.borrow())
  }
  fn protocol_ownership() -> Permill {
    GAUGE_OWNERSHIP.with(|v| *v.borrow())
  }
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    AllocationRouter: pallet_allocation_router,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
}

pub struct DcaResidualShareStub;
impl Get<Permill> for DcaResidualShareStub {
  fn get() -> Permill {
    Permill::from_percent(40)
  }
}

impl pallet_allocation_router::Config for Test {
  type Ledger = MockLedger;
  type Gates = MockGates;
  type BuybackSink = MockBuybackSink;
  type DcaSink = MockDcaSink;
  type LiquidityGauge = MockLiquidityGauge;
  type LiquidityBudgetCeiling = ConstU128<1_000>;
  type DcaCycleCeiling = ConstU128<5_000>;
  type BuybackFundingCeiling = ConstU128<8_000>;
  type MinPoolDepth = ConstU128<500>;
  type DcaResidualShare = DcaResidualShareStub;
  type CyclePeriod = ConstU64<100>;
  type AdminOrigin = frame_system::EnsureRoot<u64>;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  pallet_allocation_router::GenesisConfig::<Test> {
    target_ownership: Permill::zero(),
    _marker: Default::default(),
  }
  .assimilate_storage(&mut t)
  .unwrap();

  reset_doubles();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| System::set_block_number(1));
  ext
}
