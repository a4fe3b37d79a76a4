extern crate alloc;

use crate as pallet_note_issuance;
use pallet_solvency_gates::{GateStatus, SolvencyGates};
use pallet_treasury_ledger::{AccumulationHoldings, HaltKind, TreasuryInspect, TreasuryMutate};
use polkadot_sdk::frame_support::{
  construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, ConstU128},
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
    pub static NOTE_PRINCIPAL: RefCell<u128> = const { RefCell::new(0) };

    // Gate double
    pub static COVERAGE_OK: RefCell<bool> = const { RefCell::new(true) };
}

pub const USDC_ID: u32 = well_known::USDC;
pub const USDC: AssetKind = AssetKind::Local(USDC_ID);
pub const TREASURY_ACCOUNT: u64 = 999;

pub fn buffer_of(asset: AssetKind) -> u128 {
  BUFFERS.with(|b| b.borrow().get(&asset).copied().unwrap_or(0))
}

pub fn note_principal() -> u128 {
  NOTE_PRINCIPAL.with(|v| *v.borrow())
}

pub fn set_coverage_ok(value: bool) {
  COVERAGE_OK.with(|v| *v.borrow_mut() = value);
}

fn reset_doubles() {
  BUFFERS.with(|b| b.borrow_mut().clear());
  NOTE_PRINCIPAL.with(|v| *v.borrow_mut() = 0);
  set_coverage_ok(true);
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
    note_principal()
  }
  fn monthly_obligation() -> u128 {
    0
  }
  fn reference_price() -> Option<u128> {
    None
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
  fn debit_buffer(_asset: AssetKind, _amount: u128) -> DispatchResult {
    Ok(())
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
  fn increase_note_principal(amount: u128) -> DispatchResult {
    NOTE_PRINCIPAL.with(|v| *v.borrow_mut() += amount);
    Ok(())
  }
  fn decrease_note_principal(amount: u128) -> DispatchResult {
    NOTE_PRINCIPAL.with(|v| *v.borrow_mut() -= amount);
    Ok(())
  }
  fn trip_halt(_cause: HaltKind) {}
}

pub struct MockGates;
impl SolvencyGates for MockGates {
  fn evaluate() -> GateStatus {
    let coverage_ok = COVERAGE_OK.with(|v| *v.borrow());
    GateStatus {
      runway_months: 12,
      runway_ok: true,
      coverage_ok,
      price_ok: true,
    }
  }
  fn burn_ratio_for(_status: &GateStatus) -> Permill {
    primitives::ecosystem::params::BURN_RATIO_HEALTHY
  }
  fn required_buffer() -> u128 {
    0
  }
  fn record_snapshot() {}
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    NoteIssuance: pallet_note_issuance,
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

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type ReserveData = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = AssetBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct AssetBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl polkadot_sdk::pallet_assets::BenchmarkHelper<u32, ()> for AssetBenchmarkHelper {
  fn create_asset_id_parameter(id: u32) -> u32 {
    id
  }
  fn create_reserve_id_parameter(_id: u32) -> () {
    ()
  }
}

pub struct TreasuryAccountStub;
impl polkadot_sdk::frame_support::traits::Get<u64> for TreasuryAccountStub {
  fn get() -> u64 {
    TREASURY_ACCOUNT
  }
}

impl pallet_note_issuance::Config for Test {
  type Assets = Assets;
  type Ledger = MockLedger;
  type Gates = MockGates;
  type TreasuryAccount = TreasuryAccountStub;
  type BlocksPerMonth = ConstU64<10>;
  type DefaultMinSubscription = ConstU128<100>;
  type DefaultMaxSubscription = ConstU128<10_000>;
  type MaxOpenTranches = ConstU32<32>;
  type AdminOrigin = frame_system::EnsureRoot<u64>;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: alloc::vec![(USDC_ID, 1, true, 1)],
    metadata: alloc::vec![],
    accounts: alloc::vec![
      (USDC_ID, 1, 1_000_000),
      (USDC_ID, 2, 1_000_000),
    ],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  reset_doubles();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| System::set_block_number(1));
  ext
}
