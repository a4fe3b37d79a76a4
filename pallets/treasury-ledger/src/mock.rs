extern crate alloc;

use crate as pallet_treasury_ledger;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{AssetKind, ecosystem::params::PRECISION, well_known};
use std::cell::RefCell;

// State container for the stateful oracle mock
thread_local! {
    // Reserve-asset quote: (price, as_of)
    pub static ORACLE_QUOTE: RefCell<Option<(u128, u64)>> = const { RefCell::new(None) };
}

pub fn set_oracle_quote(price: u128, as_of: u64) {
  ORACLE_QUOTE.with(|q| *q.borrow_mut() = Some((price, as_of)));
}

pub fn clear_oracle_quote() {
  ORACLE_QUOTE.with(|q| *q.borrow_mut() = None);
}

pub const USDC: AssetKind = AssetKind::Local(well_known::USDC);
pub const DAI: AssetKind = AssetKind::Local(well_known::DAI);
pub const RSV: AssetKind = AssetKind::Local(well_known::RSV);

pub const MONTHLY_OBLIGATION: u128 = 2_000 * PRECISION;

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    TreasuryLedger: pallet_treasury_ledger,
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

pub struct MockOracle;
impl pallet_treasury_ledger::PriceOracle<u64> for MockOracle {
  fn reference_price(asset: AssetKind) -> Option<(u128, u64)> {
    if asset != RSV {
      return None;
    }
    ORACLE_QUOTE.with(|q| *q.borrow())
  }
}

pub struct PalletIdStub;
impl Get<PalletId> for PalletIdStub {
  fn get() -> PalletId {
    PalletId(*primitives::ecosystem::pallet_ids::TREASURY_LEDGER_PALLET_ID)
  }
}

pub struct ReserveAssetStub;
impl Get<AssetKind> for ReserveAssetStub {
  fn get() -> AssetKind {
    RSV
  }
}

impl pallet_treasury_ledger::Config for Test {
  type PalletId = PalletIdStub;
  type ReserveAsset = ReserveAssetStub;
  type PriceStalenessWindow = ConstU64<600>;
  type MaxBufferAssets = ConstU32<16>;
  type Oracle = MockOracle;
  type AdminOrigin = frame_system::EnsureRoot<u64>;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  pallet_treasury_ledger::GenesisConfig::<Test> {
    supported_assets: alloc::vec![USDC, DAI],
    monthly_obligation: MONTHLY_OBLIGATION,
    _marker: Default::default(),
  }
  .assimilate_storage(&mut t)
  .unwrap();

  clear_oracle_quote();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| System::set_block_number(1));
  ext
}
