use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_runtime::Permill;
use primitives::{AssetKind, well_known};

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn record_inflow() {
    let asset = AssetKind::Local(well_known::USDC);

    #[extrinsic_call]
    record_inflow(RawOrigin::Root, asset, 10_000);
  }

  #[benchmark]
  fn set_target_ownership() {
    #[extrinsic_call]
    set_target_ownership(RawOrigin::Root, Permill::from_percent(30));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
