use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_runtime::Permill;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn set_runway_threshold() {
    #[extrinsic_call]
    set_runway_threshold(RawOrigin::Root, 9);
  }

  #[benchmark]
  fn set_coverage_threshold() {
    #[extrinsic_call]
    set_coverage_threshold(RawOrigin::Root, 150, 100);
  }

  #[benchmark]
  fn set_burn_ratios() {
    #[extrinsic_call]
    set_burn_ratios(
      RawOrigin::Root,
      Permill::from_percent(90),
      Permill::from_percent(40),
    );
  }

  #[benchmark]
  fn snapshot() {
    let caller: T::AccountId = whitelisted_caller();
    // Second snapshot is the worst case: prior state comparison + flip events
    <pallet::Pallet<T> as crate::SolvencyGates>::record_snapshot();

    #[extrinsic_call]
    snapshot(RawOrigin::Signed(caller));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
