use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_runtime::Permill;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn execute() {
    let caller: T::AccountId = whitelisted_caller();
    // Empty pool: measures the precondition path; the venue-bound path is
    // covered by the adapter's own weights
    #[extrinsic_call]
    execute(RawOrigin::Signed(caller));
  }

  #[benchmark]
  fn update_participation_cap() {
    #[extrinsic_call]
    update_participation_cap(RawOrigin::Root, Permill::from_percent(5));
  }

  #[benchmark]
  fn update_min_pool_depth() {
    #[extrinsic_call]
    update_min_pool_depth(RawOrigin::Root, 1_000_000_000_000);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
