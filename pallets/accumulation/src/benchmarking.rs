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
    // Empty budget: measures the precondition path
    #[extrinsic_call]
    execute(RawOrigin::Signed(caller));
  }

  #[benchmark]
  fn set_cycle_ceiling() {
    #[extrinsic_call]
    set_cycle_ceiling(RawOrigin::Root, 1_000_000_000_000);
  }

  #[benchmark]
  fn set_staking_ratio() {
    #[extrinsic_call]
    set_staking_ratio(RawOrigin::Root, Permill::from_percent(60));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
