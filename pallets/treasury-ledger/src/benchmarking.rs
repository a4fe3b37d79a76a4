use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{AssetKind, well_known};

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn set_monthly_obligation() {
    #[extrinsic_call]
    set_monthly_obligation(RawOrigin::Root, 1_000_000_000_000);
  }

  #[benchmark]
  fn add_buffer_asset() {
    let asset = AssetKind::Local(well_known::USDT);

    #[extrinsic_call]
    add_buffer_asset(RawOrigin::Root, asset);
  }

  #[benchmark]
  fn remove_buffer_asset() {
    let asset = AssetKind::Local(well_known::USDT);
    pallet::Pallet::<T>::add_buffer_asset(RawOrigin::Root.into(), asset)
      .expect("asset registration failed");

    #[extrinsic_call]
    remove_buffer_asset(RawOrigin::Root, asset);
  }

  #[benchmark]
  fn refresh_reference_price() {
    // Worst case is the rejected path: no quote available
    #[block]
    {
      let _ = pallet::Pallet::<T>::do_refresh_reference_price();
    }
  }

  #[benchmark]
  fn record_accumulation_earnings() {
    #[extrinsic_call]
    record_accumulation_earnings(RawOrigin::Root, 1_000_000_000_000);
  }

  #[benchmark]
  fn clear_halt() {
    <pallet::Pallet<T> as TreasuryMutate>::trip_halt(HaltKind::AllocationMismatch);

    #[extrinsic_call]
    clear_halt(RawOrigin::Root);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
