use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_runtime::Permill;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn create_tranche() {
    #[extrinsic_call]
    create_tranche(RawOrigin::Root, 1_000_000, Permill::from_percent(6), 12);
  }

  #[benchmark]
  fn pause_tranche() {
    pallet::Pallet::<T>::create_tranche(
      RawOrigin::Root.into(),
      1_000_000,
      Permill::from_percent(6),
      12,
    )
    .expect("tranche creation failed");

    #[extrinsic_call]
    pause_tranche(RawOrigin::Root, 0);
  }

  #[benchmark]
  fn resume_tranche() {
    pallet::Pallet::<T>::create_tranche(
      RawOrigin::Root.into(),
      1_000_000,
      Permill::from_percent(6),
      12,
    )
    .expect("tranche creation failed");
    pallet::Pallet::<T>::pause_tranche(RawOrigin::Root.into(), 0).expect("pause failed");

    #[extrinsic_call]
    resume_tranche(RawOrigin::Root, 0);
  }

  #[benchmark]
  fn close_tranche() {
    pallet::Pallet::<T>::create_tranche(
      RawOrigin::Root.into(),
      1_000_000,
      Permill::from_percent(6),
      12,
    )
    .expect("tranche creation failed");
    Tranches::<T>::mutate(0, |maybe| {
      if let Some(tranche) = maybe {
        tranche.status = TrancheStatus::Matured;
      }
    });

    #[extrinsic_call]
    close_tranche(RawOrigin::Root, 0);
  }

  #[benchmark]
  fn set_subscription_bounds() {
    #[extrinsic_call]
    set_subscription_bounds(RawOrigin::Root, 10, 1_000_000);
  }

  #[benchmark]
  fn subscribe() {
    // The deposit transfer dominates; exercising the rejected path keeps the
    // benchmark venue-independent
    let caller: T::AccountId = whitelisted_caller();
    pallet::Pallet::<T>::create_tranche(
      RawOrigin::Root.into(),
      1_000_000,
      Permill::from_percent(6),
      12,
    )
    .expect("tranche creation failed");

    #[block]
    {
      let _ = pallet::Pallet::<T>::subscribe(
        RawOrigin::Signed(caller).into(),
        0,
        primitives::AssetKind::Local(primitives::well_known::USDC),
        1_000,
      );
    }
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
