#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn create_tranche() -> Weight;
	fn subscribe() -> Weight;
	fn pause_tranche() -> Weight;
	fn resume_tranche() -> Weight;
	fn close_tranche() -> Weight;
	fn set_subscription_bounds() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn create_tranche() -> Weight {
		Weight::from_parts(30_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(3))
	}
	fn subscribe() -> Weight {
		Weight::from_parts(90_000_000, 6000)
			.saturating_add(T::DbWeight::get().reads(10))
			.saturating_add(T::DbWeight::get().writes(7))
	}
	fn pause_tranche() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn resume_tranche() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn close_tranche() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn set_subscription_bounds() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(2))
	}
}

impl WeightInfo for () {
	fn create_tranche() -> Weight {
		Weight::from_parts(30_000_000, 3000)
	}
	fn subscribe() -> Weight {
		Weight::from_parts(90_000_000, 6000)
	}
	fn pause_tranche() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn resume_tranche() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn close_tranche() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn set_subscription_bounds() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
}
