#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn execute() -> Weight;
	fn set_cycle_ceiling() -> Weight;
	fn set_staking_ratio() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn execute() -> Weight {
		Weight::from_parts(90_000_000, 5000)
			.saturating_add(T::DbWeight::get().reads(10))
			.saturating_add(T::DbWeight::get().writes(6))
	}
	fn set_cycle_ceiling() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn set_staking_ratio() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
}

impl WeightInfo for () {
	fn execute() -> Weight {
		Weight::from_parts(90_000_000, 5000)
	}
	fn set_cycle_ceiling() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
	fn set_staking_ratio() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
}
