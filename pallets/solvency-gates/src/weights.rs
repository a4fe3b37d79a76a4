#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn set_runway_threshold() -> Weight;
	fn set_coverage_threshold() -> Weight;
	fn set_burn_ratios() -> Weight;
	fn snapshot() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn set_runway_threshold() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn set_coverage_threshold() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn set_burn_ratios() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn snapshot() -> Weight {
		Weight::from_parts(40_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(8))
			.saturating_add(T::DbWeight::get().writes(1))
	}
}

impl WeightInfo for () {
	fn set_runway_threshold() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
	fn set_coverage_threshold() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
	fn set_burn_ratios() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
	fn snapshot() -> Weight {
		Weight::from_parts(40_000_000, 3000)
	}
}
