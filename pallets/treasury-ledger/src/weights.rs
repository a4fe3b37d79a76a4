#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn set_monthly_obligation() -> Weight;
	fn add_buffer_asset() -> Weight;
	fn remove_buffer_asset() -> Weight;
	fn refresh_reference_price() -> Weight;
	fn record_accumulation_earnings() -> Weight;
	fn clear_halt() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn set_monthly_obligation() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn add_buffer_asset() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn remove_buffer_asset() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn refresh_reference_price() -> Weight {
		Weight::from_parts(25_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn record_accumulation_earnings() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn clear_halt() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(2))
	}
}

impl WeightInfo for () {
	fn set_monthly_obligation() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
	fn add_buffer_asset() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn remove_buffer_asset() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn refresh_reference_price() -> Weight {
		Weight::from_parts(25_000_000, 2000)
	}
	fn record_accumulation_earnings() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn clear_halt() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
}
