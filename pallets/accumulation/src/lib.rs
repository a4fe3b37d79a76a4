//! Accumulation Pallet
//!
//! Periodic, capped conversion of buffer surplus into the reserve asset at the
//! ledger's reference price, followed by a separate staking rebalance toward
//! the governed target ratio. The rebalance is skippable: a failed staking
//! call leaves the holding liquid, which is always a safe state.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame::deps::sp_runtime::DispatchError;
use primitives::AssetKind;
use scale_info::TypeInfo;

/// Why a DCA attempt deferred without converting.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum DcaSkipReason {
  /// No budget earmarked by the router
  NoBudget,
  /// Buffer holds no surplus over the required runway
  NoSurplus,
  /// No fresh reference price
  PriceStale,
  /// The per-cycle conversion ceiling is exhausted
  CycleCapReached,
}

/// External call site that failed, for telemetry.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum DcaCallStage {
  Conversion,
  Staking,
}

/// Result of one DCA attempt.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum DcaOutcome {
  Executed {
    spent: u128,
    acquired: u128,
    staked: u128,
  },
  Skipped(DcaSkipReason),
  Failed,
}

/// External venue converting buffer currency into the reserve asset.
pub trait ConversionVenue<AccountId> {
  fn convert_to_reserve(
    who: &AccountId,
    stable: AssetKind,
    amount: u128,
    min_out: u128,
  ) -> Result<u128, DispatchError>;
}

/// External staking adapter for the reserve asset.
pub trait StakingAdapter {
  fn stake(amount: u128) -> Result<u128, DispatchError>;
  fn unstake(units: u128) -> Result<u128, DispatchError>;
}

/// Execution surface driven by the cycle orchestrator.
pub trait AccumulationExecutor {
  fn execute_dca() -> Result<DcaOutcome, DispatchError>;
  fn pending_budget() -> u128;
}

#[frame::pallet]
pub mod pallet {
  use super::{
    ConversionVenue, DcaCallStage, DcaOutcome, DcaSkipReason, StakingAdapter, WeightInfo,
  };
  use frame::prelude::*;
  use pallet_solvency_gates::SolvencyGates;
  use pallet_treasury_ledger::{TreasuryInspect, TreasuryMutate};
  use polkadot_sdk::sp_core::U256;
  use polkadot_sdk::sp_runtime::Permill;
  use polkadot_sdk::sp_runtime::traits::{AccountIdConversion, Zero as _};
  use primitives::{AssetKind, ecosystem::params::PRECISION};

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// The treasury ledger
    type Ledger: TreasuryMutate;

    /// Solvency gates (required-buffer computation)
    type Gates: SolvencyGates;

    /// External conversion venue
    type Venue: ConversionVenue<Self::AccountId>;

    /// External staking adapter
    type Staking: StakingAdapter;

    /// The pallet ID for the conversion agent account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Buffer currency spent on conversions
    #[pallet::constant]
    type SpendAsset: Get<AssetKind>;

    /// Maximum slippage tolerated on conversions
    #[pallet::constant]
    type MaxSlippage: Get<Permill>;

    /// Default per-cycle conversion ceiling
    #[pallet::constant]
    type DefaultCycleCeiling: Get<u128>;

    /// Default target share of holdings kept staked
    #[pallet::constant]
    type DefaultStakingRatio: Get<Permill>;

    /// Scheduling period used for per-cycle cap accounting
    #[pallet::constant]
    type CyclePeriod: Get<BlockNumberFor<Self>>;

    /// Origin that can perform governance operations
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  pub type Balance = u128;

  /// Per-cycle conversion accounting, reset on rollover.
  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Default, Encode, Eq, MaxEncodedLen,
    PartialEq, TypeInfo,
  )]
  pub struct CycleConversion<BlockNumber> {
    pub cycle: BlockNumber,
    pub amount: Balance,
  }

  /// Budget earmarked by the router, waiting to convert
  #[pallet::storage]
  #[pallet::getter(fn pending_budget_value)]
  pub type PendingBudget<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Running per-cycle conversion total
  #[pallet::storage]
  #[pallet::getter(fn cycle_conversion)]
  pub type CycleConverted<T: Config> =
    StorageValue<_, CycleConversion<BlockNumberFor<T>>, ValueQuery>;

  /// Per-cycle conversion ceiling (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn cycle_ceiling)]
  pub type CycleCeiling<T: Config> = StorageValue<_, Balance, ValueQuery, T::DefaultCycleCeiling>;

  /// Target staked share of accumulation holdings (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn staking_ratio)]
  pub type StakingRatio<T: Config> = StorageValue<_, Permill, ValueQuery, T::DefaultStakingRatio>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// The router earmarked budget for conversion
    BudgetFunded { amount: Balance, total: Balance },
    /// A conversion executed
    DcaExecuted {
      spent: Balance,
      acquired: Balance,
      price: Balance,
    },
    /// Conversion deferred; the reported condition was unmet
    DcaSkipped { reason: DcaSkipReason },
    /// An external call failed; state is untouched and the attempt repeats
    ExternalCallFailed { stage: DcaCallStage },
    /// Liquid holdings moved toward the staking target
    StakingRebalanced { moved: Balance, units: Balance },
    /// Cycle ceiling updated
    CycleCeilingUpdated { old: Balance, new: Balance },
    /// Staking ratio updated
    StakingRatioUpdated { old: Permill, new: Permill },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Funding amount must be non-zero
    ZeroAmount,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Attempt a DCA conversion. Permissionless keeper poke.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::execute())]
    pub fn execute(origin: OriginFor<T>) -> DispatchResult {
      let _who = ensure_signed(origin)?;
      let _ = Self::do_execute()?;
      Ok(())
    }

    /// Update the per-cycle conversion ceiling (governance only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_cycle_ceiling())]
    pub fn set_cycle_ceiling(origin: OriginFor<T>, new: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = CycleCeiling::<T>::get();
      CycleCeiling::<T>::put(new);
      Self::deposit_event(Event::CycleCeilingUpdated { old, new });
      Ok(())
    }

    /// Update the target staking ratio (governance only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::set_staking_ratio())]
    pub fn set_staking_ratio(origin: OriginFor<T>, new: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = StakingRatio::<T>::get();
      StakingRatio::<T>::put(new);
      Self::deposit_event(Event::StakingRatioUpdated { old, new });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Conversion agent account derived from the pallet ID
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    fn mul_div(a: Balance, b: Balance, c: Balance) -> Balance {
      if c.is_zero() {
        return 0;
      }
      let wide = U256::from(a) * U256::from(b) / U256::from(c);
      Balance::try_from(wide).unwrap_or(Balance::MAX)
    }

    fn current_cycle() -> BlockNumberFor<T> {
      let now = frame_system::Pallet::<T>::block_number();
      let period = T::CyclePeriod::get();
      if period.is_zero() { now } else { now / period }
    }

    fn current_tracker() -> CycleConversion<BlockNumberFor<T>> {
      let cycle = Self::current_cycle();
      let tracker = CycleConverted::<T>::get();
      if tracker.cycle == cycle {
        tracker
      } else {
        CycleConversion { cycle, amount: 0 }
      }
    }

    fn skip(reason: DcaSkipReason) -> Result<DcaOutcome, DispatchError> {
      Self::deposit_event(Event::DcaSkipped { reason });
      Ok(DcaOutcome::Skipped(reason))
    }

    /// One capped conversion attempt plus the separate staking rebalance.
    pub(crate) fn do_execute() -> Result<DcaOutcome, DispatchError> {
      let pending = PendingBudget::<T>::get();
      if pending.is_zero() {
        return Self::skip(DcaSkipReason::NoBudget);
      }
      // Conversion prices off the reference quote; stale means fail closed
      let Some(price) = T::Ledger::reference_price() else {
        return Self::skip(DcaSkipReason::PriceStale);
      };
      let surplus = T::Ledger::buffer_total().saturating_sub(T::Gates::required_buffer());
      if surplus.is_zero() {
        return Self::skip(DcaSkipReason::NoSurplus);
      }
      let mut tracker = Self::current_tracker();
      let headroom = CycleCeiling::<T>::get().saturating_sub(tracker.amount);
      if headroom.is_zero() {
        return Self::skip(DcaSkipReason::CycleCapReached);
      }

      let spend_asset = T::SpendAsset::get();
      let budget = pending
        .min(surplus)
        .min(headroom)
        .min(T::Ledger::buffer_balance(spend_asset));
      if budget.is_zero() {
        // Surplus exists but not in the spend asset
        return Self::skip(DcaSkipReason::NoSurplus);
      }

      let expected = Self::mul_div(budget, PRECISION, price);
      let min_out = expected.saturating_sub(T::MaxSlippage::get().mul_floor(expected));
      let account = Self::account_id();

      let acquired =
        match T::Venue::convert_to_reserve(&account, spend_asset, budget, min_out) {
          Ok(acquired) if !acquired.is_zero() => acquired,
          _ => {
            Self::deposit_event(Event::ExternalCallFailed {
              stage: DcaCallStage::Conversion,
            });
            return Ok(DcaOutcome::Failed);
          }
        };

      // Receipt confirmed; debit the buffer and credit liquid holdings
      T::Ledger::debit_buffer(spend_asset, budget)?;
      T::Ledger::credit_accumulation_liquid(acquired)?;
      PendingBudget::<T>::put(pending - budget);
      tracker.amount = tracker.amount.saturating_add(budget);
      CycleConverted::<T>::put(tracker);
      Self::deposit_event(Event::DcaExecuted {
        spent: budget,
        acquired,
        price,
      });

      let staked = Self::rebalance_staking();
      Ok(DcaOutcome::Executed {
        spent: budget,
        acquired,
        staked,
      })
    }

    /// Move liquid holdings toward the staking target. Separate from the
    /// conversion: a staking failure only skips this step.
    fn rebalance_staking() -> Balance {
      let holdings = T::Ledger::accumulation();
      let target_staked = StakingRatio::<T>::get().mul_floor(holdings.total());
      if target_staked <= holdings.staked {
        return 0;
      }
      let to_stake = (target_staked - holdings.staked).min(holdings.liquid);
      if to_stake.is_zero() {
        return 0;
      }
      match T::Staking::stake(to_stake) {
        Ok(units) => {
          if T::Ledger::shift_liquid_to_staked(to_stake).is_err() {
            return 0;
          }
          Self::deposit_event(Event::StakingRebalanced {
            moved: to_stake,
            units,
          });
          to_stake
        }
        Err(_) => {
          Self::deposit_event(Event::ExternalCallFailed {
            stage: DcaCallStage::Staking,
          });
          0
        }
      }
    }
  }

  impl<T: Config> pallet_allocation_router::AccumulationFunding for Pallet<T> {
    fn fund_budget(amount: u128) -> DispatchResult {
      if amount.is_zero() {
        return Ok(());
      }
      let total = PendingBudget::<T>::mutate(|budget| {
        *budget = budget.saturating_add(amount);
        *budget
      });
      Self::deposit_event(Event::BudgetFunded { amount, total });
      Ok(())
    }
  }

  impl<T: Config> super::AccumulationExecutor for Pallet<T> {
    fn execute_dca() -> Result<DcaOutcome, DispatchError> {
      Self::do_execute()
    }

    fn pending_budget() -> u128 {
      PendingBudget::<T>::get()
    }
  }
}
