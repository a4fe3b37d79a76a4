//! Allocation Router Pallet
//!
//! The central scheduler of the treasury policy. Consumes one inflow at a time
//! and deterministically partitions it across competing uses in strict priority
//! order: buffer top-up, liquidity reservation, then the capped residual split
//! between accumulation and buyback funding. The full plan is built and checked
//! for conservation before a single balance moves.
//!
//! The router also owns the protocol-owned-liquidity position; the buyback
//! engine records contributions through the [`PolRegistry`] seam instead of
//! holding its own copy.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame::deps::sp_runtime::DispatchResult;
use polkadot_sdk::sp_runtime::Permill;
use primitives::AssetKind;
use scale_info::TypeInfo;

/// Destination of one allocation plan entry.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum AllocationPurpose {
  /// Buffer top-up to the required runway, ahead of everything else
  BufferTopUp,
  /// Reserved liquidity-pairing budget (earmarked inside the buffer)
  LiquidityReserve,
  /// Accumulation (DCA) budget (earmarked inside the buffer)
  Accumulation,
  /// Transfer into the buyback pool
  BuybackFunding,
  /// Cap overflow and rounding residue, back into the buffer
  BufferResidual,
}

/// One `(purpose, amount)` pair of an allocation plan.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub struct AllocationEntry {
  pub purpose: AllocationPurpose,
  pub amount: u128,
}

/// Protocol-owned liquidity bookkeeping.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
)]
pub struct PolPosition {
  /// LP units held by the protocol
  pub lp_units: u128,
  /// Protocol tokens contributed across all pairings
  pub contributed_base: u128,
  /// Buffer currency contributed across all pairings
  pub contributed_pair: u128,
  /// Share of the external pool the protocol currently owns
  pub current_ownership: Permill,
  /// Governed ownership target
  pub target_ownership: Permill,
}

/// Funding seam into the buyback pool, implemented by the buyback engine.
pub trait BuybackFunding {
  fn fund(amount: u128) -> DispatchResult;
}

/// Funding seam into the accumulation budget, implemented by the DCA engine.
pub trait AccumulationFunding {
  fn fund_budget(amount: u128) -> DispatchResult;
}

/// External liquidity gauge: pool depth and the protocol's share of it.
pub trait PoolDepthOracle {
  fn pool_depth() -> u128;
  fn protocol_ownership() -> Permill;
}

/// Entry points the cycle orchestrator drives.
pub trait InflowAllocator {
  /// Partition one inflow, already denominated in a buffer currency.
  fn allocate(asset: AssetKind, amount: u128) -> DispatchResult;

  /// Refresh the POL ownership reading from the liquidity gauge.
  fn sync_ownership();

  /// Buffer value currently earmarked for liquidity pairing.
  fn reserved_liquidity_budget() -> u128;
}

/// POL bookkeeping seam for the buyback engine. The router owns the position;
/// the engine only reports contributions and draws down the reserved budget.
pub trait PolRegistry {
  fn record_contribution(base: u128, pair: u128, lp_units: u128) -> DispatchResult;

  /// Draw up to `value` from the reserved liquidity budget; returns the
  /// amount actually consumed.
  fn consume_liquidity_budget(value: u128) -> u128;

  /// Return an unused draw-down after a failed pairing.
  fn restore_liquidity_budget(value: u128);

  fn pol_underweight() -> bool;
}

#[frame::pallet]
pub mod pallet {
  use super::{
    AccumulationFunding, AllocationEntry, AllocationPurpose, BuybackFunding, PolPosition,
    PoolDepthOracle, WeightInfo,
  };
  use frame::prelude::*;
  use pallet_solvency_gates::SolvencyGates;
  use pallet_treasury_ledger::{HaltKind, TreasuryInspect, TreasuryMutate};
  use polkadot_sdk::sp_runtime::Permill;
  use polkadot_sdk::sp_runtime::traits::Zero as _;
  use primitives::AssetKind;

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// The treasury ledger, sole holder of buffer balances
    type Ledger: TreasuryMutate;

    /// Solvency gate evaluation
    type Gates: SolvencyGates;

    /// Buyback pool funding seam
    type BuybackSink: crate::BuybackFunding;

    /// Accumulation budget funding seam
    type DcaSink: crate::AccumulationFunding;

    /// External pool depth / ownership gauge
    type LiquidityGauge: crate::PoolDepthOracle;

    /// Per-cycle ceiling on the liquidity-pairing reservation
    #[pallet::constant]
    type LiquidityBudgetCeiling: Get<u128>;

    /// Per-cycle ceiling on accumulation funding
    #[pallet::constant]
    type DcaCycleCeiling: Get<u128>;

    /// Per-cycle ceiling on buyback-pool funding
    #[pallet::constant]
    type BuybackFundingCeiling: Get<u128>;

    /// Minimum external pool depth; below it the router keeps reserving
    #[pallet::constant]
    type MinPoolDepth: Get<u128>;

    /// Accumulation share of the residual split; buyback takes the complement
    #[pallet::constant]
    type DcaResidualShare: Get<Permill>;

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

  /// An allocation plan: ordered entries summing exactly to the inflow.
  pub type AllocationPlan = BoundedVec<AllocationEntry, ConstU32<5>>;

  /// Per-cycle cap accounting, reset on cycle rollover.
  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Default, Encode, Eq, MaxEncodedLen,
    PartialEq, TypeInfo,
  )]
  pub struct CycleSpendTracker<BlockNumber> {
    pub cycle: BlockNumber,
    pub dca: Balance,
    pub buyback: Balance,
    pub liquidity: Balance,
  }

  /// Protocol-owned liquidity position
  #[pallet::storage]
  #[pallet::getter(fn pol_position)]
  pub type Pol<T: Config> = StorageValue<_, PolPosition, ValueQuery>;

  /// Buffer value earmarked for liquidity pairing, waiting for a buyback
  #[pallet::storage]
  #[pallet::getter(fn reserved_liquidity_budget_value)]
  pub type ReservedLiquidityBudget<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Running per-cycle cap usage
  #[pallet::storage]
  #[pallet::getter(fn cycle_spend)]
  pub type CycleSpend<T: Config> =
    StorageValue<_, CycleSpendTracker<BlockNumberFor<T>>, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// An inflow was partitioned and applied
    InflowAllocated {
      asset: AssetKind,
      inflow: Balance,
      plan: AllocationPlan,
    },
    /// The liquidity budget earmark grew
    LiquidityBudgetReserved { amount: Balance, total: Balance },
    /// The buyback engine drew from the liquidity budget
    LiquidityBudgetConsumed { amount: Balance, remaining: Balance },
    /// An unused draw-down was returned after a failed pairing
    LiquidityBudgetRestored { amount: Balance, total: Balance },
    /// A POL contribution was recorded
    PolContributionRecorded {
      base: Balance,
      pair: Balance,
      lp_units: Balance,
    },
    /// POL ownership reading refreshed from the gauge
    PolOwnershipSynced {
      current: Permill,
      target: Permill,
    },
    /// Governance changed the ownership target
    PolTargetUpdated { old: Permill, new: Permill },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Inflow asset is not a supported buffer currency
    UnsupportedAsset,
    /// Inflow amount must be non-zero
    ZeroInflow,
    /// The built plan did not sum to the inflow; the ledger is halted
    ConservationViolated,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Record an out-of-band inflow and run the allocation (governance only).
    /// Scheduled inflows arrive through the cycle orchestrator instead.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::record_inflow())]
    pub fn record_inflow(
      origin: OriginFor<T>,
      asset: AssetKind,
      amount: Balance,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(!amount.is_zero(), Error::<T>::ZeroInflow);
      Self::do_allocate(asset, amount)
    }

    /// Update the POL ownership target (governance only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_target_ownership())]
    pub fn set_target_ownership(origin: OriginFor<T>, new: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = Pol::<T>::mutate(|pol| {
        let old = pol.target_ownership;
        pol.target_ownership = new;
        old
      });
      Self::deposit_event(Event::PolTargetUpdated { old, new });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    fn current_cycle() -> BlockNumberFor<T> {
      let now = frame_system::Pallet::<T>::block_number();
      let period = T::CyclePeriod::get();
      if period.is_zero() { now } else { now / period }
    }

    /// Cap tracker for the current cycle; usage from earlier cycles is dropped.
    fn current_tracker() -> CycleSpendTracker<BlockNumberFor<T>> {
      let cycle = Self::current_cycle();
      let tracker = CycleSpend::<T>::get();
      if tracker.cycle == cycle {
        tracker
      } else {
        CycleSpendTracker {
          cycle,
          ..Default::default()
        }
      }
    }

    fn liquidity_reserve_needed() -> bool {
      let pol = Pol::<T>::get();
      pol.current_ownership < pol.target_ownership
        || T::LiquidityGauge::pool_depth() < T::MinPoolDepth::get()
    }

    /// Build and apply the plan for one inflow. The plan is validated for
    /// conservation before any balance moves; a mismatch trips the ledger
    /// fail-stop instead of applying a corrupt split.
    pub(crate) fn do_allocate(asset: AssetKind, inflow: Balance) -> DispatchResult {
      ensure!(T::Ledger::is_buffer_asset(asset), Error::<T>::UnsupportedAsset);
      if inflow.is_zero() {
        return Ok(());
      }

      let status = T::Gates::evaluate();
      let mut tracker = Self::current_tracker();
      let mut plan = AllocationPlan::default();
      let mut remainder = inflow;

      let push = |plan: &mut AllocationPlan, purpose, amount| {
        if amount > 0 {
          plan
            .try_push(AllocationEntry { purpose, amount })
            .expect("plan holds at most one entry per purpose");
        }
      };

      // Step 1: buffer top-up to required runway. Consuming the whole inflow
      // here is the intended fail-safe, not an error.
      if !status.runway_ok {
        let deficit = T::Gates::required_buffer().saturating_sub(T::Ledger::buffer_total());
        let topup = remainder.min(deficit);
        push(&mut plan, AllocationPurpose::BufferTopUp, topup);
        remainder -= topup;
      }

      // Step 2: bounded liquidity reservation while POL is underweight or the
      // external pool is shallow. Reserved, not spent: the buyback engine
      // matches it against its non-burn share later.
      if !remainder.is_zero() && Self::liquidity_reserve_needed() {
        let headroom = T::LiquidityBudgetCeiling::get().saturating_sub(tracker.liquidity);
        let reserved = remainder.min(headroom);
        push(&mut plan, AllocationPurpose::LiquidityReserve, reserved);
        remainder -= reserved;
        tracker.liquidity = tracker.liquidity.saturating_add(reserved);
      }

      // Step 3: residual split. The buyback share is the exact complement of
      // the DCA share, so the two always reassemble the remainder; per-cycle
      // cap overflow falls back into the buffer.
      if !remainder.is_zero() {
        let dca_share = T::DcaResidualShare::get().mul_floor(remainder);
        let buyback_share = remainder - dca_share;
        let dca_amount = dca_share.min(T::DcaCycleCeiling::get().saturating_sub(tracker.dca));
        let buyback_amount =
          buyback_share.min(T::BuybackFundingCeiling::get().saturating_sub(tracker.buyback));
        let residue = remainder - dca_amount - buyback_amount;

        push(&mut plan, AllocationPurpose::Accumulation, dca_amount);
        push(&mut plan, AllocationPurpose::BuybackFunding, buyback_amount);
        push(&mut plan, AllocationPurpose::BufferResidual, residue);
        tracker.dca = tracker.dca.saturating_add(dca_amount);
        tracker.buyback = tracker.buyback.saturating_add(buyback_amount);
      }

      // Conservation gate: no value dropped, none double-counted. A mismatch
      // is a logic defect: halt the ledger rather than apply it.
      let total: Balance = plan.iter().map(|entry| entry.amount).sum();
      if total != inflow {
        T::Ledger::trip_halt(HaltKind::AllocationMismatch);
        return Err(Error::<T>::ConservationViolated.into());
      }

      for entry in plan.iter() {
        match entry.purpose {
          AllocationPurpose::BufferTopUp | AllocationPurpose::BufferResidual => {
            T::Ledger::credit_buffer(asset, entry.amount)?;
          }
          AllocationPurpose::LiquidityReserve => {
            T::Ledger::credit_buffer(asset, entry.amount)?;
            let total = ReservedLiquidityBudget::<T>::mutate(|budget| {
              *budget = budget.saturating_add(entry.amount);
              *budget
            });
            Self::deposit_event(Event::LiquidityBudgetReserved {
              amount: entry.amount,
              total,
            });
          }
          AllocationPurpose::Accumulation => {
            T::Ledger::credit_buffer(asset, entry.amount)?;
            T::DcaSink::fund_budget(entry.amount)?;
          }
          AllocationPurpose::BuybackFunding => {
            T::BuybackSink::fund(entry.amount)?;
          }
        }
      }
      CycleSpend::<T>::put(tracker);

      Self::deposit_event(Event::InflowAllocated {
        asset,
        inflow,
        plan,
      });
      Ok(())
    }
  }

  impl<T: Config> crate::InflowAllocator for Pallet<T> {
    fn allocate(asset: AssetKind, amount: u128) -> DispatchResult {
      Self::do_allocate(asset, amount)
    }

    fn sync_ownership() {
      let current = T::LiquidityGauge::protocol_ownership();
      let target = Pol::<T>::mutate(|pol| {
        pol.current_ownership = current;
        pol.target_ownership
      });
      Self::deposit_event(Event::PolOwnershipSynced { current, target });
    }

    fn reserved_liquidity_budget() -> u128 {
      ReservedLiquidityBudget::<T>::get()
    }
  }

  impl<T: Config> crate::PolRegistry for Pallet<T> {
    fn record_contribution(base: u128, pair: u128, lp_units: u128) -> DispatchResult {
      Pol::<T>::mutate(|pol| {
        pol.lp_units = pol.lp_units.saturating_add(lp_units);
        pol.contributed_base = pol.contributed_base.saturating_add(base);
        pol.contributed_pair = pol.contributed_pair.saturating_add(pair);
      });
      Self::deposit_event(Event::PolContributionRecorded {
        base,
        pair,
        lp_units,
      });
      Ok(())
    }

    fn consume_liquidity_budget(value: u128) -> u128 {
      let mut consumed = 0;
      let remaining = ReservedLiquidityBudget::<T>::mutate(|budget| {
        consumed = value.min(*budget);
        *budget -= consumed;
        *budget
      });
      if consumed > 0 {
        Self::deposit_event(Event::LiquidityBudgetConsumed {
          amount: consumed,
          remaining,
        });
      }
      consumed
    }

    fn restore_liquidity_budget(value: u128) {
      if value == 0 {
        return;
      }
      let total = ReservedLiquidityBudget::<T>::mutate(|budget| {
        *budget = budget.saturating_add(value);
        *budget
      });
      Self::deposit_event(Event::LiquidityBudgetRestored {
        amount: value,
        total,
      });
    }

    fn pol_underweight() -> bool {
      let pol = Pol::<T>::get();
      pol.current_ownership < pol.target_ownership
    }
  }

  /// Genesis configuration: the initial POL ownership target
  #[pallet::genesis_config]
  pub struct GenesisConfig<T: Config> {
    pub target_ownership: Permill,
    pub _marker: core::marker::PhantomData<T>,
  }

  impl<T: Config> Default for GenesisConfig<T> {
    fn default() -> Self {
      Self {
        target_ownership: Permill::zero(),
        _marker: Default::default(),
      }
    }
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      Pol::<T>::put(PolPosition {
        target_ownership: self.target_ownership,
        ..Default::default()
      });
    }
  }
}
