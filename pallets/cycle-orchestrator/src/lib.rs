//! Cycle Orchestrator Pallet
//!
//! Pure sequencer over the treasury policy pallets. Once per scheduling period
//! it runs the gate audit, harvests yield into the allocation router, refreshes
//! the POL reading, triggers the buyback and DCA engines and deploys remaining
//! buffer surplus to the yield venue.
//!
//! Every step is independently idempotent (done-markers per cycle) and
//! independently retryable: an external failure leaves its own step open for a
//! later invocation and never blocks the steps after it. The orchestrator
//! holds no financial state of its own.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame::deps::sp_runtime::{DispatchError, DispatchResult};
use primitives::AssetKind;
use scale_info::TypeInfo;

/// The ordered steps of one scheduling cycle.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum CycleStep {
  /// Gate snapshot + note issuance coverage enforcement
  GateAudit,
  /// Harvest venue yield and allocate it as an inflow
  Harvest,
  /// Refresh the POL ownership reading
  Liquidity,
  /// Buyback execution attempt
  Buyback,
  /// DCA execution attempt
  Dca,
  /// Deploy unencumbered buffer surplus to the yield venue
  SurplusDeploy,
}

/// External call site that failed, for telemetry.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum VenueCallStage {
  Harvest,
  Deposit,
}

/// External yield venue adapter. Deposits and withdrawals move custody only;
/// harvest returns newly accrued yield in the harvest asset.
pub trait YieldVenueAdapter {
  fn harvest() -> Result<u128, DispatchError>;
  fn deposit(asset: AssetKind, amount: u128) -> DispatchResult;
  fn withdraw(asset: AssetKind, amount: u128) -> Result<u128, DispatchError>;
}

#[frame::pallet]
pub mod pallet {
  use super::{CycleStep, VenueCallStage, WeightInfo, YieldVenueAdapter};
  use frame::prelude::*;
  use pallet_accumulation::{AccumulationExecutor, DcaOutcome};
  use pallet_allocation_router::InflowAllocator;
  use pallet_buyback_engine::{BuybackExecutor, BuybackOutcome};
  use pallet_note_issuance::CoverageEnforcer;
  use pallet_solvency_gates::SolvencyGates;
  use pallet_treasury_ledger::TreasuryInspect;
  use polkadot_sdk::sp_runtime::traits::Zero as _;
  use primitives::AssetKind;

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// Solvency gates (audit snapshot + surplus computation)
    type Gates: SolvencyGates;

    /// The allocation router consuming harvested inflows
    type Router: InflowAllocator;

    /// The buyback engine
    type Buyback: BuybackExecutor;

    /// The accumulation (DCA) engine
    type Dca: AccumulationExecutor;

    /// Note issuance coverage enforcement
    type Notes: CoverageEnforcer;

    /// Read access to the treasury aggregate
    type Ledger: TreasuryInspect;

    /// External yield venue
    type YieldVenue: YieldVenueAdapter;

    /// Buffer currency the yield venue pays and accepts
    #[pallet::constant]
    type HarvestAsset: Get<AssetKind>;

    /// Scheduling period in blocks
    #[pallet::constant]
    type CyclePeriod: Get<BlockNumberFor<Self>>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  pub type Balance = u128;

  /// Cycle index each step last completed in
  #[pallet::storage]
  #[pallet::getter(fn step_done_in)]
  pub type StepDone<T: Config> =
    StorageMap<_, Blake2_128Concat, CycleStep, BlockNumberFor<T>, OptionQuery>;

  /// Cycle index of the most recent invocation
  #[pallet::storage]
  #[pallet::getter(fn last_cycle_started)]
  pub type LastCycleStarted<T: Config> = StorageValue<_, BlockNumberFor<T>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A new cycle began
    CycleStarted { cycle: BlockNumberFor<T> },
    /// A step completed for the current cycle
    StepCompleted { step: CycleStep },
    /// A step failed and stays open for retry within the period
    StepFailed { step: CycleStep },
    /// An external venue call failed
    ExternalCallFailed { stage: VenueCallStage },
    /// Harvested yield was allocated as an inflow
    HarvestAllocated { amount: Balance },
    /// Buffer surplus was deployed to the yield venue
    SurplusDeployed { amount: Balance },
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn on_idle(now: BlockNumberFor<T>, remaining_weight: Weight) -> Weight {
      let required = T::WeightInfo::run_cycle();
      if remaining_weight.all_gte(required) {
        Self::do_run_cycle(now);
        required
      } else {
        Weight::zero()
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Drive the current cycle. Permissionless: keepers may call as often as
    /// they like; steps already done this period are skipped.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::run_cycle())]
    pub fn run_cycle(origin: OriginFor<T>) -> DispatchResult {
      let _who = ensure_signed(origin)?;
      let now = frame_system::Pallet::<T>::block_number();
      Self::do_run_cycle(now);
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    fn current_cycle(now: BlockNumberFor<T>) -> BlockNumberFor<T> {
      let period = T::CyclePeriod::get();
      if period.is_zero() { now } else { now / period }
    }

    fn step_pending(step: CycleStep, cycle: BlockNumberFor<T>) -> bool {
      StepDone::<T>::get(step) != Some(cycle)
    }

    fn mark_done(step: CycleStep, cycle: BlockNumberFor<T>) {
      StepDone::<T>::insert(step, cycle);
      Self::deposit_event(Event::StepCompleted { step });
    }

    /// Run every pending step of the cycle `now` falls into. Late invocations
    /// execute exactly the current period; missed periods are not replayed.
    pub(crate) fn do_run_cycle(now: BlockNumberFor<T>) {
      let cycle = Self::current_cycle(now);
      if LastCycleStarted::<T>::get() != Some(cycle) {
        LastCycleStarted::<T>::put(cycle);
        Self::deposit_event(Event::CycleStarted { cycle });
      }

      // Step 1: audit. Records the gate snapshot and applies the coverage
      // verdict to open note tranches.
      if Self::step_pending(CycleStep::GateAudit, cycle) {
        T::Gates::record_snapshot();
        T::Notes::enforce_coverage();
        Self::mark_done(CycleStep::GateAudit, cycle);
      }

      // Step 2: harvest. Yield becomes one inflow through the router.
      if Self::step_pending(CycleStep::Harvest, cycle) {
        match T::YieldVenue::harvest() {
          Ok(harvested) if harvested.is_zero() => Self::mark_done(CycleStep::Harvest, cycle),
          Ok(harvested) => match T::Router::allocate(T::HarvestAsset::get(), harvested) {
            Ok(()) => {
              Self::deposit_event(Event::HarvestAllocated { amount: harvested });
              Self::mark_done(CycleStep::Harvest, cycle);
            }
            Err(_) => Self::deposit_event(Event::StepFailed {
              step: CycleStep::Harvest,
            }),
          },
          Err(_) => Self::deposit_event(Event::ExternalCallFailed {
            stage: VenueCallStage::Harvest,
          }),
        }
      }

      // Step 3: POL ownership refresh.
      if Self::step_pending(CycleStep::Liquidity, cycle) {
        T::Router::sync_ownership();
        Self::mark_done(CycleStep::Liquidity, cycle);
      }

      // Step 4: buyback. A gated skip is a normal, final result for this
      // period; an external failure keeps the step open.
      if Self::step_pending(CycleStep::Buyback, cycle) {
        match T::Buyback::execute_buyback() {
          Ok(BuybackOutcome::Executed { .. }) | Ok(BuybackOutcome::Skipped(_)) => {
            Self::mark_done(CycleStep::Buyback, cycle)
          }
          Ok(BuybackOutcome::Failed) | Err(_) => Self::deposit_event(Event::StepFailed {
            step: CycleStep::Buyback,
          }),
        }
      }

      // Step 5: DCA, same semantics as the buyback step.
      if Self::step_pending(CycleStep::Dca, cycle) {
        match T::Dca::execute_dca() {
          Ok(DcaOutcome::Executed { .. }) | Ok(DcaOutcome::Skipped(_)) => {
            Self::mark_done(CycleStep::Dca, cycle)
          }
          Ok(DcaOutcome::Failed) | Err(_) => Self::deposit_event(Event::StepFailed {
            step: CycleStep::Dca,
          }),
        }
      }

      // Step 6: deploy whatever the buffer holds beyond the required runway
      // and the standing earmarks.
      if Self::step_pending(CycleStep::SurplusDeploy, cycle) {
        let asset = T::HarvestAsset::get();
        let surplus = T::Ledger::buffer_total()
          .saturating_sub(T::Gates::required_buffer())
          .saturating_sub(T::Router::reserved_liquidity_budget())
          .saturating_sub(T::Dca::pending_budget());
        let deployable = surplus.min(T::Ledger::buffer_balance(asset));
        if deployable.is_zero() {
          Self::mark_done(CycleStep::SurplusDeploy, cycle);
        } else {
          match T::YieldVenue::deposit(asset, deployable) {
            Ok(()) => {
              Self::deposit_event(Event::SurplusDeployed { amount: deployable });
              Self::mark_done(CycleStep::SurplusDeploy, cycle);
            }
            Err(_) => Self::deposit_event(Event::ExternalCallFailed {
              stage: VenueCallStage::Deposit,
            }),
          }
        }
      }
    }
  }
}
