//! Solvency Gates Pallet
//!
//! Derives the runway and coverage gates from the treasury ledger and maps gate
//! state to the governed burn/retain split. Evaluation is a pure query: nothing
//! here mutates treasury state, and results are never cached across mutations.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use polkadot_sdk::sp_runtime::Permill;
use scale_info::TypeInfo;

/// Result of a single gate evaluation. Derived on demand, never stored except
/// as the timestamped audit snapshot.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub struct GateStatus {
  /// Whole months of buffer coverage (floor division)
  pub runway_months: u32,
  /// Buffer covers at least the runway threshold
  pub runway_ok: bool,
  /// Treasury value covers note principal at the required margin
  pub coverage_ok: bool,
  /// A fresh reference price was available; when false, coverage failed closed
  pub price_ok: bool,
}

impl GateStatus {
  pub fn all_ok(&self) -> bool {
    self.runway_ok && self.coverage_ok
  }
}

/// Which gate an audit event refers to.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum GateKind {
  Runway,
  Coverage,
}

/// Gate evaluation surface consumed by the router, buyback engine, note
/// issuance and orchestrator.
pub trait SolvencyGates {
  /// Recompute both gates from current treasury state. Idempotent query.
  fn evaluate() -> GateStatus;

  /// Burn share of buyback proceeds for the current gate state.
  fn burn_ratio() -> Permill {
    Self::burn_ratio_for(&Self::evaluate())
  }

  /// Burn share for an already-evaluated gate state.
  fn burn_ratio_for(status: &GateStatus) -> Permill;

  /// Buffer value required to satisfy the runway threshold.
  fn required_buffer() -> u128;

  /// Store the timestamped audit snapshot and emit flip events.
  fn record_snapshot();
}

#[frame::pallet]
pub mod pallet {
  use super::{GateKind, GateStatus, WeightInfo};
  use frame::prelude::*;
  use pallet_treasury_ledger::TreasuryInspect;
  use polkadot_sdk::sp_core::U256;
  use polkadot_sdk::sp_runtime::Permill;
  use primitives::ecosystem::params::PRECISION;

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// Read access to the treasury aggregate
    type Ledger: TreasuryInspect;

    /// Default months of runway required before risk-bearing actions run
    #[pallet::constant]
    type DefaultRunwayThreshold: Get<u32>;

    /// Default coverage threshold numerator (e.g. 120 for 1.2x)
    #[pallet::constant]
    type DefaultCoverageNum: Get<u128>;

    /// Default coverage threshold denominator (e.g. 100 for 1.2x)
    #[pallet::constant]
    type DefaultCoverageDen: Get<u128>;

    /// Default burn share while both gates pass
    #[pallet::constant]
    type DefaultBurnRatioHealthy: Get<Permill>;

    /// Default burn share while any gate fails
    #[pallet::constant]
    type DefaultBurnRatioReduced: Get<Permill>;

    /// Origin that can perform governance operations
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  pub type Balance = u128;

  /// Audit snapshot of the last recorded evaluation.
  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq,
    TypeInfo,
  )]
  pub struct GateSnapshot<BlockNumber> {
    pub status: GateStatus,
    pub recorded_at: BlockNumber,
  }

  /// Runway threshold in months (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn runway_threshold)]
  pub type RunwayThresholdMonths<T: Config> =
    StorageValue<_, u32, ValueQuery, T::DefaultRunwayThreshold>;

  /// Coverage threshold numerator
  #[pallet::storage]
  #[pallet::getter(fn coverage_threshold_num)]
  pub type CoverageThresholdNum<T: Config> =
    StorageValue<_, Balance, ValueQuery, T::DefaultCoverageNum>;

  /// Coverage threshold denominator
  #[pallet::storage]
  #[pallet::getter(fn coverage_threshold_den)]
  pub type CoverageThresholdDen<T: Config> =
    StorageValue<_, Balance, ValueQuery, T::DefaultCoverageDen>;

  /// Burn share while both gates pass
  #[pallet::storage]
  #[pallet::getter(fn burn_ratio_healthy)]
  pub type BurnRatioHealthy<T: Config> =
    StorageValue<_, Permill, ValueQuery, T::DefaultBurnRatioHealthy>;

  /// Burn share while any gate fails
  #[pallet::storage]
  #[pallet::getter(fn burn_ratio_reduced)]
  pub type BurnRatioReduced<T: Config> =
    StorageValue<_, Permill, ValueQuery, T::DefaultBurnRatioReduced>;

  /// Last recorded audit snapshot
  #[pallet::storage]
  #[pallet::getter(fn last_snapshot)]
  pub type LastSnapshot<T: Config> =
    StorageValue<_, GateSnapshot<BlockNumberFor<T>>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// An audit snapshot was recorded
    GateEvaluated { status: GateStatus },
    /// A gate changed state since the previous snapshot
    GateFlipped { gate: GateKind, now_ok: bool },
    /// Runway threshold updated
    RunwayThresholdUpdated { old: u32, new: u32 },
    /// Coverage threshold updated
    CoverageThresholdUpdated {
      num: Balance,
      den: Balance,
    },
    /// Burn ratios updated
    BurnRatiosUpdated {
      healthy: Permill,
      reduced: Permill,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Coverage denominator must be non-zero
    ZeroDenominator,
    /// Coverage threshold must be at least 1.0
    ThresholdBelowParity,
    /// Healthy burn ratio must not be below the reduced ratio
    RatiosOutOfOrder,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Update the runway threshold (governance only)
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::set_runway_threshold())]
    pub fn set_runway_threshold(origin: OriginFor<T>, new: u32) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = RunwayThresholdMonths::<T>::get();
      RunwayThresholdMonths::<T>::put(new);
      Self::deposit_event(Event::RunwayThresholdUpdated { old, new });
      Ok(())
    }

    /// Update the coverage threshold as an integer rational (governance only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_coverage_threshold())]
    pub fn set_coverage_threshold(
      origin: OriginFor<T>,
      num: Balance,
      den: Balance,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(!den.is_zero(), Error::<T>::ZeroDenominator);
      ensure!(num >= den, Error::<T>::ThresholdBelowParity);
      CoverageThresholdNum::<T>::put(num);
      CoverageThresholdDen::<T>::put(den);
      Self::deposit_event(Event::CoverageThresholdUpdated { num, den });
      Ok(())
    }

    /// Update the burn/retain split for both gate states (governance only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::set_burn_ratios())]
    pub fn set_burn_ratios(
      origin: OriginFor<T>,
      healthy: Permill,
      reduced: Permill,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(healthy >= reduced, Error::<T>::RatiosOutOfOrder);
      BurnRatioHealthy::<T>::put(healthy);
      BurnRatioReduced::<T>::put(reduced);
      Self::deposit_event(Event::BurnRatiosUpdated { healthy, reduced });
      Ok(())
    }

    /// Record an audit snapshot. Permissionless keeper poke.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::snapshot())]
    pub fn snapshot(origin: OriginFor<T>) -> DispatchResult {
      let _who = ensure_signed(origin)?;
      <Self as crate::SolvencyGates>::record_snapshot();
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Months of buffer coverage, floor semantics. A zero obligation means
    /// the buffer lasts indefinitely.
    fn runway_months(buffer: Balance, obligation: Balance) -> u32 {
      if obligation.is_zero() {
        return u32::MAX;
      }
      (buffer / obligation).min(u32::MAX as u128) as u32
    }

    /// Coverage comparison by cross-multiplication: no division, no rounding.
    fn coverage_holds(total_value: U256, principal: Balance) -> bool {
      let num = U256::from(CoverageThresholdNum::<T>::get());
      let den = U256::from(CoverageThresholdDen::<T>::get());
      total_value * den >= U256::from(principal) * num
    }
  }

  impl<T: Config> crate::SolvencyGates for Pallet<T> {
    fn evaluate() -> GateStatus {
      let buffer = T::Ledger::buffer_total();
      let obligation = T::Ledger::monthly_obligation();
      let runway_months = Self::runway_months(buffer, obligation);
      let runway_ok = runway_months >= RunwayThresholdMonths::<T>::get();

      let principal = T::Ledger::outstanding_note_principal();
      let price = T::Ledger::reference_price();
      let price_ok = price.is_some();

      // Zero principal is defined as maximal coverage, not a division error
      let coverage_ok = if principal.is_zero() {
        true
      } else {
        match price {
          // Price-dependent decisions fail closed on a stale quote
          None => false,
          Some(price) => {
            let accumulation = T::Ledger::accumulation().total();
            let accumulation_value =
              U256::from(accumulation) * U256::from(price) / U256::from(PRECISION);
            let total_value = U256::from(buffer) + accumulation_value;
            Self::coverage_holds(total_value, principal)
          }
        }
      };

      GateStatus {
        runway_months,
        runway_ok,
        coverage_ok,
        price_ok,
      }
    }

    fn burn_ratio_for(status: &GateStatus) -> Permill {
      if status.all_ok() {
        BurnRatioHealthy::<T>::get()
      } else {
        BurnRatioReduced::<T>::get()
      }
    }

    fn required_buffer() -> u128 {
      T::Ledger::monthly_obligation()
        .saturating_mul(RunwayThresholdMonths::<T>::get() as u128)
    }

    fn record_snapshot() {
      let status = Self::evaluate();
      if let Some(previous) = LastSnapshot::<T>::get() {
        if previous.status.runway_ok != status.runway_ok {
          Self::deposit_event(Event::GateFlipped {
            gate: GateKind::Runway,
            now_ok: status.runway_ok,
          });
        }
        if previous.status.coverage_ok != status.coverage_ok {
          Self::deposit_event(Event::GateFlipped {
            gate: GateKind::Coverage,
            now_ok: status.coverage_ok,
          });
        }
      }
      LastSnapshot::<T>::put(GateSnapshot {
        status,
        recorded_at: frame_system::Pallet::<T>::block_number(),
      });
      Self::deposit_event(Event::GateEvaluated { status });
    }
  }
}
