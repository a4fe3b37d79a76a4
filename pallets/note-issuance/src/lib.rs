//! Note Issuance Pallet
//!
//! Fixed-term, fixed-rate note tranches subscribed against buffer-currency
//! deposits. Admission re-evaluates the coverage gate on every request;
//! check and mutation run inside one transactional call. A coverage breach
//! never touches existing positions; it only blocks new admissions and pauses
//! open tranches until coverage recovers.
//!
//! Positions are plain storage claims: non-transferability is the absence of
//! any transfer surface, not an extra enforcement layer.

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
use frame::deps::sp_runtime::Permill;
use scale_info::TypeInfo;

/// Tranche lifecycle. Gate control moves `Active <-> Paused`; time control
/// moves `Active/Paused -> Matured -> Closed`, which is terminal.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum TrancheStatus {
  Active,
  Paused,
  Matured,
  Closed,
}

/// One governance-created note tranche.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub struct NoteTranche<BlockNumber> {
  /// Maximum principal this tranche may issue
  pub cap: u128,
  /// Principal issued so far; only grows through admission
  pub issued_principal: u128,
  /// Annual coupon rate
  pub apr: Permill,
  /// Term length in months
  pub term_months: u32,
  pub launch_block: BlockNumber,
  pub maturity_block: BlockNumber,
  pub status: TrancheStatus,
  /// Set when the coverage gate paused this tranche, so recovery only
  /// resumes what the gate itself stopped
  pub paused_by_gate: bool,
}

/// A subscriber's non-transferable claim within a tranche.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub struct NotePosition<BlockNumber> {
  pub principal: u128,
  pub subscribed_at: BlockNumber,
}

/// Orchestrator seam: apply the coverage gate to open tranches.
pub trait CoverageEnforcer {
  fn enforce_coverage();
}

#[frame::pallet]
pub mod pallet {
  use super::{CoverageEnforcer, NotePosition, NoteTranche, TrancheStatus, WeightInfo};
  use frame::deps::frame_support::traits::{
    fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
    tokens::Preservation,
  };
  use frame::prelude::*;
  use pallet_solvency_gates::SolvencyGates;
  use pallet_treasury_ledger::TreasuryMutate;
  use polkadot_sdk::sp_runtime::Permill;
  use polkadot_sdk::sp_runtime::traits::SaturatedConversion;
  use primitives::{AssetInspector, AssetKind};

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// The assets pallet moving subscription deposits into treasury custody
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = u128>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = u128>;

    /// The treasury ledger (buffer credit + principal accounting)
    type Ledger: TreasuryMutate;

    /// Coverage gate, re-evaluated per admission
    type Gates: SolvencyGates;

    /// Treasury custody account receiving subscription deposits
    #[pallet::constant]
    type TreasuryAccount: Get<Self::AccountId>;

    /// Blocks per calendar month for term arithmetic
    #[pallet::constant]
    type BlocksPerMonth: Get<BlockNumberFor<Self>>;

    /// Default per-request subscription bounds
    #[pallet::constant]
    type DefaultMinSubscription: Get<u128>;
    #[pallet::constant]
    type DefaultMaxSubscription: Get<u128>;

    /// Maximum number of open (not yet matured) tranches
    #[pallet::constant]
    type MaxOpenTranches: Get<u32>;

    /// Origin that can perform governance operations
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  pub type Balance = u128;
  pub type TrancheId = u32;

  /// Next tranche identifier
  #[pallet::storage]
  pub type NextTrancheId<T: Config> = StorageValue<_, TrancheId, ValueQuery>;

  /// All tranches ever created
  #[pallet::storage]
  #[pallet::getter(fn tranche)]
  pub type Tranches<T: Config> =
    StorageMap<_, Blake2_128Concat, TrancheId, NoteTranche<BlockNumberFor<T>>, OptionQuery>;

  /// Tranches that have not matured yet (Active or Paused)
  #[pallet::storage]
  #[pallet::getter(fn open_tranches)]
  pub type OpenTranches<T: Config> =
    StorageValue<_, BoundedVec<TrancheId, T::MaxOpenTranches>, ValueQuery>;

  /// Subscriber positions per tranche
  #[pallet::storage]
  #[pallet::getter(fn position)]
  pub type Holdings<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    TrancheId,
    Blake2_128Concat,
    T::AccountId,
    NotePosition<BlockNumberFor<T>>,
    OptionQuery,
  >;

  /// Minimum per-request subscription (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn min_subscription)]
  pub type MinSubscription<T: Config> =
    StorageValue<_, Balance, ValueQuery, T::DefaultMinSubscription>;

  /// Maximum per-request subscription (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn max_subscription)]
  pub type MaxSubscription<T: Config> =
    StorageValue<_, Balance, ValueQuery, T::DefaultMaxSubscription>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A tranche was created
    TrancheCreated {
      tranche_id: TrancheId,
      cap: Balance,
      apr: Permill,
      term_months: u32,
      maturity_block: BlockNumberFor<T>,
    },
    /// A subscription was admitted
    NoteAdmitted {
      who: T::AccountId,
      tranche_id: TrancheId,
      amount: Balance,
      matures_at: BlockNumberFor<T>,
    },
    /// Governance paused a tranche
    TranchePaused { tranche_id: TrancheId },
    /// Governance resumed a tranche
    TrancheResumed { tranche_id: TrancheId },
    /// The coverage gate paused an active tranche
    IssuancePausedByGate { tranche_id: TrancheId },
    /// Coverage recovered; a gate-paused tranche resumed
    IssuanceResumedByGate { tranche_id: TrancheId },
    /// A tranche reached its maturity block
    TrancheMatured { tranche_id: TrancheId },
    /// A matured tranche was closed
    TrancheClosed { tranche_id: TrancheId },
    /// Subscription bounds updated
    SubscriptionBoundsUpdated { min: Balance, max: Balance },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// No tranche under this identifier
    UnknownTranche,
    /// Tranche is not accepting subscriptions
    TrancheNotActive,
    /// Tranche is not paused
    TrancheNotPaused,
    /// Tranche has not matured
    TrancheNotMatured,
    /// Admission would push issued principal above the cap
    CapExceeded,
    /// Request below the minimum subscription
    BelowMinSubscription,
    /// Request above the maximum subscription
    AboveMaxSubscription,
    /// Coverage gate failing at the moment of the call
    CoverageGateBlocked,
    /// Deposit asset is not a supported buffer currency
    UnsupportedAsset,
    /// Open tranche list is full
    TooManyTranches,
    /// Cap must be non-zero
    ZeroCap,
    /// Term must be non-zero
    ZeroTerm,
    /// Minimum must not exceed maximum
    InvalidBounds,
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    /// Maturity is time-controlled: sweep open tranches past their term.
    fn on_initialize(now: BlockNumberFor<T>) -> Weight {
      let mut matured = 0u64;
      let open = OpenTranches::<T>::get();
      for tranche_id in open.iter() {
        let Some(mut tranche) = Tranches::<T>::get(tranche_id) else {
          continue;
        };
        if now >= tranche.maturity_block
          && matches!(tranche.status, TrancheStatus::Active | TrancheStatus::Paused)
        {
          tranche.status = TrancheStatus::Matured;
          tranche.paused_by_gate = false;
          Tranches::<T>::insert(tranche_id, tranche);
          Self::deposit_event(Event::TrancheMatured {
            tranche_id: *tranche_id,
          });
          matured += 1;
        }
      }
      if matured > 0 {
        OpenTranches::<T>::mutate(|open| {
          open.retain(|id| {
            Tranches::<T>::get(id)
              .map(|t| !matches!(t.status, TrancheStatus::Matured | TrancheStatus::Closed))
              .unwrap_or(false)
          });
        });
      }
      T::DbWeight::get().reads_writes(1 + open.len() as u64, 1 + matured)
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create a note tranche (governance only)
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_tranche())]
    pub fn create_tranche(
      origin: OriginFor<T>,
      cap: Balance,
      apr: Permill,
      term_months: u32,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(cap > 0, Error::<T>::ZeroCap);
      ensure!(term_months > 0, Error::<T>::ZeroTerm);

      let now = frame_system::Pallet::<T>::block_number();
      let term: BlockNumberFor<T> = T::BlocksPerMonth::get()
        .saturating_mul(term_months.saturated_into());
      let maturity_block = now.saturating_add(term);
      let tranche_id = NextTrancheId::<T>::mutate(|id| {
        let current = *id;
        *id += 1;
        current
      });

      OpenTranches::<T>::try_mutate(|open| {
        open
          .try_push(tranche_id)
          .map_err(|_| Error::<T>::TooManyTranches)
      })?;
      Tranches::<T>::insert(
        tranche_id,
        NoteTranche {
          cap,
          issued_principal: 0,
          apr,
          term_months,
          launch_block: now,
          maturity_block,
          status: TrancheStatus::Active,
          paused_by_gate: false,
        },
      );
      Self::deposit_event(Event::TrancheCreated {
        tranche_id,
        cap,
        apr,
        term_months,
        maturity_block,
      });
      Ok(())
    }

    /// Subscribe to a tranche. Admission checks and the resulting mutations
    /// run atomically within this call; the coverage gate is re-evaluated
    /// here, never cached.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::subscribe())]
    pub fn subscribe(
      origin: OriginFor<T>,
      tranche_id: TrancheId,
      asset: AssetKind,
      amount: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut tranche = Tranches::<T>::get(tranche_id).ok_or(Error::<T>::UnknownTranche)?;
      let now = frame_system::Pallet::<T>::block_number();

      ensure!(
        tranche.status == TrancheStatus::Active && now < tranche.maturity_block,
        Error::<T>::TrancheNotActive
      );
      ensure!(
        amount >= MinSubscription::<T>::get(),
        Error::<T>::BelowMinSubscription
      );
      ensure!(
        amount <= MaxSubscription::<T>::get(),
        Error::<T>::AboveMaxSubscription
      );
      ensure!(
        tranche.issued_principal.saturating_add(amount) <= tranche.cap,
        Error::<T>::CapExceeded
      );
      ensure!(T::Gates::evaluate().coverage_ok, Error::<T>::CoverageGateBlocked);

      let asset_id = match asset {
        AssetKind::Local(id) if asset.is_stable() => id,
        _ => return Err(Error::<T>::UnsupportedAsset.into()),
      };
      T::Assets::transfer(
        asset_id,
        &who,
        &T::TreasuryAccount::get(),
        amount,
        Preservation::Expendable,
      )?;
      T::Ledger::credit_buffer(asset, amount)?;
      T::Ledger::increase_note_principal(amount)?;

      tranche.issued_principal = tranche.issued_principal.saturating_add(amount);
      let matures_at = tranche.maturity_block;
      Tranches::<T>::insert(tranche_id, tranche);

      Holdings::<T>::mutate(tranche_id, &who, |position| match position {
        Some(position) => position.principal = position.principal.saturating_add(amount),
        None => {
          *position = Some(NotePosition {
            principal: amount,
            subscribed_at: now,
          })
        }
      });

      Self::deposit_event(Event::NoteAdmitted {
        who,
        tranche_id,
        amount,
        matures_at,
      });
      Ok(())
    }

    /// Pause an active tranche (governance only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::pause_tranche())]
    pub fn pause_tranche(origin: OriginFor<T>, tranche_id: TrancheId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Tranches::<T>::try_mutate(tranche_id, |maybe| {
        let tranche = maybe.as_mut().ok_or(Error::<T>::UnknownTranche)?;
        ensure!(
          tranche.status == TrancheStatus::Active,
          Error::<T>::TrancheNotActive
        );
        tranche.status = TrancheStatus::Paused;
        tranche.paused_by_gate = false;
        Ok::<_, Error<T>>(())
      })?;
      Self::deposit_event(Event::TranchePaused { tranche_id });
      Ok(())
    }

    /// Resume a paused tranche (governance only)
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::resume_tranche())]
    pub fn resume_tranche(origin: OriginFor<T>, tranche_id: TrancheId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Tranches::<T>::try_mutate(tranche_id, |maybe| {
        let tranche = maybe.as_mut().ok_or(Error::<T>::UnknownTranche)?;
        ensure!(
          tranche.status == TrancheStatus::Paused,
          Error::<T>::TrancheNotPaused
        );
        tranche.status = TrancheStatus::Active;
        tranche.paused_by_gate = false;
        Ok::<_, Error<T>>(())
      })?;
      Self::deposit_event(Event::TrancheResumed { tranche_id });
      Ok(())
    }

    /// Close a matured tranche (governance only). Terminal.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::close_tranche())]
    pub fn close_tranche(origin: OriginFor<T>, tranche_id: TrancheId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Tranches::<T>::try_mutate(tranche_id, |maybe| {
        let tranche = maybe.as_mut().ok_or(Error::<T>::UnknownTranche)?;
        ensure!(
          tranche.status == TrancheStatus::Matured,
          Error::<T>::TrancheNotMatured
        );
        tranche.status = TrancheStatus::Closed;
        Ok::<_, Error<T>>(())
      })?;
      Self::deposit_event(Event::TrancheClosed { tranche_id });
      Ok(())
    }

    /// Update the per-request subscription bounds (governance only)
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::set_subscription_bounds())]
    pub fn set_subscription_bounds(
      origin: OriginFor<T>,
      min: Balance,
      max: Balance,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(min <= max, Error::<T>::InvalidBounds);
      MinSubscription::<T>::put(min);
      MaxSubscription::<T>::put(max);
      Self::deposit_event(Event::SubscriptionBoundsUpdated { min, max });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Monthly coupon run-rate across open tranches, for opex planning.
    /// Coupon continuity itself is not gated; only new admissions are.
    pub fn monthly_coupon_obligation() -> Balance {
      OpenTranches::<T>::get()
        .iter()
        .filter_map(|tranche_id| Tranches::<T>::get(tranche_id))
        .fold(0u128, |acc, tranche| {
          acc.saturating_add(tranche.apr.mul_floor(tranche.issued_principal) / 12)
        })
    }
  }

  impl<T: Config> CoverageEnforcer for Pallet<T> {
    fn enforce_coverage() {
      let coverage_ok = T::Gates::evaluate().coverage_ok;
      for tranche_id in OpenTranches::<T>::get().iter() {
        let Some(mut tranche) = Tranches::<T>::get(tranche_id) else {
          continue;
        };
        if !coverage_ok && tranche.status == TrancheStatus::Active {
          tranche.status = TrancheStatus::Paused;
          tranche.paused_by_gate = true;
          Tranches::<T>::insert(tranche_id, tranche);
          Self::deposit_event(Event::IssuancePausedByGate {
            tranche_id: *tranche_id,
          });
        } else if coverage_ok
          && tranche.status == TrancheStatus::Paused
          && tranche.paused_by_gate
        {
          tranche.status = TrancheStatus::Active;
          tranche.paused_by_gate = false;
          Tranches::<T>::insert(tranche_id, tranche);
          Self::deposit_event(Event::IssuanceResumedByGate {
            tranche_id: *tranche_id,
          });
        }
      }
    }
  }
}
