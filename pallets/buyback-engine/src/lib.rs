//! Buyback Engine Pallet
//!
//! Accumulates an undeployed stable budget from the allocation router and, once
//! every solvency precondition holds, executes a capped, rate-limited protocol
//! token purchase through the external venue adapter. Proceeds split into a
//! permanent burn and a non-burn share that pairs into protocol-owned liquidity
//! or falls back to the retained token reserve.
//!
//! A failed venue call never moves a balance: the pool is debited strictly
//! after confirmed receipt, and the attempt repeats on a later cycle.

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
use frame::deps::sp_runtime::{DispatchError, Permill};
use scale_info::TypeInfo;

/// The specific unmet precondition of a skipped execution.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum BuybackSkipReason {
  /// No undeployed budget in the pool
  EmptyPool,
  /// Runway gate failing
  RunwayGate,
  /// Coverage gate failing
  CoverageGate,
  /// No fresh reference price
  PriceStale,
  /// External pool depth below the governed floor
  InsufficientDepth,
  /// Volume-participation cap leaves nothing to spend
  VolumeCapExhausted,
}

/// Result of one execution attempt. `Skipped` is the deferred-but-normal
/// outcome; `Failed` marks an external call that should retry.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum BuybackOutcome {
  Executed {
    spent: u128,
    acquired: u128,
    burned: u128,
    paired: u128,
  },
  Skipped(BuybackSkipReason),
  Failed,
}

/// External call site that failed, for telemetry.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum ExternalCallStage {
  Purchase,
  Pairing,
}

/// External purchase venue adapter. Execution mechanics (time-weighted
/// slicing, venue selection) live behind this seam.
pub trait PurchaseVenue<AccountId> {
  /// Spend `spend` buffer units, receiving at least `min_acquired` protocol
  /// tokens into `who`. Partial and zero fills are reported, not reverted.
  fn execute_bounded_purchase(
    who: &AccountId,
    spend: u128,
    min_acquired: u128,
    max_slippage: Permill,
  ) -> Result<u128, DispatchError>;

  /// Current depth of the external pool in buffer-value terms.
  fn pool_depth() -> u128;
}

/// External liquidity venue adapter for POL pairing.
pub trait LiquidityVenue<AccountId> {
  /// Pair `native_amount` protocol tokens with `pair_amount` buffer units,
  /// returning the minted LP units.
  fn add_liquidity(
    who: &AccountId,
    native_amount: u128,
    pair_amount: u128,
  ) -> Result<u128, DispatchError>;
}

/// Trailing traded volume source backing the participation cap.
pub trait VolumeOracle {
  fn trailing_volume() -> u128;
}

/// Execution surface driven by the cycle orchestrator.
pub trait BuybackExecutor {
  fn execute_buyback() -> Result<BuybackOutcome, DispatchError>;
  fn pool_balance() -> u128;
}

#[frame::pallet]
pub mod pallet {
  use super::{
    BuybackOutcome, BuybackSkipReason, ExternalCallStage, LiquidityVenue, PurchaseVenue,
    VolumeOracle, WeightInfo,
  };
  use frame::deps::frame_support::traits::{
    fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
    tokens::{Fortitude, Precision, Preservation},
  };
  use frame::prelude::*;
  use pallet_allocation_router::PolRegistry;
  use pallet_solvency_gates::SolvencyGates;
  use pallet_treasury_ledger::{TreasuryInspect, TreasuryMutate};
  use polkadot_sdk::sp_core::U256;
  use polkadot_sdk::sp_runtime::Permill;
  use polkadot_sdk::sp_runtime::traits::AccountIdConversion;
  use primitives::{AssetKind, ecosystem::params::PRECISION};

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// The currency trait for burning acquired protocol tokens
    type Currency: NativeInspect<Self::AccountId, Balance = u128>
      + NativeMutate<Self::AccountId, Balance = u128>;

    /// The treasury ledger (pair-asset debits for POL matching)
    type Ledger: TreasuryMutate;

    /// Solvency gate evaluation and the burn-ratio policy
    type Gates: SolvencyGates;

    /// POL bookkeeping owned by the allocation router
    type Pol: PolRegistry;

    /// External purchase venue
    type PurchaseVenue: PurchaseVenue<Self::AccountId>;

    /// External liquidity venue for POL pairing
    type LiquidityVenue: LiquidityVenue<Self::AccountId>;

    /// Trailing volume source for the participation cap
    type Volume: VolumeOracle;

    /// The pallet ID for the pool custody account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Buffer currency used to match POL pairings 1:1 in value
    #[pallet::constant]
    type PairAsset: Get<AssetKind>;

    /// Maximum slippage tolerated on the purchase
    #[pallet::constant]
    type MaxSlippage: Get<Permill>;

    /// Default volume-participation cap
    #[pallet::constant]
    type DefaultParticipationCap: Get<Permill>;

    /// Default external pool depth floor
    #[pallet::constant]
    type DefaultMinPoolDepth: Get<u128>;

    /// Origin that can perform governance operations
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  pub type Balance = u128;

  /// One confirmed execution, kept in the append-only history ring.
  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq,
    TypeInfo,
  )]
  pub struct ExecutionRecord<BlockNumber> {
    pub executed_at: BlockNumber,
    pub spent: Balance,
    pub acquired: Balance,
    pub burned: Balance,
    pub paired: Balance,
    pub average_price: Balance,
  }

  /// Undeployed stable budget, funded by the router across cycles
  #[pallet::storage]
  #[pallet::getter(fn pool_balance_value)]
  pub type PoolBalance<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Non-burn tokens that found no pairing budget; the protocol token reserve
  #[pallet::storage]
  #[pallet::getter(fn retained_tokens)]
  pub type RetainedTokens<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Total protocol tokens permanently removed from issuance
  #[pallet::storage]
  #[pallet::getter(fn total_burned)]
  pub type TotalBurned<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Ring of the most recent executions
  #[pallet::storage]
  #[pallet::getter(fn execution_history)]
  pub type ExecutionHistory<T: Config> =
    StorageValue<_, BoundedVec<ExecutionRecord<BlockNumberFor<T>>, ConstU32<64>>, ValueQuery>;

  /// Volume-participation cap (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn participation_cap)]
  pub type ParticipationCap<T: Config> =
    StorageValue<_, Permill, ValueQuery, T::DefaultParticipationCap>;

  /// External pool depth floor (governance-adjustable)
  #[pallet::storage]
  #[pallet::getter(fn min_pool_depth)]
  pub type MinPoolDepth<T: Config> = StorageValue<_, Balance, ValueQuery, T::DefaultMinPoolDepth>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// The router funded the pool
    PoolFunded { amount: Balance, balance: Balance },
    /// A buyback executed and split
    BuybackExecuted {
      spent: Balance,
      acquired: Balance,
      burned: Balance,
      paired: Balance,
      retained: Balance,
      average_price: Balance,
      new_total_burned: Balance,
    },
    /// Execution deferred; the reported precondition was unmet
    BuybackSkipped { reason: BuybackSkipReason },
    /// An external venue call failed; state is untouched and the attempt
    /// repeats on a later cycle
    ExternalCallFailed { stage: ExternalCallStage },
    /// Participation cap updated
    ParticipationCapUpdated { old: Permill, new: Permill },
    /// Pool depth floor updated
    MinPoolDepthUpdated { old: Balance, new: Balance },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Funding amount must be non-zero
    ZeroAmount,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Attempt a buyback execution. Permissionless keeper poke; the gated
    /// preconditions decide whether anything happens.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::execute())]
    pub fn execute(origin: OriginFor<T>) -> DispatchResult {
      let _who = ensure_signed(origin)?;
      let _ = Self::do_execute()?;
      Ok(())
    }

    /// Update the volume-participation cap (governance only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::update_participation_cap())]
    pub fn update_participation_cap(origin: OriginFor<T>, new: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = ParticipationCap::<T>::get();
      ParticipationCap::<T>::put(new);
      Self::deposit_event(Event::ParticipationCapUpdated { old, new });
      Ok(())
    }

    /// Update the external pool depth floor (governance only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::update_min_pool_depth())]
    pub fn update_min_pool_depth(origin: OriginFor<T>, new: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = MinPoolDepth::<T>::get();
      MinPoolDepth::<T>::put(new);
      Self::deposit_event(Event::MinPoolDepthUpdated { old, new });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Pool custody account derived from the pallet ID
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Overflow-safe `a * b / c`, saturating at the balance ceiling
    fn mul_div(a: Balance, b: Balance, c: Balance) -> Balance {
      if c.is_zero() {
        return 0;
      }
      let wide = U256::from(a) * U256::from(b) / U256::from(c);
      Balance::try_from(wide).unwrap_or(Balance::MAX)
    }

    fn skip(reason: BuybackSkipReason) -> Result<BuybackOutcome, DispatchError> {
      Self::deposit_event(Event::BuybackSkipped { reason });
      Ok(BuybackOutcome::Skipped(reason))
    }

    /// One gated execution attempt. Every precondition must hold or the call
    /// is a no-op reporting the first unmet one; a venue failure leaves the
    /// pool untouched for a later retry.
    pub(crate) fn do_execute() -> Result<BuybackOutcome, DispatchError> {
      let pool = PoolBalance::<T>::get();
      if pool.is_zero() {
        return Self::skip(BuybackSkipReason::EmptyPool);
      }

      let status = T::Gates::evaluate();
      if !status.runway_ok {
        return Self::skip(BuybackSkipReason::RunwayGate);
      }
      // The price is needed for slippage floors either way, so a stale quote
      // is reported ahead of the coverage verdict it already poisoned
      let Some(price) = T::Ledger::reference_price() else {
        return Self::skip(BuybackSkipReason::PriceStale);
      };
      if !status.coverage_ok {
        return Self::skip(BuybackSkipReason::CoverageGate);
      }
      if T::PurchaseVenue::pool_depth() < MinPoolDepth::<T>::get() {
        return Self::skip(BuybackSkipReason::InsufficientDepth);
      }

      let cap = ParticipationCap::<T>::get().mul_floor(T::Volume::trailing_volume());
      let spend = pool.min(cap);
      if spend.is_zero() {
        return Self::skip(BuybackSkipReason::VolumeCapExhausted);
      }

      let expected = Self::mul_div(spend, PRECISION, price);
      let min_acquired = expected.saturating_sub(T::MaxSlippage::get().mul_floor(expected));
      let account = Self::account_id();

      let acquired = match T::PurchaseVenue::execute_bounded_purchase(
        &account,
        spend,
        min_acquired,
        T::MaxSlippage::get(),
      ) {
        Ok(acquired) if !acquired.is_zero() => acquired,
        // Zero fill or venue failure: no debit happened, retry next cycle
        _ => {
          Self::deposit_event(Event::ExternalCallFailed {
            stage: ExternalCallStage::Purchase,
          });
          return Ok(BuybackOutcome::Failed);
        }
      };

      // Receipt confirmed; only now does the pool give up the budget
      PoolBalance::<T>::put(pool - spend);

      // Floor truncation favors the burn ratio; the remainder goes to the
      // non-burn share so the two always reassemble `acquired` exactly
      let burn = T::Gates::burn_ratio_for(&status).mul_floor(acquired);
      let non_burn = acquired - burn;

      let burned = T::Currency::burn_from(
        &account,
        burn,
        Preservation::Expendable,
        Precision::Exact,
        Fortitude::Polite,
      )?;
      let new_total_burned = TotalBurned::<T>::mutate(|total| {
        *total = total.saturating_add(burned);
        *total
      });

      let paired = Self::pair_non_burn_share(&account, non_burn, price)?;
      let retained = non_burn - paired;
      RetainedTokens::<T>::mutate(|tokens| *tokens = tokens.saturating_add(retained));

      let average_price = Self::mul_div(spend, PRECISION, acquired);
      let record = ExecutionRecord {
        executed_at: frame_system::Pallet::<T>::block_number(),
        spent: spend,
        acquired,
        burned,
        paired,
        average_price,
      };
      ExecutionHistory::<T>::mutate(|history| {
        if history.is_full() {
          history.remove(0);
        }
        let _ = history.try_push(record);
      });

      Self::deposit_event(Event::BuybackExecuted {
        spent: spend,
        acquired,
        burned,
        paired,
        retained,
        average_price,
        new_total_burned,
      });

      Ok(BuybackOutcome::Executed {
        spent: spend,
        acquired,
        burned,
        paired,
      })
    }

    /// Match the non-burn share 1:1 in value against the reserved liquidity
    /// budget. Unmatched tokens fall back to the retained reserve; a pairing
    /// failure refunds the draw-down and leaves the buyback standing.
    fn pair_non_burn_share(
      account: &T::AccountId,
      non_burn: Balance,
      price: Balance,
    ) -> Result<Balance, DispatchError> {
      if non_burn.is_zero() || !T::Pol::pol_underweight() {
        return Ok(0);
      }
      let non_burn_value = Self::mul_div(non_burn, price, PRECISION);
      let matched = T::Pol::consume_liquidity_budget(non_burn_value);
      if matched.is_zero() {
        return Ok(0);
      }
      let tokens = Self::mul_div(matched, PRECISION, price).min(non_burn);

      if T::Ledger::debit_buffer(T::PairAsset::get(), matched).is_err() {
        // The buffer lacked the pair asset; nothing moved yet
        T::Pol::restore_liquidity_budget(matched);
        return Ok(0);
      }
      match T::LiquidityVenue::add_liquidity(account, tokens, matched) {
        Ok(lp_units) => {
          T::Pol::record_contribution(tokens, matched, lp_units)?;
          Ok(tokens)
        }
        Err(_) => {
          T::Ledger::credit_buffer(T::PairAsset::get(), matched)?;
          T::Pol::restore_liquidity_budget(matched);
          Self::deposit_event(Event::ExternalCallFailed {
            stage: ExternalCallStage::Pairing,
          });
          Ok(0)
        }
      }
    }
  }

  impl<T: Config> pallet_allocation_router::BuybackFunding for Pallet<T> {
    fn fund(amount: u128) -> DispatchResult {
      if amount.is_zero() {
        return Ok(());
      }
      let balance = PoolBalance::<T>::mutate(|pool| {
        *pool = pool.saturating_add(amount);
        *pool
      });
      Self::deposit_event(Event::PoolFunded { amount, balance });
      Ok(())
    }
  }

  impl<T: Config> super::BuybackExecutor for Pallet<T> {
    fn execute_buyback() -> Result<BuybackOutcome, DispatchError> {
      Self::do_execute()
    }

    fn pool_balance() -> u128 {
      PoolBalance::<T>::get()
    }
  }

  /// Genesis configuration ensuring the pool account is ED-free
  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
