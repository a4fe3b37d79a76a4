//! Treasury Ledger Pallet
//!
//! Sole owner of the treasury aggregate. Every balance held by the protocol
//! (buffer currencies, the reserve-asset accumulation split and outstanding
//! note principal) is accounted here, and every mutation flows through the
//! narrow validated entry points exported as [`TreasuryMutate`].

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
use primitives::AssetKind;
use scale_info::TypeInfo;

/// Reserve-asset holdings split by custody state.
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
pub struct AccumulationHoldings {
  /// Units held directly by the treasury, immediately disposable
  pub liquid: u128,
  /// Units delegated to the staking venue
  pub staked: u128,
  /// Units received as staking earnings, not yet rebalanced
  pub earned: u128,
}

impl AccumulationHoldings {
  pub fn total(&self) -> u128 {
    self
      .liquid
      .saturating_add(self.staked)
      .saturating_add(self.earned)
  }
}

/// Cause recorded when the ledger trips its fail-stop.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum HaltKind {
  /// An allocation plan did not conserve its inflow
  AllocationMismatch,
  /// A balance mutation would have gone negative
  AccountingUnderflow,
}

/// Price oracle adapter. Implementations answer with the quote and the block it
/// was taken at; the ledger applies its own staleness window on every read.
pub trait PriceOracle<BlockNumber> {
  /// Reserve-asset price in buffer-currency units scaled by `PRECISION`.
  fn reference_price(asset: AssetKind) -> Option<(u128, BlockNumber)>;
}

/// Read access to the treasury aggregate.
pub trait TreasuryInspect {
  fn buffer_balance(asset: AssetKind) -> u128;
  fn buffer_total() -> u128;
  fn is_buffer_asset(asset: AssetKind) -> bool;
  fn accumulation() -> AccumulationHoldings;
  fn outstanding_note_principal() -> u128;
  fn monthly_obligation() -> u128;
  /// Staleness-checked reference price; `None` once the stored quote aged out.
  fn reference_price() -> Option<u128>;
  fn is_halted() -> bool;
}

/// Narrow mutation entry points. Each call validates its inputs and applies
/// atomically; a halted ledger refuses all of them.
pub trait TreasuryMutate: TreasuryInspect {
  fn credit_buffer(asset: AssetKind, amount: u128) -> DispatchResult;
  fn debit_buffer(asset: AssetKind, amount: u128) -> DispatchResult;
  fn credit_accumulation_liquid(amount: u128) -> DispatchResult;
  fn shift_liquid_to_staked(amount: u128) -> DispatchResult;
  fn shift_staked_to_liquid(amount: u128) -> DispatchResult;
  fn credit_accumulation_earned(amount: u128) -> DispatchResult;
  fn increase_note_principal(amount: u128) -> DispatchResult;
  fn decrease_note_principal(amount: u128) -> DispatchResult;
  /// Fail-stop for detected accounting defects. Latches until governance
  /// clears it; every subsequent mutation is refused.
  fn trip_halt(cause: HaltKind);
}

#[frame::pallet]
pub mod pallet {
  use super::{AccumulationHoldings, HaltKind, PriceOracle, WeightInfo};
  use frame::deps::sp_runtime::traits::AccountIdConversion;
  use frame::prelude::*;
  use primitives::{AssetInspector, AssetKind};

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// The pallet ID deriving the buffer custody account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// The reserve asset whose price the ledger tracks
    #[pallet::constant]
    type ReserveAsset: Get<AssetKind>;

    /// Maximum age of the stored reference price before reads fail closed
    #[pallet::constant]
    type PriceStalenessWindow: Get<BlockNumberFor<Self>>;

    /// Maximum number of supported buffer currencies
    #[pallet::constant]
    type MaxBufferAssets: Get<u32>;

    /// Oracle adapter supplying the reserve-asset reference price
    type Oracle: crate::PriceOracle<BlockNumberFor<Self>>;

    /// Origin that can perform governance operations
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  pub type Balance = u128;

  /// A reference price together with the block it was quoted at.
  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq,
    TypeInfo,
  )]
  pub struct PriceQuote<BlockNumber> {
    pub price: Balance,
    pub as_of: BlockNumber,
  }

  /// Stable-value holdings per supported buffer currency
  #[pallet::storage]
  #[pallet::getter(fn buffer_balance_of)]
  pub type BufferBalances<T: Config> =
    StorageMap<_, Blake2_128Concat, AssetKind, Balance, ValueQuery>;

  /// Buffer currencies the ledger accepts (governance-managed)
  #[pallet::storage]
  #[pallet::getter(fn supported_buffer_assets)]
  pub type SupportedBufferAssets<T: Config> =
    StorageValue<_, BoundedVec<AssetKind, T::MaxBufferAssets>, ValueQuery>;

  /// Reserve-asset holdings split into liquid/staked/earned
  #[pallet::storage]
  #[pallet::getter(fn accumulation_holdings)]
  pub type Accumulation<T: Config> = StorageValue<_, AccumulationHoldings, ValueQuery>;

  /// Principal outstanding across all note tranches
  #[pallet::storage]
  #[pallet::getter(fn note_principal)]
  pub type OutstandingNotePrincipal<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Operating-expense run-rate per month (governance-set)
  #[pallet::storage]
  #[pallet::getter(fn monthly_obligation_value)]
  pub type MonthlyObligation<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Last refreshed reserve-asset reference price
  #[pallet::storage]
  pub type ReferencePrice<T: Config> =
    StorageValue<_, PriceQuote<BlockNumberFor<T>>, OptionQuery>;

  /// Fail-stop latch. While set, every mutation entry point is refused.
  #[pallet::storage]
  #[pallet::getter(fn halted)]
  pub type Halted<T: Config> = StorageValue<_, bool, ValueQuery>;

  /// Cause of the current halt, if any
  #[pallet::storage]
  #[pallet::getter(fn halt_cause)]
  pub type HaltCause<T: Config> = StorageValue<_, HaltKind, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Buffer credited
    BufferCredited {
      asset: AssetKind,
      amount: Balance,
      new_balance: Balance,
    },
    /// Buffer debited
    BufferDebited {
      asset: AssetKind,
      amount: Balance,
      new_balance: Balance,
    },
    /// Accumulation holdings changed
    AccumulationUpdated { holdings: AccumulationHoldings },
    /// Outstanding note principal increased
    NotePrincipalIncreased { amount: Balance, new_total: Balance },
    /// Outstanding note principal decreased
    NotePrincipalDecreased { amount: Balance, new_total: Balance },
    /// Monthly obligation updated by governance
    MonthlyObligationUpdated { old: Balance, new: Balance },
    /// Buffer currency added
    BufferAssetAdded { asset: AssetKind },
    /// Buffer currency removed
    BufferAssetRemoved { asset: AssetKind },
    /// Reference price refreshed from the oracle
    ReferencePriceRefreshed {
      price: Balance,
      as_of: BlockNumberFor<T>,
    },
    /// The fail-stop latch tripped
    TreasuryHalted { cause: HaltKind },
    /// Governance cleared the fail-stop latch
    HaltCleared,
  }

  #[pallet::error]
  pub enum Error<T> {
    /// The ledger is halted after an invariant violation
    LedgerHalted,
    /// Asset is not a supported buffer currency
    UnsupportedAsset,
    /// Debit exceeds the asset's buffer balance
    InsufficientBuffer,
    /// Shift exceeds the source accumulation bucket
    InsufficientAccumulation,
    /// Decrease exceeds outstanding principal
    InsufficientPrincipal,
    /// Amount must be non-zero
    ZeroAmount,
    /// Supported buffer asset list is full
    TooManyBufferAssets,
    /// Buffer asset still holds a balance
    BufferAssetNotEmpty,
    /// Oracle returned no quote for the reserve asset
    PriceUnavailable,
    /// Oracle quote is older than the staleness window
    StalePrice,
    /// The ledger is not halted
    NotHalted,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Update the monthly operating-expense obligation (governance only)
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::set_monthly_obligation())]
    pub fn set_monthly_obligation(origin: OriginFor<T>, new: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old = MonthlyObligation::<T>::get();
      MonthlyObligation::<T>::put(new);
      Self::deposit_event(Event::MonthlyObligationUpdated { old, new });
      Ok(())
    }

    /// Add a supported buffer currency (governance only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::add_buffer_asset())]
    pub fn add_buffer_asset(origin: OriginFor<T>, asset: AssetKind) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(asset.is_stable(), Error::<T>::UnsupportedAsset);
      SupportedBufferAssets::<T>::try_mutate(|assets| -> DispatchResult {
        if !assets.contains(&asset) {
          assets
            .try_push(asset)
            .map_err(|_| Error::<T>::TooManyBufferAssets)?;
        }
        Ok(())
      })?;
      Self::deposit_event(Event::BufferAssetAdded { asset });
      Ok(())
    }

    /// Remove a supported buffer currency; its balance must be zero (governance only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::remove_buffer_asset())]
    pub fn remove_buffer_asset(origin: OriginFor<T>, asset: AssetKind) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(
        BufferBalances::<T>::get(asset).is_zero(),
        Error::<T>::BufferAssetNotEmpty
      );
      SupportedBufferAssets::<T>::mutate(|assets| {
        assets.retain(|a| a != &asset);
      });
      BufferBalances::<T>::remove(asset);
      Self::deposit_event(Event::BufferAssetRemoved { asset });
      Ok(())
    }

    /// Pull a fresh reference price from the oracle. Permissionless: any
    /// keeper may poke; stale or empty quotes are rejected.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::refresh_reference_price())]
    pub fn refresh_reference_price(origin: OriginFor<T>) -> DispatchResult {
      let _who = ensure_signed(origin)?;
      Self::do_refresh_reference_price()
    }

    /// Record staking earnings on the reserve asset (governance only; fed by
    /// the off-chain earnings report)
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::record_accumulation_earnings())]
    pub fn record_accumulation_earnings(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);
      <Self as crate::TreasuryMutate>::credit_accumulation_earned(amount)
    }

    /// Clear the fail-stop latch after off-chain investigation (governance only)
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::clear_halt())]
    pub fn clear_halt(origin: OriginFor<T>) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(Halted::<T>::get(), Error::<T>::NotHalted);
      Halted::<T>::put(false);
      HaltCause::<T>::kill();
      Self::deposit_event(Event::HaltCleared);
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Buffer custody account derived from the pallet ID
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    fn ensure_active() -> DispatchResult {
      ensure!(!Halted::<T>::get(), Error::<T>::LedgerHalted);
      Ok(())
    }

    fn ensure_supported(asset: AssetKind) -> DispatchResult {
      ensure!(
        SupportedBufferAssets::<T>::get().contains(&asset),
        Error::<T>::UnsupportedAsset
      );
      Ok(())
    }

    pub(crate) fn do_refresh_reference_price() -> DispatchResult {
      let reserve = T::ReserveAsset::get();
      let (price, as_of) =
        T::Oracle::reference_price(reserve).ok_or(Error::<T>::PriceUnavailable)?;
      ensure!(!price.is_zero(), Error::<T>::PriceUnavailable);
      let now = frame_system::Pallet::<T>::block_number();
      ensure!(
        now.saturating_sub(as_of) <= T::PriceStalenessWindow::get(),
        Error::<T>::StalePrice
      );
      ReferencePrice::<T>::put(PriceQuote { price, as_of });
      Self::deposit_event(Event::ReferencePriceRefreshed { price, as_of });
      Ok(())
    }

    fn do_halt(cause: HaltKind) {
      Halted::<T>::put(true);
      HaltCause::<T>::put(cause);
      Self::deposit_event(Event::TreasuryHalted { cause });
    }

    fn mutate_accumulation(
      f: impl FnOnce(&mut AccumulationHoldings) -> DispatchResult,
    ) -> DispatchResult {
      Accumulation::<T>::try_mutate(|holdings| -> DispatchResult {
        f(holdings)?;
        Self::deposit_event(Event::AccumulationUpdated {
          holdings: *holdings,
        });
        Ok(())
      })
    }
  }

  impl<T: Config> crate::TreasuryInspect for Pallet<T> {
    fn buffer_balance(asset: AssetKind) -> u128 {
      BufferBalances::<T>::get(asset)
    }

    fn buffer_total() -> u128 {
      SupportedBufferAssets::<T>::get()
        .iter()
        .fold(0u128, |acc, asset| {
          acc.saturating_add(BufferBalances::<T>::get(asset))
        })
    }

    fn is_buffer_asset(asset: AssetKind) -> bool {
      SupportedBufferAssets::<T>::get().contains(&asset)
    }

    fn accumulation() -> AccumulationHoldings {
      Accumulation::<T>::get()
    }

    fn outstanding_note_principal() -> u128 {
      OutstandingNotePrincipal::<T>::get()
    }

    fn monthly_obligation() -> u128 {
      MonthlyObligation::<T>::get()
    }

    fn reference_price() -> Option<u128> {
      let quote = ReferencePrice::<T>::get()?;
      let now = frame_system::Pallet::<T>::block_number();
      if now.saturating_sub(quote.as_of) > T::PriceStalenessWindow::get() {
        return None;
      }
      Some(quote.price)
    }

    fn is_halted() -> bool {
      Halted::<T>::get()
    }
  }

  impl<T: Config> crate::TreasuryMutate for Pallet<T> {
    fn credit_buffer(asset: AssetKind, amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      Self::ensure_supported(asset)?;
      if amount.is_zero() {
        return Ok(());
      }
      let new_balance = BufferBalances::<T>::mutate(asset, |balance| {
        *balance = balance.saturating_add(amount);
        *balance
      });
      Self::deposit_event(Event::BufferCredited {
        asset,
        amount,
        new_balance,
      });
      Ok(())
    }

    fn debit_buffer(asset: AssetKind, amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      Self::ensure_supported(asset)?;
      if amount.is_zero() {
        return Ok(());
      }
      let new_balance = BufferBalances::<T>::try_mutate(asset, |balance| {
        *balance = balance
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientBuffer)?;
        Ok::<_, Error<T>>(*balance)
      })?;
      Self::deposit_event(Event::BufferDebited {
        asset,
        amount,
        new_balance,
      });
      Ok(())
    }

    fn credit_accumulation_liquid(amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      if amount.is_zero() {
        return Ok(());
      }
      Self::mutate_accumulation(|holdings| {
        holdings.liquid = holdings.liquid.saturating_add(amount);
        Ok(())
      })
    }

    fn shift_liquid_to_staked(amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      if amount.is_zero() {
        return Ok(());
      }
      Self::mutate_accumulation(|holdings| {
        holdings.liquid = holdings
          .liquid
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientAccumulation)?;
        holdings.staked = holdings.staked.saturating_add(amount);
        Ok(())
      })
    }

    fn shift_staked_to_liquid(amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      if amount.is_zero() {
        return Ok(());
      }
      Self::mutate_accumulation(|holdings| {
        holdings.staked = holdings
          .staked
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientAccumulation)?;
        holdings.liquid = holdings.liquid.saturating_add(amount);
        Ok(())
      })
    }

    fn credit_accumulation_earned(amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      if amount.is_zero() {
        return Ok(());
      }
      Self::mutate_accumulation(|holdings| {
        holdings.earned = holdings.earned.saturating_add(amount);
        Ok(())
      })
    }

    fn increase_note_principal(amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      if amount.is_zero() {
        return Ok(());
      }
      let new_total = OutstandingNotePrincipal::<T>::mutate(|principal| {
        *principal = principal.saturating_add(amount);
        *principal
      });
      Self::deposit_event(Event::NotePrincipalIncreased { amount, new_total });
      Ok(())
    }

    fn decrease_note_principal(amount: u128) -> DispatchResult {
      Self::ensure_active()?;
      if amount.is_zero() {
        return Ok(());
      }
      let new_total = OutstandingNotePrincipal::<T>::try_mutate(|principal| {
        *principal = principal
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientPrincipal)?;
        Ok::<_, Error<T>>(*principal)
      })?;
      Self::deposit_event(Event::NotePrincipalDecreased { amount, new_total });
      Ok(())
    }

    fn trip_halt(cause: HaltKind) {
      if !Halted::<T>::get() {
        Self::do_halt(cause);
      }
    }
  }

  /// Genesis configuration: supported buffer currencies and the opex run-rate
  #[pallet::genesis_config]
  pub struct GenesisConfig<T: Config> {
    pub supported_assets: alloc::vec::Vec<AssetKind>,
    pub monthly_obligation: Balance,
    pub _marker: core::marker::PhantomData<T>,
  }

  impl<T: Config> Default for GenesisConfig<T> {
    fn default() -> Self {
      Self {
        supported_assets: alloc::vec::Vec::new(),
        monthly_obligation: 0,
        _marker: Default::default(),
      }
    }
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      let bounded: BoundedVec<AssetKind, T::MaxBufferAssets> = self
        .supported_assets
        .clone()
        .try_into()
        .expect("Supported buffer assets exceed max limit");
      SupportedBufferAssets::<T>::put(bounded);
      MonthlyObligation::<T>::put(self.monthly_obligation);
      // Custody account survives zero native balance via provider reference
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
