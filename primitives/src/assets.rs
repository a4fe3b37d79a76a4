use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

/// This enum serves as the single source of truth for asset types across all pallets,
/// enabling type-safe interactions between the ledger, router, buyback engine and other actors.
///
/// - `Native`: the protocol token (managed by pallet-balances), the buyback/burn target.
/// - `Local(u32)`: local fungible assets (managed by pallet-assets): buffer currencies,
///   the reserve asset and LP tokens, classified through the bitmask namespace below.
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
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum AssetKind {
  /// Protocol token managed by pallet-balances
  #[default]
  Native,
  /// Local asset managed by pallet-assets
  Local(u32),
  /// Foreign asset managed by pallet-assets via bridge mapping (0xF... namespace)
  Foreign(u32),
}

impl From<u32> for AssetKind {
  fn from(asset_id: u32) -> Self {
    AssetKind::Local(asset_id)
  }
}

// Bitmask Architecture for Asset Classification
//
// 32-bit ID Structure:
// [ 4 bits: Type ] [ 28 bits: Index/ID ]
//
// Types:
// 0x2... -> Stablecoins, the buffer currencies (USDC, USDT, DAI)
// 0x3... -> Reserve assets, the accumulation target (RSV)
// 0x4... -> LP Tokens
// 0xF... -> Foreign/bridged Assets

pub const MASK_TYPE: u32 = 0xF000_0000;
pub const MASK_INDEX: u32 = 0x0FFF_FFFF;

pub const TYPE_STABLE: u32 = 0x2000_0000;
pub const TYPE_RESERVE: u32 = 0x3000_0000;
pub const TYPE_LP: u32 = 0x4000_0000;
pub const TYPE_FOREIGN: u32 = 0xF000_0000;

/// Helper trait to inspect AssetKind properties
pub trait AssetInspector {
  fn is_native(&self) -> bool;
  fn local_id(&self) -> Option<u32>;

  // Bitmask checks
  fn is_stable(&self) -> bool;
  fn is_reserve(&self) -> bool;
  fn is_lp(&self) -> bool;
  fn is_foreign(&self) -> bool;
}

impl AssetInspector for AssetKind {
  fn is_native(&self) -> bool {
    matches!(self, AssetKind::Native)
  }

  fn local_id(&self) -> Option<u32> {
    match self {
      AssetKind::Local(id) | AssetKind::Foreign(id) => Some(*id),
      _ => None,
    }
  }

  fn is_stable(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_STABLE,
      _ => false,
    }
  }

  fn is_reserve(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_RESERVE,
      _ => false,
    }
  }

  fn is_lp(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_LP,
      _ => false,
    }
  }

  fn is_foreign(&self) -> bool {
    match self {
      AssetKind::Foreign(_) => true,
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_FOREIGN,
      _ => false,
    }
  }
}

/// Helper to construct compile-time IDs
const fn make_id(type_mask: u32, index: u32) -> u32 {
  type_mask | (index & MASK_INDEX)
}

/// Well-known asset constants serving as system defaults
pub mod well_known {
  use super::*;

  // Stablecoins (0x2...), the buffer currencies
  pub const USDC: u32 = make_id(TYPE_STABLE, 1);
  pub const USDT: u32 = make_id(TYPE_STABLE, 2);
  pub const DAI: u32 = make_id(TYPE_STABLE, 3);

  // Reserve assets (0x3...), the accumulation target
  pub const RSV: u32 = make_id(TYPE_RESERVE, 1);
}

/// Metadata container for currencies
#[derive(Encode, Decode, DecodeWithMemTracking, Eq, PartialEq, Clone, Debug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct CurrencyMetadata {
  pub name: Vec<u8>,
  pub symbol: Vec<u8>,
  pub decimals: u8,
}

/// Helper to resolve metadata for well-known assets (off-chain / view logic)
pub fn get_well_known_metadata(asset: AssetKind) -> Option<CurrencyMetadata> {
  match asset {
    AssetKind::Native => Some(CurrencyMetadata {
      name: b"Bastion Token".to_vec(),
      symbol: b"BSTN".to_vec(),
      decimals: 12,
    }),
    AssetKind::Local(id) => match id {
      well_known::USDC => Some(CurrencyMetadata {
        name: b"USD Coin".to_vec(),
        symbol: b"USDC".to_vec(),
        decimals: 6,
      }),
      well_known::USDT => Some(CurrencyMetadata {
        name: b"Tether USD".to_vec(),
        symbol: b"USDT".to_vec(),
        decimals: 6,
      }),
      well_known::DAI => Some(CurrencyMetadata {
        name: b"Dai Stablecoin".to_vec(),
        symbol: b"DAI".to_vec(),
        decimals: 18,
      }),
      well_known::RSV => Some(CurrencyMetadata {
        name: b"Reserve Asset".to_vec(),
        symbol: b"RSV".to_vec(),
        decimals: 12,
      }),
      _ => None,
    },
    AssetKind::Foreign(_) => None,
  }
}
