//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod appointment;
pub mod availability_block;
pub mod gift;
pub mod ledger_entry;
pub mod payout_balance;
pub mod payout_entry;
pub mod reader_profile;
pub mod session;
pub mod stream_gift;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use appointment::{
    AppointmentStatus, Column as AppointmentColumn, Entity as Appointment,
    Model as AppointmentModel,
};
pub use availability_block::{
    Column as AvailabilityBlockColumn, Entity as AvailabilityBlock, Model as AvailabilityBlockModel,
};
pub use gift::{Column as GiftColumn, Entity as Gift, Model as GiftModel};
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, LedgerKind, Model as LedgerEntryModel,
};
pub use payout_balance::{
    Column as PayoutBalanceColumn, Entity as PayoutBalance, Model as PayoutBalanceModel,
};
pub use payout_entry::{
    Column as PayoutEntryColumn, Entity as PayoutEntry, Model as PayoutEntryModel, PayoutKind,
};
pub use reader_profile::{
    Column as ReaderProfileColumn, Entity as ReaderProfile, Model as ReaderProfileModel,
};
pub use session::{
    Column as SessionColumn, Entity as Session, Model as SessionModel, SessionMode, SessionStatus,
};
pub use stream_gift::{Column as StreamGiftColumn, Entity as StreamGift, Model as StreamGiftModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
