//! Signal conditioning for EEG channels.
//!
//! ```text
//!   selected columns
//!         │
//!         ▼
//!   ┌───────────┐
//!   │ condition │  coerce → min-finite check → ffill/bfill
//!   └───────────┘
//!         │
//!         ▼
//!   ┌─────────────┐
//!   │ butterworth │  zero-phase band-pass (SOS, forward + backward)
//!   └─────────────┘
//!         │
//!         ▼
//!   ┌───────────┐
//!   │ condition │  z-score over the selected columns
//!   └───────────┘
//! ```

pub mod butterworth;
pub mod condition;
