// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Grevit Transport
//!
//! Newline framed TCP handshake between a sending application and a
//! receiving host.
//!
//! ```text
//! sender                         receiver
//!   | ---- payload line ---------->  |
//!   | <--- echo of payload line ---  |
//!   | <--- catalog line -----------  |
//! ```
//!
//! The sender retries on a fresh connection until the echo matches. The
//! receiver stops after the first collection that has components.

mod line;

pub mod error;
pub mod receiver;
pub mod sender;

pub use error::{Result, TransportError};
pub use receiver::{Receiver, ReceiverConfig, StopHandle};
pub use sender::{SendOutcome, Sender, SenderConfig, DEFAULT_PORT, DEFAULT_TIMEOUT};
