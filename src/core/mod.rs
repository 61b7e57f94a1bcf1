//! Core terminal model and protocol client.
//!
//! This module contains everything that holds state or talks to the
//! outside world:
//!
//! - **grid**: fixed-size character/color buffer and cursor
//! - **writer**: line-write operations (scroll, truncate, prompt)
//! - **protocol**: wire format for the remote command service
//! - **session**: request/response state machine feeding the grid
//!
//! # Architecture
//!
//! ```text
//! RemoteSession
//! ├── Transport (HTTP request worker, one per request)
//! └── Grid
//!     ├── cells (cols x rows of char + color)
//!     └── Cursor (position for writes and the blink bar)
//! ```

pub mod grid;
pub mod protocol;
pub mod session;
pub mod writer;
