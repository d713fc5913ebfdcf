//! # floodgate-proto
//!
//! Wire types for the parts of the Discord API that floodgate speaks:
//! REST objects (users, members, roles, messages), the gateway frame
//! envelope with its opcodes, and the bit flags for intents and
//! permissions.
//!
//! ## Quick Start
//!
//! ```rust
//! use floodgate_proto::{Event, GatewayPayload, Snowflake};
//!
//! let raw = r#"{"op":0,"s":3,"t":"MESSAGE_CREATE","d":{
//!     "id":"1","channel_id":"42","guild_id":"7",
//!     "author":{"id":"9","username":"alice"},"content":"h!ping"}}"#;
//! let frame: GatewayPayload = raw.parse().expect("valid frame");
//! let event = Event::from_dispatch(frame.t.as_deref().unwrap(), frame.d).unwrap();
//! if let Event::MessageCreate(msg) = event {
//!     assert_eq!(msg.channel_id, Snowflake(42));
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod bits;
pub mod error;
pub mod gateway;
pub mod model;
pub mod snowflake;

pub use self::bits::{intents, permissions};
pub use self::error::{ProtoError, Result};
pub use self::gateway::{opcode, Event, GatewayPayload, Hello, Identify, IdentifyProperties};
pub use self::model::{GuildMember, MemberAdd, Message, MessageMember, Ready, Role, User};
pub use self::snowflake::{Snowflake, DISCORD_EPOCH_MS};
