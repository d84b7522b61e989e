pub mod command;
pub mod conversation;
pub mod domain;
pub mod finder;
pub mod policy;
pub mod ports;
pub mod session;

pub use conversation::Conversation;
pub use domain::{Book, BookLink, Extension, IncomingMessage, Reply, UnknownExtension};
pub use finder::{BookFinder, FinderError, FinderSettings};
pub use policy::ProbeFailurePolicy;
pub use ports::{
    AvailabilityProbe, ChatTransport, DocumentSearchService, PortError, PortResult, ProbeOutcome,
};
pub use session::{PendingSearch, SessionKey, SessionStore};
