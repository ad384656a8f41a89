pub mod rfcomm;
pub mod tcp;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use rfcomm::{RfcommConfig, RfcommListenerFactory};
pub use tcp::TcpListenerFactory;
pub use traits::{ConnectionListener, ListenerFactory, TransportStream};
