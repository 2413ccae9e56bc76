mod network_interface;
pub use self::network_interface::*;

mod async_interface;
pub use self::async_interface::*;
