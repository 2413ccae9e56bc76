mod addresses;
pub use self::addresses::*;

mod network;
pub use self::network::*;
