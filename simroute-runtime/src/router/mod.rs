mod route_table;
pub use self::route_table::*;

mod router;
pub use self::router::*;
