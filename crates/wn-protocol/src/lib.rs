pub mod descriptor;
pub mod intent;
pub mod schema;
pub mod secret;

pub use descriptor::*;
pub use intent::*;
pub use schema::*;
