pub mod client_ext;
pub mod fs;
pub mod ui;

pub use crate::client_ext::util::{build_client, ClientUtilExt as Util};
pub use crate::fs::{read_json, write_json};
