pub mod util;

pub use util::{now_ms, split_csv};
