#[cfg(feature = "pulldown")]
pub mod pulldown;
