pub mod mix;
pub mod preferences;
pub mod time_format;
pub mod track;

#[cfg(test)]
mod mix_test;
#[cfg(test)]
mod preferences_test;

pub use mix::*;
pub use preferences::*;
pub use time_format::*;
pub use track::*;
