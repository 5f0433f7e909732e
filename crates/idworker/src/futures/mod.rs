mod generator;
mod sleep_provider;
#[cfg(feature = "async-smol")]
mod smol_sleep;
#[cfg(feature = "async-tokio")]
mod tokio_sleep;

pub use generator::*;
pub use sleep_provider::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-smol")))]
#[cfg(feature = "async-smol")]
pub use smol_sleep::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use tokio_sleep::*;
