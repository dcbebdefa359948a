//! One module per store chain.

pub mod culvers;
pub mod goodberrys;
pub mod kopps;
pub mod leducs;
pub mod oscars;

pub use culvers::CulversProvider;
pub use goodberrys::GoodberrysProvider;
pub use kopps::KoppsProvider;
pub use leducs::LeducsProvider;
pub use oscars::OscarsProvider;
