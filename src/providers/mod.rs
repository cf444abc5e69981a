pub mod fxrates;
pub mod normalize;
pub mod swissquote;
pub mod util;

pub use fxrates::FxRatesProvider;
pub use swissquote::SwissquoteProvider;
