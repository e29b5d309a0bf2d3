pub mod artifact;
pub mod error;
pub mod extract;
pub mod navigator;
pub mod selectors;
pub mod session;
pub mod sync;
pub mod writer;

pub use artifact::{ArtifactSink, HttpArtifactSink};
pub use error::PosError;
pub use extract::Extractor;
pub use navigator::Navigator;
pub use session::{with_browser, with_session, SessionController};
pub use sync::SyncClient;
pub use writer::OrderWriter;
