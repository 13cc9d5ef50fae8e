pub mod batch;
pub mod domain;
pub mod normalize;
pub mod ports;
pub mod raw;
pub mod recommend;
pub mod taxonomy;

pub use batch::fetch_many;
pub use domain::{Book, Page, Tag, TagKind, Title};
pub use normalize::{normalize, FormatToken, NormalizeError, UrlScheme};
pub use ports::{GalleryApi, PortError, PortResult};
pub use raw::{RawGallery, RawSearchPage};
pub use recommend::{RecommendConfig, Recommender, ScoredCandidate};
pub use taxonomy::{TaxonomySnapshot, TaxonomyTable, TypedEntry};
