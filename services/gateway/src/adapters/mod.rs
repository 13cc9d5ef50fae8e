pub mod taxonomy_file;
pub mod upstream;

pub use taxonomy_file::load_taxonomy;
pub use upstream::HttpGalleryApi;
